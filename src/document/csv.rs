//! CSV record source.
//!
//! The first row is the header containing field names; every following row
//! becomes one [`RawRecord`]:
//! ```csv
//! match_name,season,over,ball,text
//! MI v CSK,2023,1,1,"Full and wide, left alone"
//! ```

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};

use crate::document::record::RawRecord;
use crate::error::{CreaseError, Result};

/// Cell values read as null.
pub const DEFAULT_NULL_VALUES: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL"];

/// Reads [`RawRecord`]s from CSV data.
///
/// Cells equal to one of the null markers become null values. A row shorter
/// than the header leaves its trailing fields absent; a row that cannot be
/// parsed is reported as [`CreaseError::MalformedRecord`] and reading
/// continues with the next row.
pub struct CsvRecordSource<R: Read> {
    headers: Vec<String>,
    rows: StringRecordsIntoIter<R>,
    null_values: Vec<String>,
    next_index: u64,
    max_records: Option<usize>,
}

impl CsvRecordSource<File> {
    /// Open a CSV file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref()).map_err(|e| {
            CreaseError::other(format!(
                "Failed to open {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_reader(file)
    }
}

impl<R: Read> CsvRecordSource<R> {
    /// Read CSV data from any reader. The header row is read immediately.
    pub fn from_reader(reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(CreaseError::invalid_config("CSV header is empty"));
        }

        Ok(CsvRecordSource {
            headers,
            rows: reader.into_records(),
            null_values: DEFAULT_NULL_VALUES.iter().map(|s| s.to_string()).collect(),
            next_index: 0,
            max_records: None,
        })
    }

    /// Stop after this many rows.
    pub fn with_max_records(mut self, max_records: Option<usize>) -> Self {
        self.max_records = max_records;
        self
    }

    /// Replace the null markers.
    pub fn with_null_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.null_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    fn to_record(&self, index: u64, row: &StringRecord) -> Result<RawRecord> {
        if row.len() > self.headers.len() {
            return Err(CreaseError::malformed_record(
                index,
                format!(
                    "row has {} fields but the header has {}",
                    row.len(),
                    self.headers.len()
                ),
            ));
        }

        let mut record = RawRecord::new(index);
        for (name, value) in self.headers.iter().zip(row.iter()) {
            let value = if self.null_values.iter().any(|null| null == value) {
                None
            } else {
                Some(value.to_string())
            };
            record.insert(name.as_str(), value);
        }
        Ok(record)
    }
}

impl<R: Read> Iterator for CsvRecordSource<R> {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self
            .max_records
            .is_some_and(|max| self.next_index >= max as u64)
        {
            return None;
        }

        let row = self.rows.next()?;
        let index = self.next_index;
        self.next_index += 1;

        Some(match row {
            Ok(row) => self.to_record(index, &row),
            Err(e) if e.is_io_error() => Err(CreaseError::Csv(e)),
            Err(e) => Err(CreaseError::malformed_record(index, e.to_string())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(data: &str) -> CsvRecordSource<&[u8]> {
        CsvRecordSource::from_reader(data.as_bytes()).unwrap()
    }

    #[test]
    fn test_reads_rows_in_order() {
        let data = "match_name,over,text\nMI v CSK,1,\"FOUR, through covers\"\nMI v CSK,2,no run\n";
        let records: Vec<RawRecord> = source(data).map(|r| r.unwrap()).collect();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].index(), 0);
        assert_eq!(records[0].get("text"), Some(Some("FOUR, through covers")));
        assert_eq!(records[1].index(), 1);
        assert_eq!(records[1].get("over"), Some(Some("2")));
    }

    #[test]
    fn test_null_markers() {
        let data = "text,wkt_text\nout,NA\nsingle,\n";
        let records: Vec<RawRecord> = source(data).map(|r| r.unwrap()).collect();

        assert_eq!(records[0].get("wkt_text"), Some(None));
        assert_eq!(records[1].get("wkt_text"), Some(None));

        let custom: Vec<RawRecord> = source(data)
            .with_null_values(["-"])
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(custom[0].get("wkt_text"), Some(Some("NA")));
    }

    #[test]
    fn test_short_row_leaves_fields_absent() {
        let data = "match_name,text\nMI v CSK\n";
        let records: Vec<RawRecord> = source(data).map(|r| r.unwrap()).collect();

        assert_eq!(records[0].get("match_name"), Some(Some("MI v CSK")));
        assert_eq!(records[0].get("text"), None);
    }

    #[test]
    fn test_long_row_is_malformed() {
        let data = "text\nfour\nsix,extra\nout\n";
        let results: Vec<Result<RawRecord>> = source(data).collect();

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(CreaseError::MalformedRecord { index: 1, .. })
        ));
        assert_eq!(results[2].as_ref().unwrap().index(), 2);
    }

    #[test]
    fn test_max_records() {
        let data = "text\na\nb\nc\n";
        let records: Vec<_> = source(data).with_max_records(Some(2)).collect();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_headers() {
        let source = source(" text , over \nfour,1\n");
        assert_eq!(source.headers(), &["text".to_string(), "over".to_string()]);
    }
}
