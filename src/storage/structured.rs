//! Structured file I/O for binary artifacts.
//!
//! Every artifact file has the same frame:
//!
//! ```text
//! [magic: 4 bytes][version: u32 LE][body ...][crc32 of everything before: u32 LE]
//! ```
//!
//! [`write_artifact`] writes a frame atomically (temporary file, sync, rename)
//! and [`read_artifact`] reads one back, rejecting a wrong magic, an
//! unsupported version, trailing garbage, or a checksum mismatch.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crc32fast::Hasher;

use crate::error::{CreaseError, Result};
use crate::storage::{Storage, StorageInput, StorageOutput};
use crate::util::varint::encode_u64;

/// A structured file writer for binary data.
pub struct StructWriter<W: StorageOutput> {
    writer: W,
    hasher: Hasher,
    position: u64,
}

impl<W: StorageOutput> StructWriter<W> {
    /// Create a new structured file writer.
    pub fn new(writer: W) -> Self {
        StructWriter {
            writer,
            hasher: Hasher::new(),
            position: 0,
        }
    }

    /// Write the artifact header.
    pub fn write_header(&mut self, magic: &[u8; 4], version: u32) -> Result<()> {
        self.write_raw(magic)?;
        self.write_u32(version)
    }

    /// Write a u8 value.
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.writer.write_u8(value)?;
        self.update_checksum(&[value]);
        self.position += 1;
        Ok(())
    }

    /// Write a u32 value (little-endian).
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.writer.write_u32::<LittleEndian>(value)?;
        self.update_checksum(&value.to_le_bytes());
        self.position += 4;
        Ok(())
    }

    /// Write a u64 value (little-endian).
    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        self.writer.write_u64::<LittleEndian>(value)?;
        self.update_checksum(&value.to_le_bytes());
        self.position += 8;
        Ok(())
    }

    /// Write a variable-length integer.
    pub fn write_varint(&mut self, value: u64) -> Result<()> {
        let encoded = encode_u64(value);
        self.write_raw(&encoded)
    }

    /// Write a string with length prefix.
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        self.write_bytes(value.as_bytes())
    }

    /// Write raw bytes with length prefix.
    pub fn write_bytes(&mut self, value: &[u8]) -> Result<()> {
        self.write_varint(value.len() as u64)?;
        self.write_raw(value)
    }

    /// Write raw bytes without length prefix.
    pub fn write_raw(&mut self, value: &[u8]) -> Result<()> {
        self.writer.write_all(value)?;
        self.update_checksum(value);
        self.position += value.len() as u64;
        Ok(())
    }

    /// Write a non-decreasing integer array using delta encoding.
    pub fn write_delta_compressed_u32s(&mut self, values: &[u32]) -> Result<()> {
        self.write_varint(values.len() as u64)?;

        let mut previous = 0u32;
        for &value in values {
            let delta = value.checked_sub(previous).ok_or_else(|| {
                CreaseError::serialization(format!(
                    "Delta-encoded values must be ascending: {value} after {previous}"
                ))
            })?;
            self.write_varint(delta as u64)?;
            previous = value;
        }

        Ok(())
    }

    /// Get current file position.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Get the checksum of everything written so far.
    pub fn checksum(&self) -> u32 {
        self.hasher.clone().finalize()
    }

    fn update_checksum(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Write the trailing checksum, then flush, sync, and close the output.
    pub fn close(mut self) -> Result<()> {
        let checksum = self.checksum();
        self.writer.write_u32::<LittleEndian>(checksum)?;
        self.writer.flush_and_sync()?;
        self.writer.close()?;
        Ok(())
    }
}

/// A structured file reader for binary data.
pub struct StructReader<R: StorageInput> {
    reader: R,
    hasher: Hasher,
    position: u64,
    file_size: u64,
}

impl<R: StorageInput> StructReader<R> {
    /// Create a new structured file reader.
    pub fn new(reader: R) -> Result<Self> {
        let file_size = reader.size()?;
        Ok(StructReader {
            reader,
            hasher: Hasher::new(),
            position: 0,
            file_size,
        })
    }

    /// Read and check the artifact header.
    pub fn read_header(&mut self, magic: &[u8; 4], version: u32) -> Result<()> {
        if self.file_size < 12 {
            return Err(CreaseError::serialization(format!(
                "File too short for an artifact: {} bytes",
                self.file_size
            )));
        }

        let found = self.read_raw(4)?;
        if found.as_slice() != magic {
            return Err(CreaseError::serialization(format!(
                "Bad magic: expected {:?}, found {:?}",
                String::from_utf8_lossy(magic),
                String::from_utf8_lossy(&found)
            )));
        }

        let found_version = self.read_u32()?;
        if found_version != version {
            return Err(CreaseError::serialization(format!(
                "Unsupported format version {found_version} (expected {version})"
            )));
        }

        Ok(())
    }

    /// Read a u8 value.
    pub fn read_u8(&mut self) -> Result<u8> {
        let value = self.reader.read_u8().map_err(truncated)?;
        self.update_checksum(&[value]);
        self.position += 1;
        Ok(value)
    }

    /// Read a u32 value (little-endian).
    pub fn read_u32(&mut self) -> Result<u32> {
        let value = self.reader.read_u32::<LittleEndian>().map_err(truncated)?;
        self.update_checksum(&value.to_le_bytes());
        self.position += 4;
        Ok(value)
    }

    /// Read a u64 value (little-endian).
    pub fn read_u64(&mut self) -> Result<u64> {
        let value = self.reader.read_u64::<LittleEndian>().map_err(truncated)?;
        self.update_checksum(&value.to_le_bytes());
        self.position += 8;
        Ok(value)
    }

    /// Read a variable-length integer.
    pub fn read_varint(&mut self) -> Result<u64> {
        let mut result = 0u64;
        let mut shift = 0;

        loop {
            if shift >= 64 {
                return Err(CreaseError::serialization("VarInt overflow"));
            }

            let byte = self.read_u8()?;
            result |= ((byte & 0x7F) as u64) << shift;

            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
        }
    }

    /// Read a varint that must fit in a u32.
    pub fn read_varint_u32(&mut self) -> Result<u32> {
        let value = self.read_varint()?;
        u32::try_from(value)
            .map_err(|_| CreaseError::serialization(format!("Value {value} exceeds u32")))
    }

    /// Read a string with length prefix.
    pub fn read_string(&mut self) -> Result<String> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes)
            .map_err(|e| CreaseError::serialization(format!("Invalid UTF-8: {e}")))
    }

    /// Read bytes with length prefix.
    pub fn read_bytes(&mut self) -> Result<Vec<u8>> {
        let length = self.read_length()?;
        self.read_raw(length)
    }

    /// Read exact number of raw bytes.
    pub fn read_raw(&mut self, length: usize) -> Result<Vec<u8>> {
        if length as u64 > self.remaining() {
            return Err(CreaseError::serialization(format!(
                "Length {length} runs past the end of the file"
            )));
        }

        let mut bytes = vec![0u8; length];
        self.reader.read_exact(&mut bytes).map_err(truncated)?;
        self.update_checksum(&bytes);
        self.position += length as u64;
        Ok(bytes)
    }

    /// Read a delta-compressed integer array.
    pub fn read_delta_compressed_u32s(&mut self) -> Result<Vec<u32>> {
        let length = self.read_length()?;
        let mut values = Vec::with_capacity(length);
        let mut previous = 0u32;

        for _ in 0..length {
            let delta = self.read_varint_u32()?;
            let value = previous.checked_add(delta).ok_or_else(|| {
                CreaseError::serialization("Delta-encoded value overflows u32")
            })?;
            values.push(value);
            previous = value;
        }

        Ok(values)
    }

    /// Read an element count, rejecting counts larger than the bytes left.
    pub fn read_length(&mut self) -> Result<usize> {
        let length = self.read_varint()?;
        if length > self.remaining() {
            return Err(CreaseError::serialization(format!(
                "Count {length} exceeds remaining {} bytes",
                self.remaining()
            )));
        }
        Ok(length as usize)
    }

    /// Get current file position.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Get file size.
    pub fn size(&self) -> u64 {
        self.file_size
    }

    /// Bytes left before the checksum trailer.
    pub fn remaining(&self) -> u64 {
        self.file_size.saturating_sub(4).saturating_sub(self.position)
    }

    /// Check if the whole body has been consumed.
    pub fn is_eof(&self) -> bool {
        self.remaining() == 0
    }

    fn update_checksum(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Verify the trailing checksum against everything read so far.
    pub fn verify_checksum(&mut self) -> Result<bool> {
        if self.position + 4 > self.file_size {
            return Err(CreaseError::serialization("File too short for checksum"));
        }

        let stored = self.reader.read_u32::<LittleEndian>().map_err(truncated)?;
        Ok(stored == self.hasher.clone().finalize())
    }

    /// Require that the body is fully consumed and the checksum matches, then close.
    pub fn finish(mut self) -> Result<()> {
        if !self.is_eof() {
            return Err(CreaseError::serialization(format!(
                "{} unread bytes before checksum",
                self.remaining()
            )));
        }
        if !self.verify_checksum()? {
            return Err(CreaseError::serialization("Checksum mismatch"));
        }
        self.reader.close()
    }
}

fn truncated(e: std::io::Error) -> CreaseError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        CreaseError::serialization("Unexpected end of file")
    } else {
        CreaseError::Io(e)
    }
}

/// Write an artifact atomically under `name`.
///
/// The body is written to a temporary file; only after the checksum is
/// written and the file synced is it renamed over `name`. On any failure the
/// temporary file is removed and an existing `name` is left untouched.
pub fn write_artifact<F>(
    storage: &dyn Storage,
    name: &str,
    magic: &[u8; 4],
    version: u32,
    write_body: F,
) -> Result<u64>
where
    F: FnOnce(&mut StructWriter<Box<dyn StorageOutput>>) -> Result<()>,
{
    let (temp_name, output) = storage.create_temp_output(name)?;

    let written = (|| {
        let mut writer = StructWriter::new(output);
        writer.write_header(magic, version)?;
        write_body(&mut writer)?;
        let size = writer.position() + 4;
        writer.close()?;
        storage.rename_file(&temp_name, name)?;
        Ok(size)
    })();

    if written.is_err() {
        let _ = storage.delete_file(&temp_name);
    }
    written
}

/// Read an artifact written by [`write_artifact`].
pub fn read_artifact<T, F>(
    storage: &dyn Storage,
    name: &str,
    magic: &[u8; 4],
    version: u32,
    read_body: F,
) -> Result<T>
where
    F: FnOnce(&mut StructReader<Box<dyn StorageInput>>) -> Result<T>,
{
    let input = storage.open_input(name)?;
    let mut reader = StructReader::new(input)?;
    reader.read_header(magic, version)?;
    let value = read_body(&mut reader)?;
    reader.finish()?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStorage;
    use std::io::Write;

    const MAGIC: &[u8; 4] = b"TEST";

    #[test]
    fn test_struct_writer_reader() {
        let storage = MemoryStorage::default();

        write_artifact(&storage, "test.dat", MAGIC, 1, |writer| {
            writer.write_u8(42)?;
            writer.write_u32(1234)?;
            writer.write_u64(567890)?;
            writer.write_varint(300)?;
            writer.write_string("wide outside off")?;
            writer.write_bytes(&[1, 2, 3])?;
            Ok(())
        })
        .unwrap();

        let values = read_artifact(&storage, "test.dat", MAGIC, 1, |reader| {
            Ok((
                reader.read_u8()?,
                reader.read_u32()?,
                reader.read_u64()?,
                reader.read_varint()?,
                reader.read_string()?,
                reader.read_bytes()?,
            ))
        })
        .unwrap();

        assert_eq!(
            values,
            (42, 1234, 567890, 300, "wide outside off".to_string(), vec![1, 2, 3])
        );
    }

    #[test]
    fn test_delta_compression() {
        let storage = MemoryStorage::default();
        let positions = vec![0, 3, 3, 17, 1000];

        write_artifact(&storage, "delta.dat", MAGIC, 1, |writer| {
            writer.write_delta_compressed_u32s(&positions)
        })
        .unwrap();

        let read = read_artifact(&storage, "delta.dat", MAGIC, 1, |reader| {
            reader.read_delta_compressed_u32s()
        })
        .unwrap();
        assert_eq!(read, positions);
    }

    #[test]
    fn test_delta_compression_rejects_descending() {
        let storage = MemoryStorage::default();

        let result = write_artifact(&storage, "delta.dat", MAGIC, 1, |writer| {
            writer.write_delta_compressed_u32s(&[5, 2])
        });
        assert!(matches!(result, Err(CreaseError::Serialization(_))));
        assert!(storage.list_files().unwrap().is_empty());
    }

    #[test]
    fn test_checksum_is_cumulative() {
        let storage = MemoryStorage::default();
        let output = storage.create_output("a").unwrap();
        let mut writer = StructWriter::new(output);
        writer.write_raw(b"four").unwrap();
        writer.write_raw(b"runs").unwrap();

        assert_eq!(writer.checksum(), crc32fast::hash(b"fourruns"));
    }

    #[test]
    fn test_corruption_detected() {
        let storage = MemoryStorage::default();
        write_artifact(&storage, "test.dat", MAGIC, 1, |writer| {
            writer.write_string("six runs four")
        })
        .unwrap();

        let mut input = storage.open_input("test.dat").unwrap();
        let mut bytes = Vec::new();
        std::io::Read::read_to_end(&mut input, &mut bytes).unwrap();
        bytes[10] ^= 0xFF;
        let mut output = storage.create_output("test.dat").unwrap();
        output.write_all(&bytes).unwrap();
        output.close().unwrap();

        let result = read_artifact(&storage, "test.dat", MAGIC, 1, |reader| reader.read_string());
        assert!(matches!(result, Err(CreaseError::Serialization(_))));
    }

    #[test]
    fn test_header_mismatch() {
        let storage = MemoryStorage::default();
        write_artifact(&storage, "test.dat", MAGIC, 1, |writer| writer.write_u8(1)).unwrap();

        let wrong_magic = read_artifact(&storage, "test.dat", b"NOPE", 1, |r| r.read_u8());
        assert!(matches!(wrong_magic, Err(CreaseError::Serialization(_))));

        let wrong_version = read_artifact(&storage, "test.dat", MAGIC, 2, |r| r.read_u8());
        assert!(matches!(wrong_version, Err(CreaseError::Serialization(_))));
    }

    #[test]
    fn test_unread_body_rejected() {
        let storage = MemoryStorage::default();
        write_artifact(&storage, "test.dat", MAGIC, 1, |writer| {
            writer.write_u32(1)?;
            writer.write_u32(2)
        })
        .unwrap();

        let result = read_artifact(&storage, "test.dat", MAGIC, 1, |r| r.read_u32());
        assert!(matches!(result, Err(CreaseError::Serialization(_))));
    }

    #[test]
    fn test_failed_write_keeps_previous_artifact() {
        let storage = MemoryStorage::default();
        write_artifact(&storage, "test.dat", MAGIC, 1, |writer| writer.write_u32(7)).unwrap();

        let result = write_artifact(&storage, "test.dat", MAGIC, 1, |writer| {
            writer.write_u32(8)?;
            Err(CreaseError::serialization("boom"))
        });
        assert!(result.is_err());
        assert_eq!(storage.list_files().unwrap(), vec!["test.dat"]);

        let value = read_artifact(&storage, "test.dat", MAGIC, 1, |r| r.read_u32()).unwrap();
        assert_eq!(value, 7);
    }
}
