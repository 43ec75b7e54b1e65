//! Binary layout of a barrel file.
//!
//! ```text
//! header     "CRBR", version
//! barrel_id  u32
//! low, high  u32, u32
//! records    varint count, then per record:
//!   term_id      varint
//!   postings     varint count, then per posting:
//!     doc_id       varint delta from the previous posting
//!     positions    delta-compressed u32s (term frequency is their count)
//! checksum   crc32
//! ```

use crate::barrel::{Barrel, barrel_file_name};
use crate::error::{CreaseError, Result};
use crate::inverted::{InvertedRecord, Posting};
use crate::storage::Storage;
use crate::storage::structured::{read_artifact, write_artifact};

const MAGIC: &[u8; 4] = b"CRBR";

/// Current barrel format version.
pub const BARREL_FORMAT_VERSION: u32 = 1;

/// Write one barrel atomically. Returns the file size.
pub fn write_barrel(storage: &dyn Storage, barrel: &Barrel) -> Result<u64> {
    let name = barrel_file_name(barrel.barrel_id);

    write_artifact(storage, &name, MAGIC, BARREL_FORMAT_VERSION, |writer| {
        writer.write_u32(barrel.barrel_id)?;
        writer.write_u32(barrel.term_id_range.start)?;
        writer.write_u32(barrel.term_id_range.end)?;

        writer.write_varint(barrel.records.len() as u64)?;
        for record in &barrel.records {
            if !barrel.term_id_range.contains(&record.term_id) {
                return Err(CreaseError::serialization(format!(
                    "Term {} is outside barrel {} range {:?}",
                    record.term_id, barrel.barrel_id, barrel.term_id_range
                )));
            }
            writer.write_varint(record.term_id as u64)?;
            writer.write_varint(record.postings.len() as u64)?;

            let mut previous = 0u64;
            for posting in &record.postings {
                let delta = posting.doc_id.checked_sub(previous).ok_or_else(|| {
                    CreaseError::serialization(format!(
                        "Postings of term {} are not in doc id order",
                        record.term_id
                    ))
                })?;
                writer.write_varint(delta)?;
                previous = posting.doc_id;
                writer.write_delta_compressed_u32s(&posting.positions)?;
            }
        }
        Ok(())
    })
}

/// Read one barrel, checking that it is the barrel asked for.
pub fn read_barrel(storage: &dyn Storage, barrel_id: u32) -> Result<Barrel> {
    let name = barrel_file_name(barrel_id);

    read_artifact(storage, &name, MAGIC, BARREL_FORMAT_VERSION, |reader| {
        let found_id = reader.read_u32()?;
        if found_id != barrel_id {
            return Err(CreaseError::serialization(format!(
                "{name} contains barrel {found_id}"
            )));
        }
        let low = reader.read_u32()?;
        let high = reader.read_u32()?;
        if low > high {
            return Err(CreaseError::serialization(format!(
                "{name} has an inverted range {low}..{high}"
            )));
        }

        let count = reader.read_length()?;
        let mut records = Vec::with_capacity(count);
        let mut previous_term = None;

        for _ in 0..count {
            let term_id = reader.read_varint_u32()?;
            if !(low..high).contains(&term_id)
                || previous_term.is_some_and(|previous| term_id <= previous)
            {
                return Err(CreaseError::serialization(format!(
                    "{name} has term {term_id} out of order or outside {low}..{high}"
                )));
            }
            previous_term = Some(term_id);

            let posting_count = reader.read_length()?;
            let mut postings = Vec::with_capacity(posting_count);
            let mut doc_id = 0u64;
            for i in 0..posting_count {
                let delta = reader.read_varint()?;
                if i > 0 && delta == 0 {
                    return Err(CreaseError::serialization(format!(
                        "{name} repeats doc {doc_id} for term {term_id}"
                    )));
                }
                doc_id = doc_id
                    .checked_add(delta)
                    .ok_or_else(|| CreaseError::serialization("Doc id overflow"))?;

                let positions = reader.read_delta_compressed_u32s()?;
                postings.push(Posting {
                    doc_id,
                    term_frequency: positions.len() as u32,
                    positions,
                });
            }

            records.push(InvertedRecord { term_id, postings });
        }

        Ok(Barrel {
            barrel_id,
            term_id_range: low..high,
            records,
        })
    })
}
