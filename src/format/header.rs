//! CMF archive header: the opaque signature and the entry count.

use std::io::{self, Read};

use crate::{Error, Result};

use super::cipher::decode_count;
use super::{COUNT_FIELD_SIZE, RECORD_SIZE, SIGNATURE_SIZE, TABLE_OFFSET};

/// The fixed-size header at the start of every archive.
#[derive(Clone, PartialEq, Eq)]
pub struct ArchiveHeader {
    /// Opaque signature block, never interpreted.
    pub signature: [u8; SIGNATURE_SIZE],
    /// Number of records in the entry table.
    pub entry_count: u32,
}

impl std::fmt::Debug for ArchiveHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveHeader")
            .field("entry_count", &self.entry_count)
            .finish_non_exhaustive()
    }
}

impl ArchiveHeader {
    /// Reads the signature and deciphers the entry count.
    ///
    /// The reader must be positioned at the start of the archive.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptHeader`] if the source ends before the count
    /// field, and [`Error::NotReadable`] for any other read failure.
    pub fn read<R: Read>(r: &mut R) -> Result<Self> {
        let mut signature = [0u8; SIGNATURE_SIZE];
        let mut count = [0u8; COUNT_FIELD_SIZE];
        r.read_exact(&mut signature)
            .and_then(|()| r.read_exact(&mut count))
            .map_err(|e| match e.kind() {
                io::ErrorKind::UnexpectedEof => {
                    Error::corrupt_header(0, "archive is shorter than its header")
                }
                _ => Error::NotReadable { source: e },
            })?;

        Ok(Self {
            signature,
            entry_count: decode_count(count),
        })
    }

    /// Absolute offset of the first entry record.
    pub fn table_offset(&self) -> u64 {
        TABLE_OFFSET
    }

    /// Total size of the entry table in bytes.
    pub fn table_size(&self) -> u64 {
        u64::from(self.entry_count) * RECORD_SIZE as u64
    }

    /// Absolute offset of the payload region.
    pub fn payload_offset(&self) -> u64 {
        self.table_offset() + self.table_size()
    }

    /// Absolute offset of the record at `index`.
    pub fn record_offset(&self, index: usize) -> u64 {
        self.table_offset() + index as u64 * RECORD_SIZE as u64
    }
}
