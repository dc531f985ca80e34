//! Archive query methods.
//!
//! This module provides methods for querying the header and the entry table
//! without extraction. Misses are `Ok(None)`; errors come only from reading
//! the table.

use std::io::{Read, Seek};
use std::path::Path;
use std::rc::Rc;

use crate::Result;
use crate::format::SIGNATURE_SIZE;
use crate::format::header::ArchiveHeader;

use super::{Archive, Entry, EntryRef, resolve_in};

impl<S> Archive<S> {
    /// Returns the number of entries declared by the header.
    ///
    /// This never parses the entry table.
    pub fn len(&self) -> usize {
        self.header.entry_count as usize
    }

    /// Returns true if the archive declares no entries.
    pub fn is_empty(&self) -> bool {
        self.header.entry_count == 0
    }

    /// Returns the parsed header.
    pub fn header(&self) -> &ArchiveHeader {
        &self.header
    }

    /// Returns the opaque signature block.
    pub fn signature(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.header.signature
    }

    /// Returns true if the archive was opened read-write.
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// Returns the canonical path of the archive file, if opened from one.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the total length of the source in bytes.
    pub fn source_len(&self) -> u64 {
        self.source_len
    }
}

impl<S: Read + Seek> Archive<S> {
    /// Returns all entries, parsing the table on first use.
    ///
    /// The table is cached; later calls return the same shared slice.
    pub fn entries(&self) -> Result<Rc<[Entry]>> {
        self.shared.borrow_mut().entries(&self.header)
    }

    /// Returns the entry at `index`.
    pub fn entry(&self, index: usize) -> Result<Option<Entry>> {
        self.resolve(EntryRef::Index(index))
    }

    /// Finds an entry by path.
    ///
    /// Separators are normalized (`\`, `\\` and `//` all match `/`) and the
    /// comparison ignores case.
    pub fn find(&self, path: &str) -> Result<Option<Entry>> {
        self.resolve(EntryRef::Path(path))
    }

    /// Resolves any entry selector.
    pub fn resolve<'a>(&self, selector: impl Into<EntryRef<'a>>) -> Result<Option<Entry>> {
        let entries = self.entries()?;
        Ok(resolve_in(&entries, selector.into()).cloned())
    }

    /// Sum of the slot sizes of every entry.
    pub fn total_compressed_size(&self) -> Result<u64> {
        Ok(self.entries()?.iter().map(|e| e.compressed_size).sum())
    }

    /// Sum of the unpacked sizes of every entry.
    pub fn total_unpacked_size(&self) -> Result<u64> {
        Ok(self.entries()?.iter().map(|e| e.unpacked_size).sum())
    }
}
