//! Archive opening methods.
//!
//! This module provides methods for opening CMF archives from files and from
//! arbitrary seekable sources, read-only or read-write.

use std::cell::RefCell;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::format::header::ArchiveHeader;
use crate::{Error, Result};

use super::{Archive, Shared};

impl Archive<File> {
    /// Opens a read-only archive from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or its header is
    /// invalid.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(Error::Io)?;
        let mut archive = Self::open_internal(file, false)?;
        archive.path = canonical(path);
        Ok(archive)
    }

    /// Opens an archive from a file path for in-place editing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened for reading and
    /// writing, or its header is invalid.
    pub fn open_path_read_write(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(Error::Io)?;
        let mut archive = Self::open_internal(file, true)?;
        archive.path = canonical(path);
        Ok(archive)
    }
}

fn canonical(path: &Path) -> Option<PathBuf> {
    std::fs::canonicalize(path).ok()
}

impl<S: Read + Seek> Archive<S> {
    /// Opens a read-only archive from a seekable source.
    ///
    /// The header is read from the start of the source; the entry table is
    /// parsed on first use.
    ///
    /// # Errors
    ///
    /// - [`Error::NotReadable`] if the source cannot be read
    /// - [`Error::CorruptHeader`] if the source is shorter than the header,
    ///   or if any declared record other than a cut-short final one lies
    ///   entirely past the end of the source
    pub fn open(source: S) -> Result<Self> {
        Self::open_internal(source, false)
    }

    fn open_internal(mut source: S, writable: bool) -> Result<Self> {
        source
            .seek(SeekFrom::Start(0))
            .map_err(|e| Error::NotReadable { source: e })?;
        let header = ArchiveHeader::read(&mut source)?;
        let source_len = source
            .seek(SeekFrom::End(0))
            .map_err(|e| Error::NotReadable { source: e })?;

        // Every declared record must start inside the source; only the last
        // one may be cut short.
        if let Some(last) = header.entry_count.checked_sub(1) {
            let last_offset = header.record_offset(last as usize);
            if last_offset >= source_len {
                return Err(Error::corrupt_header(
                    crate::format::SIGNATURE_SIZE as u64,
                    format!(
                        "entry count {} puts record {} at {:#x}, past the end of a {}-byte archive",
                        header.entry_count, last, last_offset, source_len
                    ),
                ));
            }
        }

        log::debug!(
            "opened archive: {} entries, {} bytes, {}",
            header.entry_count,
            source_len,
            if writable { "read-write" } else { "read-only" }
        );

        Ok(Self {
            shared: Rc::new(RefCell::new(Shared::new(source))),
            header,
            writable,
            path: None,
            source_len,
        })
    }
}

impl<S: Read + Write + Seek> Archive<S> {
    /// Opens an archive from a seekable, writable source.
    ///
    /// Edits made through [`Editor::save`](crate::Editor::save) are written
    /// back into this source.
    ///
    /// # Errors
    ///
    /// Same as [`Archive::open`].
    pub fn open_read_write(source: S) -> Result<Self> {
        Self::open_internal(source, true)
    }
}
