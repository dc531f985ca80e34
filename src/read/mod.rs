//! Archive reading API for CMF archives.
//!
//! This module provides the [`Archive`] handle: it owns the byte source,
//! the parsed header and the lazily parsed entry table, extracts single
//! entries, and hands out at most one [`SequentialReader`] or one
//! [`Editor`] at a time.
//!
//! # Example
//!
//! ```rust,no_run
//! use cmfkit::Archive;
//!
//! let archive = Archive::open_path("data.cmf")?;
//!
//! for entry in archive.entries()?.iter() {
//!     println!("{}: {} bytes", entry.name, entry.unpacked_size);
//! }
//!
//! if let Some(entry) = archive.find("script/ui/main.lua")? {
//!     let bytes = archive.extract_entry_to_vec(&entry)?;
//!     println!("{} bytes", bytes.len());
//! }
//! # Ok::<(), cmfkit::Error>(())
//! ```
//!
//! [`SequentialReader`]: crate::SequentialReader
//! [`Editor`]: crate::Editor

mod archive_open;
mod archive_query;
mod entry;
pub(crate) mod extraction;

pub use entry::{Entry, EntryRef, PayloadKind};
pub use extraction::ExtractResult;
pub(crate) use entry::resolve_in;

use std::cell::RefCell;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::rc::Rc;

use crate::format::header::ArchiveHeader;
use crate::format::table::parse_table;
use crate::{Error, Result};

/// What currently holds an archive's child slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    Idle,
    Reader,
    Editor,
}

impl Slot {
    fn holder(&self) -> &'static str {
        match self {
            Slot::Idle => "nothing",
            Slot::Reader => "reader",
            Slot::Editor => "editor",
        }
    }
}

/// State shared between an archive and its reader or editor.
pub(crate) struct Shared<S> {
    /// The base source; `None` once the archive is closed.
    pub(crate) source: Option<S>,
    pub(crate) slot: Slot,
    /// Cached entry table.
    pub(crate) entries: Option<Rc<[Entry]>>,
}

impl<S> Shared<S> {
    fn new(source: S) -> Self {
        Self {
            source: Some(source),
            slot: Slot::Idle,
            entries: None,
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.source.is_none()
    }

    /// Claims the child slot.
    pub(crate) fn claim(&mut self, slot: Slot) -> Result<()> {
        if self.is_closed() {
            return Err(Error::Disposed { what: "archive" });
        }
        match self.slot {
            Slot::Idle => {
                self.slot = slot;
                Ok(())
            }
            held => Err(Error::AlreadyOpen {
                holder: held.holder(),
            }),
        }
    }

    /// Frees the child slot.
    pub(crate) fn release(&mut self) {
        self.slot = Slot::Idle;
    }

    /// Returns the source, or `Disposed` naming `what` once closed.
    pub(crate) fn source_mut(&mut self, what: &'static str) -> Result<&mut S> {
        self.source.as_mut().ok_or(Error::Disposed { what })
    }
}

impl<S: Read + Seek> Shared<S> {
    /// Returns the entry table, parsing and caching it on first use.
    pub(crate) fn entries(&mut self, header: &ArchiveHeader) -> Result<Rc<[Entry]>> {
        if let Some(entries) = &self.entries {
            return Ok(Rc::clone(entries));
        }
        let source = self.source_mut("archive")?;
        let entries: Rc<[Entry]> = parse_table(source, header)?.into();
        self.entries = Some(Rc::clone(&entries));
        Ok(entries)
    }
}

pub(crate) type SharedHandle<S> = Rc<RefCell<Shared<S>>>;

/// A `Read + Seek (+ Write)` handle on an archive's shared source.
///
/// Each call borrows the shared state only for its own duration. Once the
/// archive is closed, every call fails with [`Error::Disposed`].
pub(crate) struct SharedSource<S> {
    shared: SharedHandle<S>,
    what: &'static str,
}

impl<S> SharedSource<S> {
    pub(crate) fn new(shared: &SharedHandle<S>, what: &'static str) -> Self {
        Self {
            shared: Rc::clone(shared),
            what,
        }
    }

    fn with<T>(&mut self, f: impl FnOnce(&mut S) -> io::Result<T>) -> io::Result<T> {
        let mut shared = self
            .shared
            .try_borrow_mut()
            .map_err(|_| io::Error::other("archive source is already in use"))?;
        let source = shared.source_mut(self.what).map_err(Error::into_io)?;
        f(source)
    }
}

impl<S: Read> Read for SharedSource<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.with(|s| s.read(buf))
    }
}

impl<S: Seek> Seek for SharedSource<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.with(|s| s.seek(pos))
    }
}

impl<S: Write> Write for SharedSource<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.with(|s| s.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.with(|s| s.flush())
    }
}

/// A CMF archive.
///
/// The header is read when the archive is opened; the entry table is parsed
/// on first use and cached. Dropping the archive (or calling
/// [`close`](Self::close)) releases the source: pass `&mut F` instead of `F`
/// to keep using it afterwards.
///
/// An archive is single-threaded (`!Send`), and hands out at most one
/// [`SequentialReader`](crate::SequentialReader) or one
/// [`Editor`](crate::Editor) at a time.
pub struct Archive<S> {
    pub(crate) shared: SharedHandle<S>,
    pub(crate) header: ArchiveHeader,
    pub(crate) writable: bool,
    /// Canonical path, when opened from the filesystem.
    pub(crate) path: Option<PathBuf>,
    pub(crate) source_len: u64,
}

impl<S> std::fmt::Debug for Archive<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("header", &self.header)
            .field("writable", &self.writable)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl<S> Archive<S> {
    /// Closes the archive and drops its source.
    ///
    /// A reader or editor that is still alive fails with
    /// [`Error::Disposed`] from then on.
    pub fn close(self) {}

    pub(crate) fn source(&self, what: &'static str) -> SharedSource<S> {
        SharedSource::new(&self.shared, what)
    }
}

impl<S> Drop for Archive<S> {
    fn drop(&mut self) {
        if let Ok(mut shared) = self.shared.try_borrow_mut() {
            shared.source = None;
            log::debug!("archive closed");
        }
    }
}
