//! Error types for CMF archive operations.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes when working with CMF archives, along with a convenient
//! [`Result<T>`] type alias.
//!
//! # Error Handling
//!
//! All fallible operations in this crate return `Result<T, Error>`. Lookups
//! that simply miss (an index past the end, a path nobody has) are not
//! errors: they return `Ok(None)` or `Ok(false)`.
//!
//! ```rust,no_run
//! use cmfkit::{Archive, Error};
//!
//! fn replace(path: &str) -> cmfkit::Result<()> {
//!     let archive = Archive::open_path_read_write(path)?;
//!     let mut editor = archive.editor()?;
//!     match editor.stage("data/config.ini", b"fps=60" as &[u8]) {
//!         Ok(true) => {}
//!         Ok(false) => eprintln!("no such entry"),
//!         Err(Error::OversizedReplacement { capacity, .. }) => {
//!             eprintln!("replacement must fit in {} bytes", capacity);
//!         }
//!         Err(e) => return Err(e),
//!     }
//!     editor.save()?;
//!     Ok(())
//! }
//! # fn main() {}
//! ```

use std::io;

/// The main error type for CMF archive operations.
///
/// # Error Categories
///
/// | Category | Variants | Typical Cause |
/// |----------|----------|---------------|
/// | I/O | [`Io`][Self::Io], [`NotReadable`][Self::NotReadable], [`NotWritable`][Self::NotWritable] | Source capabilities |
/// | Format | [`CorruptHeader`][Self::CorruptHeader] | Invalid archive data |
/// | Lifecycle | [`AlreadyOpen`][Self::AlreadyOpen], [`Disposed`][Self::Disposed] | Reader/editor slot misuse |
/// | Editing | [`OversizedReplacement`][Self::OversizedReplacement], [`SharedSlotConflict`][Self::SharedSlotConflict], [`InvalidCompressionLevel`][Self::InvalidCompressionLevel] | Staged content |
/// | Windows | [`OutOfRange`][Self::OutOfRange] | Seeks outside an entry slot |
/// | Extraction | [`EntryNotFound`][Self::EntryNotFound], [`PathTraversal`][Self::PathTraversal] | Caller input, unsafe names |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The source could not be read when the archive was opened.
    #[error("archive source is not readable: {source}")]
    NotReadable {
        /// The underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// A write was attempted through a read-only archive or window.
    ///
    /// Open the archive with [`Archive::open_read_write`] or
    /// [`Archive::open_path_read_write`] to save edits in place, or use
    /// [`Editor::write_to`] to produce a modified copy.
    ///
    /// [`Archive::open_read_write`]: crate::Archive::open_read_write
    /// [`Archive::open_path_read_write`]: crate::Archive::open_path_read_write
    /// [`Editor::write_to`]: crate::Editor::write_to
    #[error("archive source is not writable")]
    NotWritable,

    /// A reader or editor was requested while another one is still open.
    ///
    /// Each archive hands out at most one [`SequentialReader`] or one
    /// [`Editor`] at a time. Drop (or `close()`) the live one first.
    ///
    /// [`SequentialReader`]: crate::SequentialReader
    /// [`Editor`]: crate::Editor
    #[error("a {holder} is already open on this archive")]
    AlreadyOpen {
        /// What currently holds the slot (`"reader"` or `"editor"`).
        holder: &'static str,
    },

    /// The archive backing this object has been closed.
    #[error("{what} used after its archive was closed")]
    Disposed {
        /// The kind of object that was used.
        what: &'static str,
    },

    /// An operation that requires an entry could not find it.
    ///
    /// Plain lookups ([`Archive::find`], [`Archive::entry`]) return `None`
    /// instead of this error.
    ///
    /// [`Archive::find`]: crate::Archive::find
    /// [`Archive::entry`]: crate::Archive::entry
    #[error("Entry not found: {path}")]
    EntryNotFound {
        /// The path or index that was requested.
        path: String,
    },

    /// Staged content does not fit in the entry's slot.
    ///
    /// The layout of a CMF archive is fixed: a replacement may be shorter
    /// than the original payload (it is zero-padded) but never longer.
    /// Nothing is written when this error is returned.
    #[error("replacement for '{name}' needs at least {len} bytes but its slot holds {capacity}")]
    OversizedReplacement {
        /// Name of the entry being replaced.
        name: String,
        /// Number of bytes produced before the slot overflowed.
        len: u64,
        /// Size of the entry's slot (its compressed size).
        capacity: u64,
    },

    /// Two entries share one slot and both were staged.
    ///
    /// Entries whose records name the same offset and size alias a single
    /// slot; only one replacement can be written there. Unstage the other
    /// entry first.
    #[error("'{name}' shares its slot with '{other}', which already has a pending replacement")]
    SharedSlotConflict {
        /// Name of the entry being staged.
        name: String,
        /// Name of the aliasing entry that is already staged.
        other: String,
    },

    /// A position outside a bounded window was requested.
    #[error("position {position} is outside the window of {length} bytes")]
    OutOfRange {
        /// The requested window-relative position.
        position: i128,
        /// The window length.
        length: u64,
    },

    /// The header or entry table is corrupt or truncated.
    #[error("Corrupt header at offset {offset:#x}: {reason}")]
    CorruptHeader {
        /// The byte offset where corruption was detected.
        offset: u64,
        /// A description of the corruption.
        reason: String,
    },

    /// The compression level is outside `0..=9`.
    #[error("invalid compression level {level}: must be 0-9")]
    InvalidCompressionLevel {
        /// The rejected level.
        level: u32,
    },

    /// An entry name would escape the extraction directory.
    #[error("Path traversal detected in entry {entry_index}: {path}")]
    PathTraversal {
        /// Index of the offending entry.
        entry_index: usize,
        /// The entry name as stored in the archive.
        path: String,
    },
}

impl Error {
    /// Returns true for reader/editor lifecycle violations.
    pub fn is_lifecycle_error(&self) -> bool {
        matches!(self, Error::AlreadyOpen { .. } | Error::Disposed { .. })
    }

    /// Returns true if this error indicates damaged archive data.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::CorruptHeader { .. })
    }

    /// Returns the entry name associated with this error, if any.
    pub fn entry_name(&self) -> Option<&str> {
        match self {
            Error::OversizedReplacement { name, .. } => Some(name.as_str()),
            Error::SharedSlotConflict { name, .. } => Some(name.as_str()),
            Error::PathTraversal { path, .. } => Some(path.as_str()),
            Error::EntryNotFound { path } => Some(path.as_str()),
            _ => None,
        }
    }

    /// Creates a CorruptHeader error.
    pub fn corrupt_header(offset: u64, reason: impl Into<String>) -> Self {
        Error::CorruptHeader {
            offset,
            reason: reason.into(),
        }
    }

    /// Wraps this error in an [`io::Error`] so it can cross `Read`/`Write`/`Seek`.
    pub(crate) fn into_io(self) -> io::Error {
        let kind = match &self {
            Error::OutOfRange { .. } => io::ErrorKind::InvalidInput,
            Error::NotWritable => io::ErrorKind::PermissionDenied,
            Error::OversizedReplacement { .. } => io::ErrorKind::WriteZero,
            Error::Io(e) => e.kind(),
            _ => io::ErrorKind::Other,
        };
        io::Error::new(kind, self)
    }
}

/// Converts an I/O error back into a crate error, unwrapping a crate error
/// that was carried through an `io::Error`.
pub(crate) fn map_io_error(e: io::Error) -> Error {
    if !e.get_ref().is_some_and(|inner| inner.is::<Error>()) {
        return Error::Io(e);
    }
    let kind = e.kind();
    match e.into_inner().map(|inner| inner.downcast::<Error>()) {
        Some(Ok(err)) => *err,
        Some(Err(other)) => Error::Io(io::Error::new(kind, other)),
        None => Error::Io(io::Error::from(kind)),
    }
}

/// A specialized Result type for CMF archive operations.
pub type Result<T> = std::result::Result<T, Error>;
