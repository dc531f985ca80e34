//! # cmfkit
//!
//! A pure-Rust library for reading and patching CMF game data archives.
//!
//! A CMF archive is a 100-byte signature, an obfuscated entry table and a
//! payload region. This crate deciphers the table, streams entries out
//! (inflating zlib payloads where the format calls for it), and replaces
//! entry payloads in place without ever changing the archive layout.
//!
//! ## Quick Start
//!
//! ### Listing and Extracting
//!
//! ```rust,no_run
//! use cmfkit::{Archive, Result};
//!
//! fn main() -> Result<()> {
//!     let archive = Archive::open_path("data.cmf")?;
//!
//!     for entry in archive.entries()?.iter() {
//!         println!("{}: {} bytes ({})", entry.name, entry.unpacked_size, entry.kind.as_str());
//!     }
//!
//!     let result = archive.extract_all("./output", ())?;
//!     println!("extracted {} entries", result.entries_extracted);
//!     Ok(())
//! }
//! ```
//!
//! ### Replacing an Entry
//!
//! ```rust,no_run
//! use cmfkit::{Archive, Result};
//!
//! fn main() -> Result<()> {
//!     let archive = Archive::open_path_read_write("data.cmf")?;
//!     let mut editor = archive.editor()?;
//!
//!     // The new content must fit in the entry's existing slot.
//!     editor.stage("script/ui/main.lua", "-- patched")?;
//!     let result = editor.save()?;
//!     println!("rewrote {} entries", result.entries_written);
//!     Ok(())
//! }
//! ```
//!
//! ## Concurrency
//!
//! An [`Archive`] is single-threaded. It hands out at most one
//! [`SequentialReader`] or one [`Editor`] at a time; asking for a second one
//! fails with [`Error::AlreadyOpen`]. Closing the archive invalidates a live
//! reader or editor, which then fails with [`Error::Disposed`].
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `cli` | The `cmfkit` command-line tool |

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]

/// Default buffer size for read operations (8 KiB).
pub(crate) const READ_BUFFER_SIZE: usize = 8192;

pub mod archive_path;
pub mod codec;
pub mod edit;
pub mod error;
pub mod format;
pub mod progress;
pub mod read;
pub mod streaming;
pub mod window;

pub use archive_path::ArchivePath;
pub use codec::PayloadCodec;
pub use error::{Error, Result};
pub use window::BoundedWindow;

// Re-export reading API at crate root for convenience
pub use read::{Archive, Entry, EntryRef, ExtractResult, PayloadKind};

// Re-export streaming API
pub use streaming::{EntryStream, SequentialReader};

// Re-export edit API
pub use edit::{EditOptions, EditResult, Editor, Payload};

// Re-export progress API
pub use progress::{NoProgress, ProgressReporter, StatisticsProgress, progress_fn};
