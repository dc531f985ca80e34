//! Forward-only streaming over archive entries.
//!
//! This module provides [`SequentialReader`], a lazy, single-pass walk over
//! the entry table that opens one decoded [`EntryStream`] at a time.
//!
//! # Overview
//!
//! - If the archive has already parsed its table, the reader iterates the
//!   cached entries. Otherwise it deciphers one record per step, so a walk
//!   over a huge archive never holds the whole table.
//! - [`SequentialReader::entry_stream`] borrows the reader mutably: opening
//!   a second stream, or moving on while a stream is open, does not compile.
//! - The reader occupies the archive's child slot; no editor (or second
//!   reader) can be created until it is dropped.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::io::Read;
//! use cmfkit::Archive;
//!
//! let archive = Archive::open_path("data.cmf")?;
//! let mut reader = archive.reader()?;
//! while reader.move_next()? {
//!     let mut stream = reader.entry_stream()?;
//!     let mut head = [0u8; 4];
//!     let n = stream.read(&mut head)?;
//!     println!("{}: {:02x?}", stream.entry().name, &head[..n]);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod reader;

pub use reader::{EntryStream, SequentialReader};
