//! In-place editing of entry payloads.
//!
//! An archive's layout is fixed: entries cannot be added, removed, renamed
//! or grown. What can change is the content of an entry's slot, as long as
//! the new (possibly compressed) payload fits in it.
//!
//! # Example
//!
//! ```rust,no_run
//! use cmfkit::{Archive, EditOptions};
//!
//! let archive = Archive::open_path_read_write("data.cmf")?;
//! let mut editor = archive.editor_with(EditOptions::new().level(9)?)?;
//!
//! editor.stage("data/config.ini", "fps=60")?;
//! editor.stage_file(3usize, "patched/icon.dds")?;
//!
//! // Either overwrite the slots in place...
//! let result = editor.save()?;
//! println!(
//!     "{} entries rewritten, {} padding bytes",
//!     result.entries_written, result.padding_bytes
//! );
//! # Ok::<(), cmfkit::Error>(())
//! ```
//!
//! # Implementation Notes
//!
//! Staging encodes the payload right away, so an oversized replacement is
//! reported by [`Editor::stage`] rather than at save time. Encoded bytes are
//! kept in memory up to the configured limit, then in an anonymous temporary
//! file under the editor's temp directory.

mod editor;
mod options;
mod payload;
mod spill;

pub use editor::{EditResult, Editor};
pub use options::{DEFAULT_LEVEL, DEFAULT_MEMORY_LIMIT, EditOptions};
pub use payload::Payload;
