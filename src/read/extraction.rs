//! Entry extraction from archives.
//!
//! Single entries are extracted straight from the archive through a bounded
//! window over their slot. Folder extraction drives a
//! [`SequentialReader`](crate::SequentialReader) and therefore needs the
//! archive's child slot to be free.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Seek, Write};
use std::path::Path;

use crate::archive_path::ArchivePath;
use crate::codec::PayloadReader;
use crate::error::map_io_error;
use crate::format::header::ArchiveHeader;
use crate::progress::{ProgressReporter, percent_of};
use crate::window::BoundedWindow;
use crate::{Error, Result};

use super::{Archive, Entry};

/// Result of a folder extraction.
#[must_use = "extraction results should be checked for skipped entries"]
#[derive(Debug, Clone, Default)]
pub struct ExtractResult {
    /// Number of entries written to disk.
    pub entries_extracted: usize,
    /// Number of entries skipped (truncated records or unsafe names).
    pub entries_skipped: usize,
    /// Total bytes written.
    pub bytes_extracted: u64,
    /// Skipped entries (name and reason).
    pub skipped: Vec<(String, String)>,
}

impl ExtractResult {
    /// Returns true if every entry was extracted.
    pub fn is_complete(&self) -> bool {
        self.entries_skipped == 0
    }
}

/// Opens the decoded payload of `entry` over `source`.
pub(crate) fn open_payload<R: Read + Seek>(
    source: R,
    header: &ArchiveHeader,
    entry: &Entry,
) -> PayloadReader<BoundedWindow<R>> {
    let codec = entry.codec();
    let window = BoundedWindow::new(
        source,
        header.payload_offset() + entry.data_offset,
        codec.window_len(entry),
    );
    codec.reader(window)
}

/// Copies `reader` into `dest` and flushes it.
pub(crate) fn copy_payload<R: Read, W: Write + ?Sized>(
    reader: &mut R,
    dest: &mut W,
    entry: &Entry,
) -> Result<u64> {
    let written = io::copy(reader, dest).map_err(map_io_error)?;
    dest.flush().map_err(Error::Io)?;
    log::debug!("extracted '{}': {} bytes", entry.name, written);
    Ok(written)
}

/// Creates `path` (and its parent directories) for writing.
pub(crate) fn create_output(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(Error::Io)?;
        }
    }
    Ok(BufWriter::new(File::create(path).map_err(Error::Io)?))
}

impl<S: Read + Seek> Archive<S> {
    /// Writes the decoded payload of `entry` into `dest` and flushes it.
    ///
    /// Compressed entries are inflated from their whole slot. Everything
    /// else (stored, opaque, or passthrough-exempt) is copied raw, limited
    /// to the unpacked size.
    ///
    /// Returns the number of bytes written.
    pub fn extract_entry<W: Write + ?Sized>(&self, entry: &Entry, dest: &mut W) -> Result<u64> {
        let mut reader = open_payload(self.source("archive"), &self.header, entry);
        copy_payload(&mut reader, dest, entry)
    }

    /// Extracts `entry` into memory.
    pub fn extract_entry_to_vec(&self, entry: &Entry) -> Result<Vec<u8>> {
        let capacity = usize::try_from(entry.unpacked_size.min(crate::READ_BUFFER_SIZE as u64 * 64))
            .unwrap_or(0);
        let mut out = Vec::with_capacity(capacity);
        self.extract_entry(entry, &mut out)?;
        Ok(out)
    }

    /// Extracts `entry` into a new file at `path`, creating parent
    /// directories as needed.
    pub fn extract_entry_to_path(&self, entry: &Entry, path: impl AsRef<Path>) -> Result<u64> {
        let mut out = create_output(path.as_ref())?;
        self.extract_entry(entry, &mut out)
    }

    /// Extracts every entry under `dest`, one file per entry.
    ///
    /// Entry names are normalized to `/` separators and joined onto `dest`.
    /// Truncated placeholder records and names that would escape `dest` are
    /// skipped with a warning and counted in the result. `progress` receives
    /// a percentage after each entry.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::AlreadyOpen`] while a reader or editor is alive,
    /// and on the first I/O error.
    pub fn extract_all(
        &self,
        dest: impl AsRef<Path>,
        mut progress: impl ProgressReporter,
    ) -> Result<ExtractResult> {
        let dest = dest.as_ref();
        let mut result = ExtractResult::default();
        let total = self.len();
        let mut reader = self.reader()?;

        fs::create_dir_all(dest).map_err(Error::Io)?;
        progress.on_total(total);

        let mut done = 0;
        while reader.move_next()? {
            let Some(entry) = reader.entry().cloned() else {
                break;
            };
            progress.on_entry_start(&entry.name, entry.unpacked_size);

            let target = if entry.is_truncated() {
                Err(format!("record {} is truncated", entry.index))
            } else {
                ArchivePath::for_entry(&entry.name, entry.index).map_err(|e| e.to_string())
            };

            match target {
                Ok(path) => {
                    let bytes = reader.write_entry_to_path(path.destination(dest))?;
                    result.entries_extracted += 1;
                    result.bytes_extracted += bytes;
                    progress.on_entry_complete(&entry.name, true);
                }
                Err(reason) => {
                    log::warn!("skipping entry {} '{}': {}", entry.index, entry.name, reason);
                    progress.on_warning(&reason);
                    progress.on_entry_complete(&entry.name, false);
                    result.entries_skipped += 1;
                    result.skipped.push((entry.name.clone(), reason));
                }
            }

            done += 1;
            progress.on_percent(percent_of(done, total));
        }
        if done == 0 {
            progress.on_percent(100);
        }

        log::debug!(
            "extracted {} entries ({} skipped) into {}",
            result.entries_extracted,
            result.entries_skipped,
            dest.display()
        );
        Ok(result)
    }
}
