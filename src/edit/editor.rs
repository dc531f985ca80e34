//! Staged editor for replacing entry payloads.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::map_io_error;
use crate::format::header::ArchiveHeader;
use crate::read::{Archive, Entry, EntryRef, SharedHandle, SharedSource, Slot, resolve_in};
use crate::window::BoundedWindow;
use crate::{Error, Result};

use super::options::EditOptions;
use super::payload::Payload;
use super::spill::{SlotWriter, Spill};

const WHAT: &str = "editor";

/// Result of flushing staged edits.
#[must_use = "edit result should be checked to verify operation completed as expected"]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditResult {
    /// Number of entries whose slot received a replacement.
    pub entries_written: usize,
    /// Number of entries copied verbatim (only by [`Editor::write_to`]).
    pub entries_copied: usize,
    /// Replacement bytes written, excluding padding.
    pub bytes_written: u64,
    /// Zero bytes written after replacements to fill their slots.
    pub padding_bytes: u64,
}

impl EditResult {
    /// Returns the number of slot bytes rewritten.
    pub fn slot_bytes(&self) -> u64 {
        self.bytes_written + self.padding_bytes
    }
}

impl<S: Read + Seek> Archive<S> {
    /// Creates an editor with default [`EditOptions`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyOpen`] while a reader or another editor is
    /// alive, or an error from parsing the entry table.
    pub fn editor(&self) -> Result<Editor<S>> {
        self.editor_with(EditOptions::default())
    }

    /// Creates an editor with the given options.
    pub fn editor_with(&self, options: EditOptions) -> Result<Editor<S>> {
        let entries = self.entries()?;
        self.shared.borrow_mut().claim(Slot::Editor)?;
        log::debug!("editor opened (level {})", options.level);
        Ok(Editor {
            shared: Rc::clone(&self.shared),
            header: self.header.clone(),
            entries,
            writable: self.writable,
            path: self.path.clone(),
            source_len: self.source_len,
            options,
            pending: BTreeMap::new(),
        })
    }
}

/// Stages replacement payloads and writes them back without changing the
/// archive layout.
///
/// Every replacement must fit in its entry's slot (the entry's compressed
/// size). Shorter replacements are zero-padded; the entry table is never
/// rewritten. Staged content lives in memory or in anonymous temporary
/// files until [`save`](Self::save) or [`write_to`](Self::write_to) consumes
/// it; dropping the editor discards it.
///
/// # Example
///
/// ```rust,no_run
/// use cmfkit::Archive;
///
/// let archive = Archive::open_path_read_write("data.cmf")?;
/// let mut editor = archive.editor()?;
/// editor.stage("script\\ui\\main.lua", "-- patched")?;
/// let result = editor.save()?;
/// println!("{} entries rewritten", result.entries_written);
/// # Ok::<(), cmfkit::Error>(())
/// ```
pub struct Editor<S> {
    shared: SharedHandle<S>,
    header: ArchiveHeader,
    entries: Rc<[Entry]>,
    writable: bool,
    path: Option<PathBuf>,
    source_len: u64,
    options: EditOptions,
    pending: BTreeMap<usize, Spill>,
}

impl<S> std::fmt::Debug for Editor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("entries", &self.entries.len())
            .field("pending", &self.pending.len())
            .field("writable", &self.writable)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<S> Editor<S> {
    /// Returns the archive's entries.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Finds the entry `selector` designates.
    pub fn resolve<'a>(&self, selector: impl Into<EntryRef<'a>>) -> Option<&Entry> {
        resolve_in(&self.entries, selector.into())
    }

    /// Number of entries with a pending replacement.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Returns true if `selector` has a pending replacement.
    pub fn is_staged<'a>(&self, selector: impl Into<EntryRef<'a>>) -> bool {
        self.staged_len(selector).is_some()
    }

    /// Returns the encoded length of the pending replacement for `selector`.
    pub fn staged_len<'a>(&self, selector: impl Into<EntryRef<'a>>) -> Option<u64> {
        let entry = self.resolve(selector)?;
        self.pending.get(&entry.index).map(Spill::len)
    }

    /// Drops the pending replacement for `selector`.
    ///
    /// Returns true if there was one.
    pub fn unstage<'a>(&mut self, selector: impl Into<EntryRef<'a>>) -> bool {
        match resolve_in(&self.entries, selector.into()) {
            Some(entry) => self.pending.remove(&entry.index).is_some(),
            None => false,
        }
    }

    /// Directory used for spill files.
    pub fn temp_dir(&self) -> &Path {
        &self.options.temp_dir
    }

    /// Compression level used for compressed entries.
    pub fn level(&self) -> u32 {
        self.options.level
    }

    /// Returns true if [`save`](Self::save) can write into the archive.
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// Discards pending replacements and frees the archive's child slot.
    pub fn close(self) {}

    fn ensure_open(&self) -> Result<()> {
        if self.shared.borrow().is_closed() {
            return Err(Error::Disposed { what: WHAT });
        }
        Ok(())
    }

    /// Stages `payload` as the new content of `selector`.
    ///
    /// Compressed entries (other than passthrough-exempt ones) get a fresh
    /// zlib stream at the configured level; every other entry takes the
    /// bytes as they are. Staging an entry again replaces its previous
    /// content.
    ///
    /// Returns `Ok(false)` if `selector` matches no entry.
    ///
    /// # Errors
    ///
    /// [`Error::OversizedReplacement`] as soon as the encoded content
    /// outgrows the entry's slot. Any previously staged content for the
    /// entry is kept.
    ///
    /// [`Error::SharedSlotConflict`] if another entry pointing at the same
    /// slot is already staged.
    pub fn stage<'a, 'p>(
        &mut self,
        selector: impl Into<EntryRef<'a>>,
        payload: impl Into<Payload<'p>>,
    ) -> Result<bool> {
        self.ensure_open()?;
        let Some(entry) = resolve_in(&self.entries, selector.into()) else {
            return Ok(false);
        };

        if let Some(other) = self
            .entries
            .iter()
            .find(|other| shares_slot(entry, other) && self.pending.contains_key(&other.index))
        {
            return Err(Error::SharedSlotConflict {
                name: entry.name.clone(),
                other: other.name.clone(),
            });
        }

        let payload: Payload<'p> = payload.into();
        let codec = entry.codec();
        let spill = Spill::new(&self.options.temp_dir, self.options.memory_limit);
        let writer = SlotWriter::new(spill, &entry.name, entry.compressed_size);
        let spill = payload
            .encode_into(codec, writer, &self.options.encoder_options())
            .map_err(map_io_error)?
            .into_inner();

        log::debug!(
            "staged '{}': {} {} bytes for a {}-byte slot",
            entry.name,
            spill.len(),
            codec,
            entry.compressed_size
        );
        self.pending.insert(entry.index, spill);
        Ok(true)
    }

    /// Stages UTF-8 text.
    pub fn stage_str<'a>(&mut self, selector: impl Into<EntryRef<'a>>, text: &str) -> Result<bool> {
        self.stage(selector, Payload::Bytes(text.as_bytes()))
    }

    /// Stages the content of the file at `path`.
    pub fn stage_file<'a>(
        &mut self,
        selector: impl Into<EntryRef<'a>>,
        path: impl AsRef<Path>,
    ) -> Result<bool> {
        let mut file = File::open(path.as_ref()).map_err(Error::Io)?;
        self.stage(selector, Payload::reader(&mut file))
    }
}

impl<S: Read + Seek> Editor<S> {
    /// Writes a complete copy of the archive, with pending replacements
    /// applied, into `dest`. The archive itself is never modified.
    ///
    /// The header and entry table are copied verbatim. Payload slots follow
    /// in offset order: staged ones are replaced and zero-padded to their
    /// size, all other bytes (untouched slots, gaps, trailing data) are
    /// copied as they are. With nothing staged the output is identical to
    /// the source.
    ///
    /// Pending replacements are consumed.
    ///
    /// # Errors
    ///
    /// [`Error::CorruptHeader`] if two entries claim slots that partially
    /// overlap. Entries naming exactly the same slot are written once.
    pub fn write_to<W: Write + ?Sized>(&mut self, dest: &mut W) -> Result<EditResult> {
        self.ensure_open()?;
        let entries = Rc::clone(&self.entries);
        let slots = ordered_slots(&entries)?;
        let mut pending = std::mem::take(&mut self.pending);
        let mut result = EditResult::default();
        let mut pos = 0u64;

        for aliases in slots {
            let entry = aliases[0];
            let start = self.slot_offset(entry);
            self.copy_range(pos, start, dest)?;
            let staged = aliases
                .iter()
                .find_map(|alias| pending.remove(&alias.index).map(|spill| (*alias, spill)));
            match staged {
                Some((alias, mut spill)) => {
                    let (written, padding) = fill_slot(&mut spill, dest, alias)?;
                    result.entries_written += 1;
                    result.bytes_written += written;
                    result.padding_bytes += padding;
                }
                None => {
                    self.copy_range(start, start + entry.compressed_size, dest)?;
                    result.entries_copied += aliases.len();
                }
            }
            pos = start + entry.compressed_size;
        }
        self.copy_range(pos, self.source_len, dest)?;
        dest.flush().map_err(Error::Io)?;

        log::debug!(
            "wrote archive copy: {} replaced, {} copied",
            result.entries_written,
            result.entries_copied
        );
        Ok(result)
    }

    fn slot_offset(&self, entry: &Entry) -> u64 {
        self.header.payload_offset() + entry.data_offset
    }

    /// Copies source bytes `[from, to)` into `dest`.
    fn copy_range<W: Write + ?Sized>(&self, from: u64, to: u64, dest: &mut W) -> Result<u64> {
        if to <= from {
            return Ok(0);
        }
        let mut window = BoundedWindow::new(SharedSource::new(&self.shared, WHAT), from, to - from);
        io::copy(&mut window, dest).map_err(map_io_error)
    }
}

impl<S: Read + Write + Seek> Editor<S> {
    /// Writes every pending replacement into the archive, in place.
    ///
    /// Each staged entry's slot is overwritten with its replacement followed
    /// by zero padding; nothing else in the archive changes. Replacements
    /// are consumed as they are written, so after a failure the entry that
    /// failed and every entry after it are still pending. Does nothing when
    /// nothing is staged.
    ///
    /// # Errors
    ///
    /// [`Error::NotWritable`] unless the archive was opened with
    /// [`Archive::open_read_write`] or [`Archive::open_path_read_write`].
    pub fn save(&mut self) -> Result<EditResult> {
        self.ensure_open()?;
        if !self.writable {
            return Err(Error::NotWritable);
        }
        let mut result = EditResult::default();
        if self.pending.is_empty() {
            return Ok(result);
        }

        let payload_offset = self.header.payload_offset();
        while let Some(mut staged) = self.pending.first_entry() {
            let entry = &self.entries[*staged.key()];
            let mut window = BoundedWindow::writable(
                SharedSource::new(&self.shared, WHAT),
                payload_offset + entry.data_offset,
                entry.compressed_size,
            );
            let (written, padding) = fill_slot(staged.get_mut(), &mut window, entry)?;
            staged.remove();
            result.entries_written += 1;
            result.bytes_written += written;
            result.padding_bytes += padding;
        }
        SharedSource::new(&self.shared, WHAT)
            .flush()
            .map_err(map_io_error)?;

        log::debug!(
            "saved {} entries in place ({} bytes, {} padding)",
            result.entries_written,
            result.bytes_written,
            result.padding_bytes
        );
        Ok(result)
    }
}

impl Editor<File> {
    /// Writes the edited archive to `path`.
    ///
    /// When `path` is the file this archive was opened from, this is
    /// [`save`](Self::save); otherwise the file is created (or truncated)
    /// and receives a [`write_to`](Self::write_to) copy.
    pub fn write_to_path(&mut self, path: impl AsRef<Path>) -> Result<EditResult> {
        let path = path.as_ref();
        let same_file = match (&self.path, std::fs::canonicalize(path)) {
            (Some(own), Ok(target)) => *own == target,
            _ => false,
        };
        if same_file {
            return self.save();
        }
        let mut out = BufWriter::new(File::create(path).map_err(Error::Io)?);
        self.write_to(&mut out)
    }
}

impl<S> Drop for Editor<S> {
    fn drop(&mut self) {
        if let Ok(mut shared) = self.shared.try_borrow_mut() {
            shared.release();
        }
        if !self.pending.is_empty() {
            log::debug!(
                "editor closed with {} unsaved replacements",
                self.pending.len()
            );
        }
    }
}

fn has_slot(entry: &Entry) -> bool {
    !entry.is_truncated() && entry.compressed_size > 0
}

/// Returns true if `a` and `b` are different entries naming the same slot.
fn shares_slot(a: &Entry, b: &Entry) -> bool {
    a.index != b.index
        && has_slot(a)
        && has_slot(b)
        && a.data_offset == b.data_offset
        && a.compressed_size == b.compressed_size
}

/// Non-empty slots in offset order, each with every entry that names it.
fn ordered_slots(entries: &[Entry]) -> Result<Vec<Vec<&Entry>>> {
    let mut sorted: Vec<&Entry> = entries.iter().filter(|e| has_slot(e)).collect();
    sorted.sort_by_key(|e| (e.data_offset, e.compressed_size, e.index));

    let mut slots: Vec<Vec<&Entry>> = Vec::new();
    for entry in sorted {
        if let Some(last) = slots.last_mut() {
            let prev = last[0];
            if shares_slot(prev, entry) {
                last.push(entry);
                continue;
            }
            if prev.data_offset + prev.compressed_size > entry.data_offset {
                return Err(Error::corrupt_header(
                    entry.header_offset,
                    format!("slot of '{}' overlaps slot of '{}'", entry.name, prev.name),
                ));
            }
        }
        slots.push(vec![entry]);
    }
    Ok(slots)
}

/// Writes `spill` then zero padding up to the entry's slot size.
fn fill_slot<W: Write + ?Sized>(spill: &mut Spill, dest: &mut W, entry: &Entry) -> Result<(u64, u64)> {
    let written = spill.copy_to(dest).map_err(map_io_error)?;
    let padding = entry.compressed_size.saturating_sub(written);
    io::copy(&mut io::repeat(0).take(padding), dest).map_err(map_io_error)?;
    Ok((written, padding))
}
