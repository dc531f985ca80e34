//! Sequential reader and entry streams.

use std::io::{self, Read, Seek, Write};
use std::marker::PhantomData;
use std::path::Path;
use std::rc::Rc;

use crate::codec::PayloadReader;
use crate::format::header::ArchiveHeader;
use crate::format::table::read_record;
use crate::read::extraction::{copy_payload, create_output, open_payload};
use crate::read::{Archive, Entry, SharedHandle, SharedSource, Slot};
use crate::window::BoundedWindow;
use crate::{Error, Result};

const WHAT: &str = "reader";

impl<S: Read + Seek> Archive<S> {
    /// Creates a forward-only reader over the entries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyOpen`] while another reader or an editor is
    /// alive on this archive.
    pub fn reader(&self) -> Result<SequentialReader<S>> {
        self.shared.borrow_mut().claim(Slot::Reader)?;
        log::debug!("reader opened");
        Ok(SequentialReader {
            shared: Rc::clone(&self.shared),
            header: self.header.clone(),
            next_index: 0,
            current: None,
        })
    }
}

/// A lazy, forward-only, single-pass walk over an archive's entries.
///
/// Created by [`Archive::reader`]. Dropping the reader (or calling
/// [`close`](Self::close)) frees the archive for another reader or an
/// editor.
pub struct SequentialReader<S> {
    shared: SharedHandle<S>,
    header: ArchiveHeader,
    next_index: usize,
    current: Option<Entry>,
}

impl<S> std::fmt::Debug for SequentialReader<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequentialReader")
            .field("next_index", &self.next_index)
            .field("current", &self.current.as_ref().map(|e| &e.name))
            .finish_non_exhaustive()
    }
}

impl<S> SequentialReader<S> {
    /// Returns the entry the reader is positioned on.
    ///
    /// `None` before the first [`move_next`](Self::move_next) and after the
    /// last entry.
    pub fn entry(&self) -> Option<&Entry> {
        self.current.as_ref()
    }

    /// Number of entries not yet visited.
    pub fn remaining(&self) -> usize {
        (self.header.entry_count as usize).saturating_sub(self.next_index)
    }

    /// Releases the archive's child slot.
    pub fn close(self) {}

    fn ensure_open(&self) -> Result<()> {
        if self.shared.borrow().is_closed() {
            return Err(Error::Disposed { what: WHAT });
        }
        Ok(())
    }
}

impl<S: Read + Seek> SequentialReader<S> {
    /// Advances to the next entry.
    ///
    /// Returns `Ok(false)` once every record has been visited. The table
    /// cache is used if the archive has one; otherwise the next record is
    /// read and deciphered on its own.
    pub fn move_next(&mut self) -> Result<bool> {
        self.ensure_open()?;
        let index = self.next_index;
        if index >= self.header.entry_count as usize {
            self.current = None;
            return Ok(false);
        }

        let cached = self.shared.borrow().entries.clone();
        let entry = match cached.and_then(|entries| entries.get(index).cloned()) {
            Some(entry) => entry,
            None => read_record(
                &mut SharedSource::new(&self.shared, WHAT),
                &self.header,
                index,
            )?,
        };

        self.next_index += 1;
        self.current = Some(entry);
        Ok(true)
    }

    /// Opens the decoded payload of the current entry.
    ///
    /// The stream borrows the reader, so it is closed before the reader can
    /// move on.
    ///
    /// # Errors
    ///
    /// [`Error::EntryNotFound`] when the reader is not positioned on an
    /// entry; [`Error::Disposed`] once the archive is closed.
    pub fn entry_stream(&mut self) -> Result<EntryStream<'_, S>> {
        self.ensure_open()?;
        let source = SharedSource::new(&self.shared, WHAT);
        let entry = self.current.as_ref().ok_or_else(|| Error::EntryNotFound {
            path: "<no current entry>".into(),
        })?;
        Ok(EntryStream {
            inner: open_payload(source, &self.header, entry),
            entry,
            _reader: PhantomData,
        })
    }

    /// Copies the current entry's decoded payload into `dest` and flushes it.
    pub fn write_entry_to<W: Write + ?Sized>(&mut self, dest: &mut W) -> Result<u64> {
        let mut stream = self.entry_stream()?;
        let entry = stream.entry;
        copy_payload(&mut stream, dest, entry)
    }

    /// Writes the current entry into a new file at `path`, creating parent
    /// directories as needed.
    pub fn write_entry_to_path(&mut self, path: impl AsRef<Path>) -> Result<u64> {
        self.ensure_open()?;
        let mut out = create_output(path.as_ref())?;
        self.write_entry_to(&mut out)
    }
}

impl<S> Drop for SequentialReader<S> {
    fn drop(&mut self) {
        if let Ok(mut shared) = self.shared.try_borrow_mut() {
            shared.release();
            log::debug!("reader closed");
        }
    }
}

/// The decoded payload of one entry, borrowed from a [`SequentialReader`].
pub struct EntryStream<'a, S> {
    inner: PayloadReader<BoundedWindow<SharedSource<S>>>,
    entry: &'a Entry,
    _reader: PhantomData<&'a mut SequentialReader<S>>,
}

impl<S> EntryStream<'_, S> {
    /// The entry being read.
    pub fn entry(&self) -> &Entry {
        self.entry
    }
}

impl<S> std::fmt::Debug for EntryStream<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryStream")
            .field("entry", &self.entry.name)
            .finish_non_exhaustive()
    }
}

impl<S: Read + Seek> Read for EntryStream<'_, S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}
