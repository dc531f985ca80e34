//! Spill storage for staged payloads.
//!
//! A staged payload is spooled in memory until it grows past the configured
//! limit, then moves to an anonymous temporary file that the OS removes once
//! it is dropped.

use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use tempfile::SpooledTempFile;

use crate::Error;

/// Encoded replacement bytes for one entry.
pub(crate) struct Spill {
    file: SpooledTempFile,
    len: u64,
}

impl std::fmt::Debug for Spill {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Spill")
            .field("len", &self.len)
            .field("in_memory", &self.is_in_memory())
            .finish_non_exhaustive()
    }
}

impl Spill {
    pub(crate) fn new(temp_dir: &Path, memory_limit: usize) -> Self {
        Self {
            file: tempfile::spooled_tempfile_in(memory_limit, temp_dir),
            len: 0,
        }
    }

    /// Number of bytes spilled.
    pub(crate) fn len(&self) -> u64 {
        self.len
    }

    pub(crate) fn is_in_memory(&self) -> bool {
        !self.file.is_rolled()
    }

    /// Copies the spilled bytes into `dest`.
    ///
    /// The spill stays intact, so a failed copy can be retried.
    pub(crate) fn copy_to<W: Write + ?Sized>(&mut self, dest: &mut W) -> io::Result<u64> {
        self.file.seek(SeekFrom::Start(0))?;
        let copied = io::copy(&mut (&mut self.file).take(self.len), dest)?;
        self.file.seek(SeekFrom::End(0))?;
        Ok(copied)
    }
}

impl Write for Spill {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let was_in_memory = self.is_in_memory();
        let n = self.file.write(buf)?;
        self.len += n as u64;
        if was_in_memory && !self.is_in_memory() {
            log::debug!("spill of {} bytes moved to a temporary file", self.len);
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Refuses to accept more than `capacity` bytes.
///
/// The overflowing write fails with [`Error::OversizedReplacement`] wrapped
/// in an `io::Error`, reporting how many bytes had been produced by then.
pub(crate) struct SlotWriter<'a, W> {
    inner: W,
    name: &'a str,
    capacity: u64,
    written: u64,
}

impl<'a, W> SlotWriter<'a, W> {
    pub(crate) fn new(inner: W, name: &'a str, capacity: u64) -> Self {
        Self {
            inner,
            name,
            capacity,
            written: 0,
        }
    }

    pub(crate) fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for SlotWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let wanted = self.written + buf.len() as u64;
        if wanted > self.capacity {
            return Err(Error::OversizedReplacement {
                name: self.name.to_string(),
                len: wanted,
                capacity: self.capacity,
            }
            .into_io());
        }
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
