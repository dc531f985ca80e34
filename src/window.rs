//! Bounded views onto a shared byte source.
//!
//! A [`BoundedWindow`] exposes `[offset, offset + length)` of an underlying
//! seekable source as if it were a stream of its own. The window keeps its
//! own position and seeks the source before every access, so several windows
//! over one source can be used one after another without disturbing each
//! other.

use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::{Error, Result};

/// A read/seek (optionally write) view of a fixed byte range.
pub struct BoundedWindow<R> {
    inner: R,
    offset: u64,
    length: u64,
    position: u64,
    writable: bool,
}

impl<R> std::fmt::Debug for BoundedWindow<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedWindow")
            .field("offset", &self.offset)
            .field("length", &self.length)
            .field("position", &self.position)
            .field("writable", &self.writable)
            .finish_non_exhaustive()
    }
}

impl<R> BoundedWindow<R> {
    /// Creates a read-only window.
    pub fn new(inner: R, offset: u64, length: u64) -> Self {
        Self {
            inner,
            offset,
            length,
            position: 0,
            writable: false,
        }
    }

    /// Creates a window that also accepts writes, clamped to its range.
    pub fn writable(inner: R, offset: u64, length: u64) -> Self {
        Self {
            writable: true,
            ..Self::new(inner, offset, length)
        }
    }

    /// Absolute offset of the window in the source.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Length of the window.
    pub fn len(&self) -> u64 {
        self.length
    }

    /// Returns true if the window covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Current window-relative position.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Bytes left between the position and the end of the window.
    pub fn remaining(&self) -> u64 {
        self.length - self.position
    }

    /// Returns true if writes are accepted.
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// Moves to a window-relative position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] if `position` is past the end.
    pub fn set_position(&mut self, position: u64) -> Result<()> {
        if position > self.length {
            return Err(Error::OutOfRange {
                position: i128::from(position),
                length: self.length,
            });
        }
        self.position = position;
        Ok(())
    }

    /// Returns the underlying source.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Number of bytes an access of `want` bytes may touch.
    fn clamp(&self, want: usize) -> usize {
        want.min(usize::try_from(self.remaining()).unwrap_or(usize::MAX))
    }
}

impl<R: Seek> BoundedWindow<R> {
    fn seek_inner(&mut self) -> io::Result<()> {
        self.inner
            .seek(SeekFrom::Start(self.offset + self.position))
            .map(|_| ())
    }
}

impl<R: Read + Seek> Read for BoundedWindow<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.clamp(buf.len());
        if n == 0 {
            return Ok(0);
        }
        self.seek_inner()?;
        let read = self.inner.read(&mut buf[..n])?;
        self.position += read as u64;
        Ok(read)
    }
}

impl<R: Seek> Seek for BoundedWindow<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(p) => i128::from(p),
            SeekFrom::Current(d) => i128::from(self.position) + i128::from(d),
            SeekFrom::End(d) => i128::from(self.length) + i128::from(d),
        };
        if target < 0 || target > i128::from(self.length) {
            return Err(Error::OutOfRange {
                position: target,
                length: self.length,
            }
            .into_io());
        }
        self.position = target as u64;
        Ok(self.position)
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        Ok(self.position)
    }
}

impl<R: Write + Seek> Write for BoundedWindow<R> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.writable {
            return Err(Error::NotWritable.into_io());
        }
        let n = self.clamp(buf.len());
        if n == 0 {
            return Ok(0);
        }
        self.seek_inner()?;
        let written = self.inner.write(&buf[..n])?;
        self.position += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::map_io_error;
    use proptest::prelude::*;
    use std::io::Cursor;

    fn source() -> Cursor<Vec<u8>> {
        Cursor::new((0..=255u8).collect())
    }

    #[test]
    fn test_read_clamped_at_window_end() {
        let mut w = BoundedWindow::new(source(), 100, 10);
        w.seek(SeekFrom::Start(5)).unwrap();
        let mut buf = [0u8; 20];
        assert_eq!(w.read(&mut buf).unwrap(), 5);
        assert_eq!(&buf[..5], &[105, 106, 107, 108, 109]);
        assert_eq!(w.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_seek_past_end_is_out_of_range() {
        let mut w = BoundedWindow::new(source(), 100, 10);
        let err = w.seek(SeekFrom::Start(11)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(matches!(
            map_io_error(err),
            Error::OutOfRange {
                position: 11,
                length: 10
            }
        ));
        // A failed seek leaves the position alone.
        assert_eq!(w.position(), 0);
    }

    #[test]
    fn test_seek_relative() {
        let mut w = BoundedWindow::new(source(), 100, 10);
        assert_eq!(w.seek(SeekFrom::End(-2)).unwrap(), 8);
        assert_eq!(w.seek(SeekFrom::Current(-8)).unwrap(), 0);
        assert!(w.seek(SeekFrom::Current(-1)).is_err());
        assert_eq!(w.seek(SeekFrom::End(0)).unwrap(), 10);
        assert!(w.seek(SeekFrom::End(1)).is_err());
    }

    #[test]
    fn test_set_position() {
        let mut w = BoundedWindow::new(source(), 0, 4);
        w.set_position(4).unwrap();
        assert_eq!(w.remaining(), 0);
        assert!(matches!(
            w.set_position(5),
            Err(Error::OutOfRange { position: 5, .. })
        ));
    }

    #[test]
    fn test_windows_share_a_source() {
        let mut src = source();
        let mut a = [0u8; 3];
        let mut b = [0u8; 3];
        {
            let mut w = BoundedWindow::new(&mut src, 10, 3);
            w.read_exact(&mut a).unwrap();
        }
        {
            let mut w = BoundedWindow::new(&mut src, 200, 3);
            w.read_exact(&mut b).unwrap();
        }
        assert_eq!(a, [10, 11, 12]);
        assert_eq!(b, [200, 201, 202]);
    }

    #[test]
    fn test_read_only_window_rejects_writes() {
        let mut w = BoundedWindow::new(source(), 0, 8);
        let err = w.write(b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert!(matches!(map_io_error(err), Error::NotWritable));
    }

    #[test]
    fn test_writable_window_is_clamped() {
        let mut w = BoundedWindow::writable(Cursor::new(vec![0u8; 16]), 4, 4);
        w.write_all(b"abcd").unwrap();
        let err = w.write_all(b"e").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WriteZero);

        let data = w.into_inner().into_inner();
        assert_eq!(&data[..4], &[0; 4]);
        assert_eq!(&data[4..8], b"abcd");
        assert_eq!(&data[8..], &[0; 8]);
    }

    #[test]
    fn test_window_past_source_end_reads_short() {
        let mut w = BoundedWindow::new(Cursor::new(vec![1u8; 8]), 6, 10);
        let mut buf = Vec::new();
        w.read_to_end(&mut buf).unwrap();
        assert_eq!(buf, [1, 1]);
    }

    proptest! {
        #[test]
        fn prop_read_never_leaves_window(
            offset in 0u64..200,
            length in 0u64..100,
            start in 0u64..100,
        ) {
            let mut w = BoundedWindow::new(source(), offset, length);
            prop_assume!(start <= length);
            w.seek(SeekFrom::Start(start)).unwrap();
            let mut buf = Vec::new();
            w.read_to_end(&mut buf).unwrap();

            let end = (offset + length).min(256);
            let from = (offset + start).min(end);
            let expected: Vec<u8> = (from..end).map(|b| b as u8).collect();
            prop_assert_eq!(buf, expected);
        }
    }
}
