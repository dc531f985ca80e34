//! Replacement payload input.

use std::io::{self, Read, Write};

use crate::codec::{PayloadCodec, ZlibEncoderOptions};

/// Content staged as the replacement for an entry.
///
/// Either a byte slice or a reader. A reader may carry a length, in which
/// case at most that many bytes are taken from it.
///
/// # Example
///
/// ```rust,ignore
/// editor.stage("a.txt", b"inline bytes")?;
/// editor.stage("b.txt", Payload::reader(&mut file))?;
/// editor.stage("c.txt", Payload::reader_with_length(&mut file, 128))?;
/// ```
pub enum Payload<'a> {
    /// Bytes held by the caller.
    Bytes(&'a [u8]),
    /// Bytes pulled from a reader.
    Reader {
        /// The source of the bytes.
        source: &'a mut dyn Read,
        /// Maximum number of bytes to take; `None` reads to the end.
        length: Option<u64>,
    },
}

impl<'a> Payload<'a> {
    /// A payload read to the end of `source`.
    pub fn reader(source: &'a mut dyn Read) -> Self {
        Payload::Reader {
            source,
            length: None,
        }
    }

    /// A payload of at most `length` bytes read from `source`.
    pub fn reader_with_length(source: &'a mut dyn Read, length: u64) -> Self {
        Payload::Reader {
            source,
            length: Some(length),
        }
    }

    /// Encodes the payload with `codec` into `out`.
    pub(crate) fn encode_into<W: Write>(
        self,
        codec: PayloadCodec,
        out: W,
        options: &ZlibEncoderOptions,
    ) -> io::Result<W> {
        let (out, _) = match self {
            Payload::Bytes(mut bytes) => codec.encode(&mut bytes, out, options)?,
            Payload::Reader {
                source,
                length: Some(n),
            } => codec.encode(&mut source.take(n), out, options)?,
            Payload::Reader {
                source,
                length: None,
            } => codec.encode(source, out, options)?,
        };
        Ok(out)
    }
}

impl std::fmt::Debug for Payload<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Payload::Bytes(b) => f.debug_tuple("Bytes").field(&b.len()).finish(),
            Payload::Reader { length, .. } => f
                .debug_struct("Reader")
                .field("length", length)
                .finish_non_exhaustive(),
        }
    }
}

impl<'a> From<&'a [u8]> for Payload<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Payload::Bytes(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for Payload<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        Payload::Bytes(bytes.as_slice())
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Payload<'a> {
    fn from(bytes: &'a [u8; N]) -> Self {
        Payload::Bytes(bytes.as_slice())
    }
}

impl<'a> From<&'a str> for Payload<'a> {
    fn from(text: &'a str) -> Self {
        Payload::Bytes(text.as_bytes())
    }
}

impl<'a> From<&'a String> for Payload<'a> {
    fn from(text: &'a String) -> Self {
        Payload::Bytes(text.as_bytes())
    }
}
