//! Payload codec selection.
//!
//! An entry's payload is either a zlib stream or raw bytes. The choice is made
//! from the record flag and the entry name: compressed entries whose
//! extension is passthrough-exempt are stored as flagged but must be
//! handled raw.

pub mod zlib;

use std::io::{self, BufReader, Read, Write};

use crate::read::{Entry, PayloadKind};

pub use zlib::{ZlibDecoder, ZlibEncoder, ZlibEncoderOptions};

/// How an entry's payload bytes are transformed on the way in and out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadCodec {
    /// Bytes are used as they are.
    Raw,
    /// Bytes are a zlib stream.
    Zlib,
}

impl PayloadCodec {
    /// Picks the codec for `entry`.
    pub fn for_entry(entry: &Entry) -> Self {
        if entry.kind == PayloadKind::Compressed && !entry.is_passthrough_exempt() {
            PayloadCodec::Zlib
        } else {
            PayloadCodec::Raw
        }
    }

    /// Length of the slot window that is read to extract `entry`.
    ///
    /// Zlib streams are read from the whole slot; raw payloads are pinned to
    /// the unpacked size so that padding left by a shorter replacement
    /// never leaks into the output.
    pub fn window_len(&self, entry: &Entry) -> u64 {
        match self {
            PayloadCodec::Zlib => entry.compressed_size,
            PayloadCodec::Raw => entry.unpacked_size,
        }
    }

    /// Wraps a slot window in the matching decoder.
    pub fn reader<R: Read>(&self, window: R) -> PayloadReader<R> {
        match self {
            PayloadCodec::Raw => PayloadReader::Raw(window),
            PayloadCodec::Zlib => PayloadReader::Zlib(ZlibDecoder::new(BufReader::new(window))),
        }
    }

    /// Encodes everything `input` yields into `output`.
    ///
    /// Returns `output` and the number of input bytes consumed.
    pub fn encode<W: Write>(
        &self,
        input: &mut dyn Read,
        output: W,
        options: &ZlibEncoderOptions,
    ) -> io::Result<(W, u64)> {
        match self {
            PayloadCodec::Raw => {
                let mut output = output;
                let n = io::copy(input, &mut output)?;
                Ok((output, n))
            }
            PayloadCodec::Zlib => {
                let mut encoder = ZlibEncoder::new(output, options);
                let n = io::copy(input, &mut encoder)?;
                Ok((encoder.try_finish()?, n))
            }
        }
    }
}

impl std::fmt::Display for PayloadCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            PayloadCodec::Raw => "raw",
            PayloadCodec::Zlib => "zlib",
        })
    }
}

/// A decoded view of an entry's payload.
#[derive(Debug)]
pub enum PayloadReader<R> {
    /// Raw bytes passed through.
    Raw(R),
    /// Inflating zlib decoder.
    Zlib(ZlibDecoder<BufReader<R>>),
}

impl<R: Read> Read for PayloadReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            PayloadReader::Raw(r) => r.read(buf),
            PayloadReader::Zlib(r) => r.read(buf),
        }
    }
}
