//! Entry table parsing.
//!
//! The table is a sequence of fixed-size records, each deciphered as a whole
//! before its fields are extracted. A record cut short by the end of the
//! source does not abort the parse: it becomes a placeholder entry (see
//! [`Entry::is_truncated`]).

use std::io::{self, Read, Seek, SeekFrom};

use crate::read::{Entry, PayloadKind};
use crate::{Error, Result};

use super::cipher::decode_record;
use super::header::ArchiveHeader;
use super::{NAME_FIELD_SIZE, RECORD_SIZE, record};

/// Parses every record of the table.
pub fn parse_table<R: Read + Seek>(r: &mut R, header: &ArchiveHeader) -> Result<Vec<Entry>> {
    let count = header.entry_count as usize;
    let mut entries = Vec::with_capacity(count);

    r.seek(SeekFrom::Start(header.table_offset()))?;
    let mut buf = [0u8; RECORD_SIZE];
    for index in 0..count {
        let offset = header.record_offset(index);
        let filled = read_full(r, &mut buf)?;
        entries.push(entry_from_record(&mut buf[..filled], index, offset));
    }

    let truncated = entries.iter().filter(|e| e.is_truncated()).count();
    if truncated > 0 {
        log::warn!(
            "entry table is truncated: {} of {} records are incomplete",
            truncated,
            count
        );
    }
    log::debug!("parsed {} entry records", count);
    Ok(entries)
}

/// Parses the single record at `index`.
pub fn read_record<R: Read + Seek>(
    r: &mut R,
    header: &ArchiveHeader,
    index: usize,
) -> Result<Entry> {
    if index >= header.entry_count as usize {
        return Err(Error::corrupt_header(
            header.record_offset(index),
            format!("record {} is past the end of the table", index),
        ));
    }
    let offset = header.record_offset(index);
    r.seek(SeekFrom::Start(offset))?;
    let mut buf = [0u8; RECORD_SIZE];
    let filled = read_full(r, &mut buf)?;
    let entry = entry_from_record(&mut buf[..filled], index, offset);
    if entry.is_truncated() {
        log::warn!("record {} at {:#x} is incomplete", index, offset);
    }
    Ok(entry)
}

/// Reads until `buf` is full or the source is exhausted.
fn read_full<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Builds an entry from raw (still enciphered) record bytes.
///
/// Anything shorter than a full record yields a placeholder.
fn entry_from_record(raw: &mut [u8], index: usize, header_offset: u64) -> Entry {
    let mut entry = Entry {
        index,
        header_offset,
        ..Entry::default()
    };
    if raw.len() < RECORD_SIZE {
        return entry;
    }

    decode_record(raw);

    entry.name = decode_name(&raw[..NAME_FIELD_SIZE]);
    entry.unpacked_size = size_field(raw, record::UNPACKED_SIZE, &entry.name, "unpacked size");
    entry.compressed_size =
        size_field(raw, record::COMPRESSED_SIZE, &entry.name, "compressed size");
    entry.data_offset = size_field(raw, record::DATA_OFFSET, &entry.name, "data offset");
    entry.kind = PayloadKind::from_flag(i32_field(raw, record::FLAG));
    entry.complete = true;
    entry
}

fn i32_field(buf: &[u8], at: usize) -> i32 {
    i32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

/// Reads a non-negative size/offset field; negative values become 0.
fn size_field(buf: &[u8], at: usize, name: &str, what: &str) -> u64 {
    let value = i32_field(buf, at);
    if value < 0 {
        log::warn!("entry '{}' has negative {} {}, using 0", name, what, value);
        return 0;
    }
    value as u64
}

/// Decodes the deciphered filename field.
///
/// Names are UTF-16LE terminated by a NUL code unit. Fields without one are
/// read as ASCII up to the last NUL byte.
pub(crate) fn decode_name(field: &[u8]) -> String {
    let terminator = field
        .chunks_exact(2)
        .position(|unit| unit == [0, 0])
        .map(|units| units * 2);

    let name = match terminator {
        Some(end) => {
            let units: Vec<u16> = field[..end]
                .chunks_exact(2)
                .map(|unit| u16::from_le_bytes([unit[0], unit[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        None => {
            let end = field.iter().rposition(|&b| b == 0).unwrap_or(field.len());
            field[..end]
                .iter()
                .map(|&b| if b.is_ascii() { b as char } else { '?' })
                .collect()
        }
    };

    name.replace('\0', "")
}
