//! Shared test utilities for integration tests.
//!
//! Builds synthetic CMF archives: an opaque signature, an enciphered entry
//! table and the payload region, with payloads laid out back to back unless
//! a test places them explicitly.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::io::Write;
use std::path::PathBuf;

use cmfkit::format::{ENTRY_KEY_1, ENTRY_KEY_2, ENTRY_KEY_3, NAME_FIELD_SIZE, RECORD_SIZE};
use flate2::Compression;
use flate2::write::ZlibEncoder;
use tempfile::TempDir;

/// Signature block used by every fixture.
pub const SIGNATURE: [u8; 100] = {
    let mut sig = [0u8; 100];
    let mut i = 0;
    while i < 100 {
        sig[i] = (i as u8).wrapping_mul(7).wrapping_add(3);
        i += 1;
    }
    sig
};

/// Record flags as stored on disk.
pub const FLAG_STORED: i32 = 0;
pub const FLAG_COMPRESSED: i32 = 1;
pub const FLAG_ENCRYPTED: i32 = 2;

const KEYS: [u32; 3] = [ENTRY_KEY_1, ENTRY_KEY_2, ENTRY_KEY_3];

/// Enciphers one word (inverse of the archive transform).
pub fn encode_word(plain: [u8; 4], key: u32) -> [u8; 4] {
    let [c0, c1, c2, c3] = (u32::from_le_bytes(plain) ^ key).to_be_bytes();
    [c0, c2, c1, c3]
}

/// Enciphers a whole record in place.
pub fn encode_record(buf: &mut [u8]) {
    for (i, word) in buf.chunks_exact_mut(4).enumerate() {
        let plain = [word[0], word[1], word[2], word[3]];
        word.copy_from_slice(&encode_word(plain, KEYS[i % 3]));
    }
}

/// Compresses `data` as a zlib stream.
pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Raw values of one table record.
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub name: String,
    pub unpacked_size: i32,
    pub compressed_size: i32,
    pub data_offset: i32,
    pub flag: i32,
}

impl RawRecord {
    /// Plain record bytes (name as UTF-16LE), before enciphering.
    pub fn plain_bytes(&self) -> Vec<u8> {
        let mut rec: Vec<u8> = self
            .name
            .encode_utf16()
            .flat_map(u16::to_le_bytes)
            .collect();
        rec.resize(NAME_FIELD_SIZE, 0);
        rec.extend_from_slice(&self.unpacked_size.to_le_bytes());
        rec.extend_from_slice(&self.compressed_size.to_le_bytes());
        rec.extend_from_slice(&self.data_offset.to_le_bytes());
        rec.extend_from_slice(&self.flag.to_le_bytes());
        assert_eq!(rec.len(), RECORD_SIZE);
        rec
    }

    /// Enciphered record bytes.
    pub fn encoded(&self) -> Vec<u8> {
        let mut rec = self.plain_bytes();
        encode_record(&mut rec);
        rec
    }
}

/// Encodes the signature, the count field and every record.
pub fn encode_header_and_table(count: u32, records: &[RawRecord]) -> Vec<u8> {
    let mut out = SIGNATURE.to_vec();
    out.extend_from_slice(&encode_word(count.to_le_bytes(), ENTRY_KEY_1));
    for record in records {
        out.extend_from_slice(&record.encoded());
    }
    out
}

/// Builds an archive from explicit records and a payload region.
pub fn build_raw(records: &[RawRecord], payload: &[u8]) -> Vec<u8> {
    let mut out = encode_header_and_table(records.len() as u32, records);
    out.extend_from_slice(payload);
    out
}

/// One entry of a fixture archive.
#[derive(Debug, Clone)]
pub struct FixtureEntry {
    pub name: String,
    pub flag: i32,
    pub unpacked_size: usize,
    /// Slot bytes exactly as stored.
    pub slot: Vec<u8>,
}

impl FixtureEntry {
    pub fn stored(name: &str, data: &[u8]) -> Self {
        Self::flagged(name, FLAG_STORED, data)
    }

    pub fn compressed(name: &str, data: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            flag: FLAG_COMPRESSED,
            unpacked_size: data.len(),
            slot: zlib(data),
        }
    }

    pub fn encrypted(name: &str, data: &[u8]) -> Self {
        Self::flagged(name, FLAG_ENCRYPTED, data)
    }

    /// Raw slot bytes with an arbitrary flag.
    pub fn flagged(name: &str, flag: i32, data: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            flag,
            unpacked_size: data.len(),
            slot: data.to_vec(),
        }
    }

    /// Grows the slot to `size` bytes with `fill`.
    pub fn with_slot(mut self, size: usize, fill: u8) -> Self {
        assert!(size >= self.slot.len());
        self.slot.resize(size, fill);
        self
    }
}

/// Builds an archive with back-to-back payloads followed by `trailer`.
pub fn build_archive_with_trailer(entries: &[FixtureEntry], trailer: &[u8]) -> Vec<u8> {
    let mut records = Vec::with_capacity(entries.len());
    let mut payload = Vec::new();
    for entry in entries {
        records.push(RawRecord {
            name: entry.name.clone(),
            unpacked_size: entry.unpacked_size as i32,
            compressed_size: entry.slot.len() as i32,
            data_offset: payload.len() as i32,
            flag: entry.flag,
        });
        payload.extend_from_slice(&entry.slot);
    }
    payload.extend_from_slice(trailer);
    build_raw(&records, &payload)
}

/// Builds an archive with back-to-back payloads.
pub fn build_archive(entries: &[FixtureEntry]) -> Vec<u8> {
    build_archive_with_trailer(entries, &[])
}

/// Offset of the payload region for `count` entries.
pub fn payload_offset(count: usize) -> usize {
    100 + 4 + count * RECORD_SIZE
}

/// A small archive with one entry of each kind.
pub fn sample_entries() -> Vec<FixtureEntry> {
    vec![
        FixtureEntry::stored("data\\config.ini", b"fps=30\nvsync=1\n").with_slot(24, 0),
        FixtureEntry::compressed(
            "texture\\ui\\panel.dds",
            &b"DDS panel pixels ".repeat(40),
        ),
        FixtureEntry::flagged("script\\ui\\main.lua", FLAG_COMPRESSED, b"print('hi')"),
        FixtureEntry::encrypted("secret/keys.bin", &[0xDE, 0xAD, 0xBE, 0xEF, 0x01]),
    ]
}

/// Writes `bytes` to a file in a fresh temporary directory.
pub fn write_temp_archive(bytes: &[u8]) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let archive_path = temp_dir.path().join("test.cmf");
    std::fs::write(&archive_path, bytes).expect("Failed to write archive");
    (temp_dir, archive_path)
}
