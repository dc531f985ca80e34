//! Mixed-endian XOR transform protecting the header and entry table.
//!
//! Each 4-byte word `(b0, b1, b2, b3)` is read as the big-endian integer of
//! `(b0, b2, b1, b3)` (the middle bytes swapped), XORed with a key, and the
//! result is stored back little-endian. Keys rotate per word.
//!
//! Only decoding exists: edits never touch header or table bytes.

use super::{ENTRY_KEY_1, ENTRY_KEY_2, ENTRY_KEY_3};

const KEYS: [u32; 3] = [ENTRY_KEY_1, ENTRY_KEY_2, ENTRY_KEY_3];

/// Decodes a single word.
///
/// Returns the little-endian replacement bytes together with the decoded
/// value.
#[inline]
pub fn decode_word(bytes: [u8; 4], key: u32) -> ([u8; 4], u32) {
    let [b0, b1, b2, b3] = bytes;
    let value = u32::from_be_bytes([b0, b2, b1, b3]) ^ key;
    (value.to_le_bytes(), value)
}

/// Deciphers `buf` in place, one word at a time.
///
/// Word `i` uses key `i % 3`. Trailing bytes that do not form a whole word
/// are left untouched.
pub fn decode_record(buf: &mut [u8]) {
    for (i, word) in buf.chunks_exact_mut(4).enumerate() {
        let raw = [word[0], word[1], word[2], word[3]];
        let (plain, _) = decode_word(raw, KEYS[i % 3]);
        word.copy_from_slice(&plain);
    }
}

/// Decodes the entry-count field that follows the signature.
pub fn decode_count(bytes: [u8; 4]) -> u32 {
    decode_word(bytes, ENTRY_KEY_1).1
}
