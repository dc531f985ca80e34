//! CMF archive format constants, definitions, and low-level parsing utilities.
//!
//! An archive is laid out as:
//!
//! | Range | Content |
//! |-------|---------|
//! | `[0, 100)` | opaque signature, copied through unchanged |
//! | `[100, 104)` | entry count, enciphered with [`ENTRY_KEY_1`] |
//! | `[104, 104 + 528 * count)` | enciphered entry records |
//! | rest | entry payloads |

pub mod cipher;
pub mod header;
pub mod table;

/// Size of the opaque signature block at the start of every archive.
pub const SIGNATURE_SIZE: usize = 100;

/// Size of the enciphered entry-count field.
pub const COUNT_FIELD_SIZE: usize = 4;

/// Offset of the first entry record.
pub const TABLE_OFFSET: u64 = (SIGNATURE_SIZE + COUNT_FIELD_SIZE) as u64;

/// Size of one entry record in the table.
pub const RECORD_SIZE: usize = 528;

/// Size of the filename field at the start of a record.
pub const NAME_FIELD_SIZE: usize = 512;

/// Key for words at index 0 mod 3, and for the entry count.
pub const ENTRY_KEY_1: u32 = 0xAC93_72DE;
/// Key for words at index 1 mod 3.
pub const ENTRY_KEY_2: u32 = 0x8469_AF01;
/// Key for words at index 2 mod 3.
pub const ENTRY_KEY_3: u32 = 0xDC39_628F;

/// Record field offsets (after deciphering).
pub mod record {
    /// Uncompressed size, i32 LE.
    pub const UNPACKED_SIZE: usize = 512;
    /// Compressed size (slot size), i32 LE.
    pub const COMPRESSED_SIZE: usize = 516;
    /// Payload offset relative to the payload region, i32 LE.
    pub const DATA_OFFSET: usize = 520;
    /// Payload flag, i32 LE.
    pub const FLAG: usize = 524;
}

/// Payload flag values.
pub mod flag {
    /// Raw payload.
    pub const STORED: i32 = 0;
    /// Zlib-compressed payload.
    pub const COMPRESSED: i32 = 1;
    /// Payload the game treats as encrypted; kept opaque.
    pub const OPAQUE: i32 = 2;
}

/// Extensions whose payloads are never run through the codec, whatever
/// their flag says.
pub const PASSTHROUGH_EXTENSIONS: &[&str] = &["lua", "tet", "xet", "fx"];

/// Returns true if `name` has a passthrough-exempt extension.
///
/// The extension is whatever follows the last `.` of the final path
/// component, compared case-insensitively. Names without an extension, or
/// ending in a dot, are never exempt.
///
/// # Examples
///
/// ```
/// use cmfkit::format::is_passthrough_exempt;
///
/// assert!(is_passthrough_exempt("script\\ui\\main.LUA"));
/// assert!(!is_passthrough_exempt("texture/ui.dds"));
/// assert!(!is_passthrough_exempt("lua"));
/// ```
pub fn is_passthrough_exempt(name: &str) -> bool {
    match extension(name) {
        Some(ext) => PASSTHROUGH_EXTENSIONS
            .iter()
            .any(|exempt| ext.eq_ignore_ascii_case(exempt)),
        None => false,
    }
}

/// Returns the extension of the last path component of `name`, if any.
pub(crate) fn extension(name: &str) -> Option<&str> {
    let file_name = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match file_name.rfind('.') {
        Some(pos) if pos + 1 < file_name.len() => Some(&file_name[pos + 1..]),
        _ => None,
    }
}
