//! Archive entry types and selectors.

use crate::codec::PayloadCodec;
use crate::format::{self, flag};

/// How an entry's payload is stored, as given by its record flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PayloadKind {
    /// Raw bytes (flag 0, and any unknown flag value).
    #[default]
    Stored,
    /// Zlib stream (flag 1).
    Compressed,
    /// Marked encrypted by the game (flag 2). Never decrypted; always handled
    /// as opaque raw bytes.
    Opaque,
}

impl PayloadKind {
    /// Maps an on-disk flag value.
    pub fn from_flag(value: i32) -> Self {
        match value {
            flag::COMPRESSED => PayloadKind::Compressed,
            flag::OPAQUE => PayloadKind::Opaque,
            _ => PayloadKind::Stored,
        }
    }

    /// Returns a short lowercase label, used in listings.
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadKind::Stored => "stored",
            PayloadKind::Compressed => "zlib",
            PayloadKind::Opaque => "opaque",
        }
    }
}

/// An entry in a CMF archive.
///
/// Entries are parsed once from the enciphered table and never modified:
/// edits replace payload bytes only, so names, sizes and offsets always
/// describe the archive on disk.
///
/// This struct is marked `#[non_exhaustive]` to allow adding new fields
/// in future versions without breaking downstream code. Pattern matching
/// on `Entry` requires a `..` wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[non_exhaustive]
pub struct Entry {
    /// The path within the archive, as stored (separators untouched).
    pub name: String,
    /// Size of the payload once decoded.
    pub unpacked_size: u64,
    /// Size of the payload slot in the archive.
    ///
    /// A replacement may be at most this long.
    pub compressed_size: u64,
    /// Offset of the payload, relative to the start of the payload region.
    pub data_offset: u64,
    /// Absolute offset of this entry's 528-byte record.
    pub header_offset: u64,
    /// Payload storage kind.
    pub kind: PayloadKind,
    /// Position in the entry table.
    pub index: usize,
    /// False for placeholders built from a record cut short by end of file.
    pub(crate) complete: bool,
}

impl Entry {
    /// Returns true if the record flag marks the payload as compressed.
    ///
    /// Passthrough-exempt entries report `true` here but are still read
    /// raw; see [`codec`](Self::codec).
    pub fn is_compressed(&self) -> bool {
        self.kind == PayloadKind::Compressed
    }

    /// Returns true if the record flag marks the payload as encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.kind == PayloadKind::Opaque
    }

    /// Returns true if this is a placeholder for a truncated record.
    pub fn is_truncated(&self) -> bool {
        !self.complete
    }

    /// Returns the extension of the entry's file name, if any.
    pub fn extension(&self) -> Option<&str> {
        format::extension(&self.name)
    }

    /// Returns true if the payload is never run through the codec.
    pub fn is_passthrough_exempt(&self) -> bool {
        format::is_passthrough_exempt(&self.name)
    }

    /// Returns the codec that reads and writes this entry's payload.
    pub fn codec(&self) -> PayloadCodec {
        PayloadCodec::for_entry(self)
    }

    /// Returns the file name (last component of the path).
    pub fn file_name(&self) -> &str {
        self.name.rsplit(['/', '\\']).next().unwrap_or(&self.name)
    }
}

/// Selects a single entry: by table index, by path, or by a descriptor
/// previously obtained from the same archive.
///
/// # Example
///
/// ```rust,ignore
/// editor.stage(3usize, data)?;                // by index
/// editor.stage("texture\\ui\\main.dds", data)?; // by path
/// editor.stage(&entry, data)?;                // by descriptor
/// ```
#[derive(Debug, Clone, Copy)]
pub enum EntryRef<'a> {
    /// Table index.
    Index(usize),
    /// Archive path, matched after separator normalization and
    /// case-insensitively.
    Path(&'a str),
    /// A descriptor; resolves only if the entry at its index is identical.
    Entry(&'a Entry),
}

impl From<usize> for EntryRef<'_> {
    fn from(index: usize) -> Self {
        EntryRef::Index(index)
    }
}

impl<'a> From<&'a str> for EntryRef<'a> {
    fn from(path: &'a str) -> Self {
        EntryRef::Path(path)
    }
}

impl<'a> From<&'a String> for EntryRef<'a> {
    fn from(path: &'a String) -> Self {
        EntryRef::Path(path.as_str())
    }
}

impl<'a> From<&'a Entry> for EntryRef<'a> {
    fn from(entry: &'a Entry) -> Self {
        EntryRef::Entry(entry)
    }
}

impl std::fmt::Display for EntryRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryRef::Index(i) => write!(f, "#{}", i),
            EntryRef::Path(p) => f.write_str(p),
            EntryRef::Entry(e) => f.write_str(&e.name),
        }
    }
}

/// Finds the entry `selector` designates in `entries`.
pub(crate) fn resolve_in<'e>(entries: &'e [Entry], selector: EntryRef<'_>) -> Option<&'e Entry> {
    match selector {
        EntryRef::Index(i) => entries.get(i),
        EntryRef::Path(path) => entries
            .iter()
            .find(|e| crate::archive_path::paths_match(&e.name, path)),
        EntryRef::Entry(wanted) => entries.get(wanted.index).filter(|e| *e == wanted),
    }
}
