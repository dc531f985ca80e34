//! Archive path normalization, matching and validation for secure extraction.
//!
//! Entry names in CMF archives are stored as written by the game's tools,
//! usually with `\` separators. Lookups normalize both sides so that
//! `"a\\b/c"`, `"a//b/c"` and `"A/B/C"` all designate the same entry.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Windows reserved device names that cannot be used as filenames.
///
/// Rejected on all platforms so that an extraction behaves the same
/// everywhere.
const WINDOWS_RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Checks if a filename is a Windows reserved name.
///
/// Windows reserved names are case-insensitive and also reserved
/// when followed by an extension (e.g., "CON.txt" is reserved).
fn is_windows_reserved(name: &str) -> bool {
    let base = match name.find('.') {
        Some(pos) => &name[..pos],
        None => name,
    };
    WINDOWS_RESERVED_NAMES
        .iter()
        .any(|reserved| base.eq_ignore_ascii_case(reserved))
}

/// Normalizes separators: every run of `/` and `\` becomes a single `/`.
///
/// Leading and trailing separators are kept (as one `/`) so that absolute
/// names stay recognizable.
///
/// # Examples
///
/// ```
/// use cmfkit::archive_path::normalize_path;
///
/// assert_eq!(normalize_path("a\\\\b//c"), "a/b/c");
/// assert_eq!(normalize_path("\\root\\x"), "/root/x");
/// ```
pub fn normalize_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut last_was_sep = false;
    for c in path.chars() {
        if c == '/' || c == '\\' {
            if !last_was_sep {
                out.push('/');
            }
            last_was_sep = true;
        } else {
            out.push(c);
            last_was_sep = false;
        }
    }
    out
}

/// Returns true if two archive paths designate the same entry.
///
/// Both sides are normalized, then compared case-insensitively.
pub fn paths_match(a: &str, b: &str) -> bool {
    normalize_path(a).to_lowercase() == normalize_path(b).to_lowercase()
}

/// A validated, normalized relative path, safe to join onto an extraction
/// directory.
///
/// `ArchivePath` uses forward slashes and guarantees that:
/// - No NUL bytes are present
/// - The path is not absolute (no leading separator, no drive prefix)
/// - It is not empty
/// - No `.` or `..` segments are present
/// - No segment is a Windows reserved device name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArchivePath(String);

impl ArchivePath {
    /// Validates the name of the entry at `entry_index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PathTraversal`] if the normalized name would not stay
    /// inside an extraction directory.
    pub fn for_entry(name: &str, entry_index: usize) -> Result<Self> {
        let normalized = normalize_path(name);
        if Self::is_safe(&normalized) {
            Ok(Self(normalized))
        } else {
            Err(Error::PathTraversal {
                entry_index,
                path: name.to_string(),
            })
        }
    }

    fn is_safe(s: &str) -> bool {
        if s.is_empty() || s.contains('\0') || s.starts_with('/') || s.ends_with('/') {
            return false;
        }
        // Drive-relative names such as "C:foo" or "C:/foo".
        if s.as_bytes().get(1) == Some(&b':') {
            return false;
        }
        s.split('/')
            .all(|segment| segment != "." && segment != ".." && !is_windows_reserved(segment))
    }

    /// Returns the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the path components.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Joins this path onto `root`, one component at a time.
    pub fn destination(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        path.extend(self.components());
        path
    }
}

impl AsRef<str> for ArchivePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArchivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
