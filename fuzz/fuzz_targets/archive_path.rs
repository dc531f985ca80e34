//! Fuzz target for entry-name validation.
//!
//! Run with: cargo +nightly fuzz run archive_path
//!
//! Properties checked:
//! - Validated paths never contain `.` or `..` segments
//! - Validated paths are relative and NUL-free
//! - Normalization is idempotent

#![no_main]

use libfuzzer_sys::fuzz_target;

use cmfkit::archive_path::{normalize_path, paths_match};

fuzz_target!(|data: &[u8]| {
    let Ok(name) = std::str::from_utf8(data) else {
        return;
    };

    let normalized = normalize_path(name);
    assert_eq!(normalize_path(&normalized), normalized);
    assert!(paths_match(name, &normalized));

    if let Ok(path) = cmfkit::ArchivePath::for_entry(name, 0) {
        let s = path.as_str();
        assert!(!s.starts_with('/'), "Absolute path accepted: {:?}", s);
        assert!(!s.contains('\0'), "NUL byte accepted: {:?}", s);
        assert!(
            path.components().all(|c| c != "." && c != ".."),
            "Dot segment accepted: {:?}",
            s
        );
    }
});
