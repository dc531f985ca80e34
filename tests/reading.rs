//! Integration tests for listing, lookup and extraction.

mod common;

use std::io::{Cursor, Read, Seek, SeekFrom};

use cmfkit::{Archive, BoundedWindow, Error, PayloadCodec, PayloadKind, StatisticsProgress};

use common::{
    FLAG_COMPRESSED, FixtureEntry, build_archive, build_archive_with_trailer, sample_entries,
    write_temp_archive,
};

fn open_sample() -> Archive<Cursor<Vec<u8>>> {
    Archive::open(Cursor::new(build_archive(&sample_entries()))).unwrap()
}

// =============================================================================
// Listing
// =============================================================================

#[test]
fn test_list_entries() {
    let archive = open_sample();
    assert_eq!(archive.len(), 4);
    assert_eq!(archive.signature(), &common::SIGNATURE);

    let entries = archive.entries().unwrap();
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(
        names,
        [
            "data\\config.ini",
            "texture\\ui\\panel.dds",
            "script\\ui\\main.lua",
            "secret/keys.bin"
        ]
    );

    assert_eq!(entries[0].kind, PayloadKind::Stored);
    assert_eq!(entries[0].unpacked_size, 15);
    assert_eq!(entries[0].compressed_size, 24);
    assert_eq!(entries[1].kind, PayloadKind::Compressed);
    assert_eq!(entries[1].codec(), PayloadCodec::Zlib);
    assert!(entries[2].is_compressed());
    assert!(entries[2].is_passthrough_exempt());
    assert_eq!(entries[2].codec(), PayloadCodec::Raw);
    assert!(entries[3].is_encrypted());
    assert_eq!(entries[3].codec(), PayloadCodec::Raw);
    assert!(entries.iter().all(|e| !e.is_truncated()));
}

#[test]
fn test_layout_accounts_for_every_byte() {
    let bytes = build_archive(&sample_entries());
    let archive = Archive::open(Cursor::new(bytes.clone())).unwrap();
    let slots = archive.total_compressed_size().unwrap();
    assert_eq!(100 + 4 + 528 * archive.len() as u64 + slots, bytes.len() as u64);
    assert_eq!(archive.source_len(), bytes.len() as u64);
}

#[test]
fn test_entries_are_cached() {
    let archive = open_sample();
    let first = archive.entries().unwrap();
    let second = archive.entries().unwrap();
    assert!(std::rc::Rc::ptr_eq(&first, &second));
}

#[test]
fn test_entry_by_index() {
    let archive = open_sample();
    assert_eq!(archive.entry(1).unwrap().unwrap().name, "texture\\ui\\panel.dds");
    assert!(archive.entry(4).unwrap().is_none());
}

// =============================================================================
// Path lookup
// =============================================================================

#[test]
fn test_find_normalizes_separators_and_case() {
    let archive = Archive::open(Cursor::new(build_archive(&[FixtureEntry::stored(
        "a/b/c",
        b"x",
    )])))
    .unwrap();

    for query in ["a\\b/c", "a//b/c", "A/B/C", "a\\\\b\\c", "a/b/c"] {
        let found = archive.find(query).unwrap();
        assert_eq!(found.map(|e| e.index), Some(0), "query {query:?}");
    }
    assert!(archive.find("a/b").unwrap().is_none());
}

#[test]
fn test_find_backslash_names() {
    let archive = open_sample();
    let entry = archive.find("TEXTURE/UI/PANEL.DDS").unwrap().unwrap();
    assert_eq!(entry.index, 1);
    assert!(archive.find("missing.txt").unwrap().is_none());
}

// =============================================================================
// Single-entry extraction
// =============================================================================

#[test]
fn test_extract_stored_is_pinned_to_unpacked_size() {
    let archive = open_sample();
    let entry = archive.entry(0).unwrap().unwrap();
    // The slot holds 24 bytes but only 15 belong to the entry.
    assert_eq!(archive.extract_entry_to_vec(&entry).unwrap(), b"fps=30\nvsync=1\n");
}

#[test]
fn test_extract_compressed_inflates() {
    let archive = open_sample();
    let entry = archive.find("texture/ui/panel.dds").unwrap().unwrap();
    let data = archive.extract_entry_to_vec(&entry).unwrap();
    assert_eq!(data, b"DDS panel pixels ".repeat(40));
    assert_eq!(data.len() as u64, entry.unpacked_size);
}

#[test]
fn test_extract_exempt_extension_is_raw() {
    let archive = open_sample();
    let entry = archive.find("script/ui/main.lua").unwrap().unwrap();
    assert_eq!(entry.kind, PayloadKind::Compressed);
    assert_eq!(archive.extract_entry_to_vec(&entry).unwrap(), b"print('hi')");
}

#[test]
fn test_exempt_extension_is_case_insensitive() {
    let bytes = build_archive(&[FixtureEntry::flagged(
        "fx/WATER.FX",
        FLAG_COMPRESSED,
        b"float4 main()",
    )]);
    let archive = Archive::open(Cursor::new(bytes)).unwrap();
    let entry = archive.entry(0).unwrap().unwrap();
    assert_eq!(archive.extract_entry_to_vec(&entry).unwrap(), b"float4 main()");
}

#[test]
fn test_extract_encrypted_is_raw() {
    let archive = open_sample();
    let entry = archive.entry(3).unwrap().unwrap();
    assert_eq!(
        archive.extract_entry_to_vec(&entry).unwrap(),
        [0xDE, 0xAD, 0xBE, 0xEF, 0x01]
    );
}

#[test]
fn test_extract_entry_to_path() {
    let archive = open_sample();
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("nested/out.ini");
    let entry = archive.entry(0).unwrap().unwrap();
    let n = archive.extract_entry_to_path(&entry, &target).unwrap();
    assert_eq!(n, 15);
    assert_eq!(std::fs::read(target).unwrap(), b"fps=30\nvsync=1\n");
}

#[test]
fn test_open_path() {
    let (_dir, path) = write_temp_archive(&build_archive(&sample_entries()));
    let archive = Archive::open_path(&path).unwrap();
    assert!(!archive.is_writable());
    assert_eq!(archive.path(), Some(std::fs::canonicalize(&path).unwrap().as_path()));
    let entry = archive.find("secret/keys.bin").unwrap().unwrap();
    assert_eq!(archive.extract_entry_to_vec(&entry).unwrap().len(), 5);
}

#[test]
fn test_borrowed_source_outlives_archive() {
    let mut cursor = Cursor::new(build_archive(&sample_entries()));
    {
        let archive = Archive::open(&mut cursor).unwrap();
        assert_eq!(archive.len(), 4);
    }
    // The cursor is still usable after the archive is gone.
    cursor.seek(SeekFrom::Start(0)).unwrap();
    let mut sig = [0u8; 100];
    cursor.read_exact(&mut sig).unwrap();
    assert_eq!(sig, common::SIGNATURE);
}

// =============================================================================
// Sequential reader
// =============================================================================

#[test]
fn test_sequential_reader_walks_all_entries() {
    let archive = open_sample();
    let mut reader = archive.reader().unwrap();
    assert!(reader.entry().is_none());
    assert_eq!(reader.remaining(), 4);

    let mut seen = Vec::new();
    while reader.move_next().unwrap() {
        let mut stream = reader.entry_stream().unwrap();
        let mut data = Vec::new();
        stream.read_to_end(&mut data).unwrap();
        seen.push((stream.entry().name.clone(), data.len()));
    }
    assert_eq!(
        seen,
        [
            ("data\\config.ini".to_string(), 15),
            ("texture\\ui\\panel.dds".to_string(), 17 * 40),
            ("script\\ui\\main.lua".to_string(), 11),
            ("secret/keys.bin".to_string(), 5),
        ]
    );
    assert!(reader.entry().is_none());
    assert!(!reader.move_next().unwrap());
}

#[test]
fn test_sequential_reader_uses_cache_when_present() {
    let archive = open_sample();
    let cached = archive.entries().unwrap();
    let mut reader = archive.reader().unwrap();
    let mut index = 0;
    while reader.move_next().unwrap() {
        assert_eq!(reader.entry(), Some(&cached[index]));
        index += 1;
    }
    assert_eq!(index, cached.len());
}

#[test]
fn test_partial_stream_then_move_next() {
    let archive = open_sample();
    let mut reader = archive.reader().unwrap();
    reader.move_next().unwrap();
    {
        let mut stream = reader.entry_stream().unwrap();
        let mut head = [0u8; 3];
        stream.read_exact(&mut head).unwrap();
        assert_eq!(&head, b"fps");
    }
    reader.move_next().unwrap();
    let mut out = Vec::new();
    reader.write_entry_to(&mut out).unwrap();
    assert_eq!(out, b"DDS panel pixels ".repeat(40));
}

#[test]
fn test_entry_stream_before_move_next() {
    let archive = open_sample();
    let mut reader = archive.reader().unwrap();
    assert!(matches!(
        reader.entry_stream(),
        Err(Error::EntryNotFound { .. })
    ));
}

#[test]
fn test_second_reader_is_rejected_until_first_is_dropped() {
    let archive = open_sample();
    let reader = archive.reader().unwrap();
    assert!(matches!(
        archive.reader(),
        Err(Error::AlreadyOpen { holder: "reader" })
    ));
    assert!(matches!(
        archive.editor(),
        Err(Error::AlreadyOpen { holder: "reader" })
    ));
    drop(reader);
    let reader = archive.reader().unwrap();
    reader.close();
    assert!(archive.editor().is_ok());
}

#[test]
fn test_reader_after_archive_close_is_disposed() {
    let archive = open_sample();
    let mut reader = archive.reader().unwrap();
    assert!(reader.move_next().unwrap());
    archive.close();

    let err = reader.move_next().unwrap_err();
    assert!(matches!(err, Error::Disposed { what: "reader" }));
    assert!(err.is_lifecycle_error());
    assert!(matches!(
        reader.entry_stream(),
        Err(Error::Disposed { .. })
    ));
}

// =============================================================================
// Folder extraction
// =============================================================================

#[test]
fn test_extract_all() {
    let archive = open_sample();
    let dir = tempfile::tempdir().unwrap();
    let mut progress = StatisticsProgress::new();

    let result = archive.extract_all(dir.path(), &mut progress).unwrap();
    assert!(result.is_complete());
    assert_eq!(result.entries_extracted, 4);
    assert_eq!(result.bytes_extracted, 15 + 17 * 40 + 11 + 5);

    assert_eq!(
        std::fs::read(dir.path().join("data/config.ini")).unwrap(),
        b"fps=30\nvsync=1\n"
    );
    assert_eq!(
        std::fs::read(dir.path().join("script/ui/main.lua")).unwrap(),
        b"print('hi')"
    );
    assert!(dir.path().join("texture/ui/panel.dds").is_file());
    assert!(dir.path().join("secret/keys.bin").is_file());

    assert_eq!(progress.entries_total, 4);
    assert_eq!(progress.entries_processed, 4);
    assert_eq!(progress.percent(), 100);

    // The reader slot is free again.
    assert!(archive.reader().is_ok());
}

#[test]
fn test_extract_all_skips_unsafe_names() {
    let bytes = build_archive(&[
        FixtureEntry::stored("ok.txt", b"fine"),
        FixtureEntry::stored("..\\..\\evil.txt", b"nope"),
        FixtureEntry::stored("", b"nameless"),
    ]);
    let archive = Archive::open(Cursor::new(bytes)).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("out");

    let mut progress = StatisticsProgress::new();
    let result = archive.extract_all(&root, &mut progress).unwrap();
    assert_eq!(result.entries_extracted, 1);
    assert_eq!(result.entries_skipped, 2);
    assert!(!result.is_complete());
    assert_eq!(result.skipped[0].0, "..\\..\\evil.txt");
    assert_eq!(progress.warnings.len(), 2);

    assert_eq!(std::fs::read(root.join("ok.txt")).unwrap(), b"fine");
    assert!(!dir.path().join("evil.txt").exists());
}

#[test]
fn test_extract_all_empty_archive_reports_done() {
    let archive = Archive::open(Cursor::new(build_archive(&[]))).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let mut percents = Vec::new();
    let result = archive
        .extract_all(dir.path(), cmfkit::progress_fn(|p| percents.push(p)))
        .unwrap();
    assert_eq!(result.entries_extracted, 0);
    assert_eq!(percents, [100]);
}

#[test]
fn test_extract_all_while_editor_alive() {
    let archive = open_sample();
    let _editor = archive.editor().unwrap();
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        archive.extract_all(dir.path(), ()),
        Err(Error::AlreadyOpen { holder: "editor" })
    ));
}

// =============================================================================
// Bounded windows
// =============================================================================

#[test]
fn test_window_clamps_reads_and_rejects_far_seeks() {
    let data: Vec<u8> = (0..=255).collect();
    let mut window = BoundedWindow::new(Cursor::new(data), 100, 10);

    window.seek(SeekFrom::Start(5)).unwrap();
    let mut buf = [0u8; 20];
    assert_eq!(window.read(&mut buf).unwrap(), 5);
    assert_eq!(&buf[..5], &[105, 106, 107, 108, 109]);
    assert_eq!(window.read(&mut buf).unwrap(), 0);

    let err = window.seek(SeekFrom::Start(11)).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    assert!(matches!(
        window.set_position(11),
        Err(Error::OutOfRange {
            position: 11,
            length: 10
        })
    ));
    // Seeking to the very end is allowed.
    assert_eq!(window.seek(SeekFrom::End(0)).unwrap(), 10);
}

#[test]
fn test_trailing_bytes_are_ignored_by_reads() {
    let bytes = build_archive_with_trailer(&sample_entries(), b"TRAILER");
    let archive = Archive::open(Cursor::new(bytes)).unwrap();
    let entry = archive.entry(3).unwrap().unwrap();
    assert_eq!(archive.extract_entry_to_vec(&entry).unwrap().len(), 5);
}
