//! Fuzz target for Archive::open with arbitrary byte input.
//!
//! Exercises header and table parsing, the sequential walk and payload
//! decoding on malformed or adversarial input, looking for panics, hangs
//! or runaway allocations.
//!
//! Run with: cargo +nightly fuzz run archive_open

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::{Cursor, Read};

fuzz_target!(|data: &[u8]| {
    let Ok(archive) = cmfkit::Archive::open(Cursor::new(data)) else {
        return;
    };

    if let Ok(entries) = archive.entries() {
        for entry in entries.iter().take(64) {
            let _ = entry.codec();
            let _ = cmfkit::ArchivePath::for_entry(&entry.name, entry.index);
            let _ = archive.extract_entry(entry, &mut std::io::sink());
        }
    }

    if let Ok(mut reader) = archive.reader() {
        let mut buf = [0u8; 256];
        while let Ok(true) = reader.move_next() {
            if let Ok(mut stream) = reader.entry_stream() {
                let _ = stream.read(&mut buf);
            }
        }
    }

    if let Ok(mut editor) = archive.editor() {
        let _ = editor.write_to(&mut std::io::sink());
    }
});
