//! Command implementations for the CLI tool.

use std::fs::File;
use std::path::Path;

use cmfkit::{Archive, EditOptions, EditResult, Editor, Entry, EntryRef, Error, PayloadKind};

use crate::OutputFormat;
use crate::exit_codes::{ExitCode, error_to_exit_code};
use crate::output::{ArchiveSummary, ReplaceSummary, create_formatter};
use crate::progress::CliProgress;

/// Configuration for the replace command.
pub struct ReplaceConfig<'a> {
    pub archive_path: &'a Path,
    pub entry: &'a str,
    pub file: &'a Path,
    pub output: Option<&'a Path>,
    pub level: u32,
    pub format: OutputFormat,
}

/// Extract command implementation
pub fn extract(archive_path: &Path, output_dir: &Path, format: OutputFormat, quiet: bool) -> ExitCode {
    let formatter = create_formatter(format);

    let archive = match open_archive(archive_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let mut progress = CliProgress::new(quiet);
    let result = match archive.extract_all(output_dir, &mut progress) {
        Ok(r) => r,
        Err(e) => {
            progress.finish_with_message("Failed");
            eprintln!("Error: {}", e);
            return error_to_exit_code(&e);
        }
    };

    progress.finish();
    print!("{}", formatter.format_extract_result(&result));

    if result.is_complete() {
        ExitCode::Success
    } else {
        ExitCode::Warning
    }
}

/// List command implementation
pub fn list(archive_path: &Path, technical: bool, format: OutputFormat) -> ExitCode {
    let formatter = create_formatter(format);

    let archive = match open_archive(archive_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    match archive.entries() {
        Ok(entries) => {
            print!("{}", formatter.format_list(&entries, technical));
            ExitCode::Success
        }
        Err(e) => report(&e),
    }
}

/// Info command implementation
pub fn info(archive_path: &Path, format: OutputFormat) -> ExitCode {
    let formatter = create_formatter(format);

    let archive = match open_archive(archive_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let entries = match archive.entries() {
        Ok(entries) => entries,
        Err(e) => return report(&e),
    };

    let count_kind = |kind: PayloadKind| {
        entries
            .iter()
            .filter(|e| !e.is_truncated() && e.kind == kind)
            .count()
    };
    let totals = archive
        .total_unpacked_size()
        .and_then(|unpacked| Ok((unpacked, archive.total_compressed_size()?)));
    let (unpacked_size, compressed_size) = match totals {
        Ok(totals) => totals,
        Err(e) => return report(&e),
    };
    let summary = ArchiveSummary {
        entry_count: archive.len(),
        stored: count_kind(PayloadKind::Stored),
        compressed: count_kind(PayloadKind::Compressed),
        opaque: count_kind(PayloadKind::Opaque),
        truncated: entries.iter().filter(|e| e.is_truncated()).count(),
        unpacked_size,
        compressed_size,
        payload_offset: archive.header().payload_offset(),
        archive_size: archive.source_len(),
        writable: archive.is_writable(),
    };

    print!("{}", formatter.format_info(&summary));
    ExitCode::Success
}

/// Replace command implementation
pub fn replace(config: &ReplaceConfig<'_>) -> ExitCode {
    let formatter = create_formatter(config.format);

    let options = match EditOptions::new().level(config.level) {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::BadArgs;
        }
    };

    let in_place = match config.output {
        Some(out) => same_file(out, config.archive_path),
        None => true,
    };
    let opened = if in_place {
        Archive::open_path_read_write(config.archive_path)
    } else {
        Archive::open_path(config.archive_path)
    };
    let archive = match opened {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error opening archive: {}", e);
            return error_to_exit_code(&e);
        }
    };

    let mut editor = match archive.editor_with(options) {
        Ok(editor) => editor,
        Err(e) => return report(&e),
    };

    let entry = match select_entry(&editor, config.entry) {
        Some(entry) => entry,
        None => {
            return report(&Error::EntryNotFound {
                path: config.entry.to_string(),
            });
        }
    };

    let result = stage_and_write(&mut editor, &entry, config);
    let (target, result) = match result {
        Ok(r) => r,
        Err(e) => return report(&e),
    };

    let summary = ReplaceSummary {
        entry: &entry,
        target,
        result: &result,
    };
    print!("{}", formatter.format_replace_result(&summary));
    ExitCode::Success
}

fn stage_and_write(
    editor: &mut Editor<File>,
    entry: &Entry,
    config: &ReplaceConfig<'_>,
) -> cmfkit::Result<(String, EditResult)> {
    editor.stage_file(entry, config.file)?;
    match config.output {
        Some(out) => Ok((out.display().to_string(), editor.write_to_path(out)?)),
        None => Ok((config.archive_path.display().to_string(), editor.save()?)),
    }
}

/// Returns true if both paths name the same existing file.
fn same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Resolves `selector` as an entry path, falling back to a table index.
fn select_entry(editor: &Editor<File>, selector: &str) -> Option<Entry> {
    editor
        .resolve(EntryRef::Path(selector))
        .or_else(|| editor.resolve(selector.parse::<usize>().ok()?))
        .cloned()
}

/// Helper to open an archive read-only
fn open_archive(path: &Path) -> Result<Archive<File>, ExitCode> {
    Archive::open_path(path).map_err(|e| {
        eprintln!("Error opening archive: {}", e);
        error_to_exit_code(&e)
    })
}

fn report(error: &Error) -> ExitCode {
    eprintln!("Error: {}", error);
    error_to_exit_code(error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmfkit::format::{ENTRY_KEY_1, ENTRY_KEY_2, ENTRY_KEY_3, NAME_FIELD_SIZE, SIGNATURE_SIZE};

    fn encode_word(plain: [u8; 4], key: u32) -> [u8; 4] {
        let [c0, c1, c2, c3] = (u32::from_le_bytes(plain) ^ key).to_be_bytes();
        [c0, c2, c1, c3]
    }

    /// One stored entry `a.txt` holding `abcd` in an 8-byte slot.
    fn single_entry_archive() -> Vec<u8> {
        let keys = [ENTRY_KEY_1, ENTRY_KEY_2, ENTRY_KEY_3];
        let mut record: Vec<u8> = "a.txt".encode_utf16().flat_map(u16::to_le_bytes).collect();
        record.resize(NAME_FIELD_SIZE, 0);
        for field in [4i32, 8, 0, 0] {
            record.extend_from_slice(&field.to_le_bytes());
        }
        for (i, word) in record.chunks_exact_mut(4).enumerate() {
            let encoded = encode_word([word[0], word[1], word[2], word[3]], keys[i % 3]);
            word.copy_from_slice(&encoded);
        }

        let mut data = vec![0u8; SIGNATURE_SIZE];
        data.extend_from_slice(&encode_word(1u32.to_le_bytes(), ENTRY_KEY_1));
        data.extend_from_slice(&record);
        data.extend_from_slice(b"abcd\0\0\0\0");
        data
    }

    #[test]
    fn test_same_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.cmf");
        std::fs::write(&path, b"x").unwrap();
        assert!(same_file(&path, &dir.path().join(".").join("data.cmf")));
        assert!(!same_file(&path, &dir.path().join("missing.cmf")));
    }

    #[test]
    fn test_replace_with_output_equal_to_archive_saves_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("data.cmf");
        let replacement = dir.path().join("new.txt");
        let original = single_entry_archive();
        std::fs::write(&archive_path, &original).unwrap();
        std::fs::write(&replacement, b"XY").unwrap();

        let config = ReplaceConfig {
            archive_path: &archive_path,
            entry: "a.txt",
            file: &replacement,
            output: Some(&archive_path),
            level: 6,
            format: OutputFormat::Json,
        };
        assert_eq!(replace(&config), ExitCode::Success);

        let patched = std::fs::read(&archive_path).unwrap();
        assert_eq!(patched.len(), original.len());
        assert_eq!(&patched[patched.len() - 8..], b"XY\0\0\0\0\0\0");
    }

    #[test]
    fn test_replace_to_other_output_leaves_archive() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("data.cmf");
        let output = dir.path().join("patched.cmf");
        let replacement = dir.path().join("new.txt");
        let original = single_entry_archive();
        std::fs::write(&archive_path, &original).unwrap();
        std::fs::write(&replacement, b"XY").unwrap();

        let config = ReplaceConfig {
            archive_path: &archive_path,
            entry: "0",
            file: &replacement,
            output: Some(&output),
            level: 6,
            format: OutputFormat::Json,
        };
        assert_eq!(replace(&config), ExitCode::Success);

        assert_eq!(std::fs::read(&archive_path).unwrap(), original);
        let patched = std::fs::read(&output).unwrap();
        assert_eq!(&patched[patched.len() - 8..], b"XY\0\0\0\0\0\0");
    }
}
