//! Output formatting for CLI operations.

use cmfkit::progress::format_bytes_iec;
use cmfkit::{EditResult, Entry, ExtractResult};
use serde_json::json;

/// Archive-level figures shown by `info`.
pub struct ArchiveSummary {
    pub entry_count: usize,
    pub stored: usize,
    pub compressed: usize,
    pub opaque: usize,
    pub truncated: usize,
    pub unpacked_size: u64,
    pub compressed_size: u64,
    pub payload_offset: u64,
    pub archive_size: u64,
    pub writable: bool,
}

/// What `replace` did.
pub struct ReplaceSummary<'a> {
    pub entry: &'a Entry,
    pub target: String,
    pub result: &'a EditResult,
}

/// Trait for output formatting
pub trait OutputFormatter {
    /// Formats a list of entries
    fn format_list(&self, entries: &[Entry], technical: bool) -> String;

    /// Formats archive information
    fn format_info(&self, info: &ArchiveSummary) -> String;

    /// Formats extraction results
    fn format_extract_result(&self, result: &ExtractResult) -> String;

    /// Formats the outcome of a replacement
    fn format_replace_result(&self, summary: &ReplaceSummary<'_>) -> String;
}

/// Human-readable output formatter
pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn format_list(&self, entries: &[Entry], technical: bool) -> String {
        let mut output = String::new();

        if technical {
            output.push_str(&format!(
                "{:>6} {:>12} {:>12} {:>12} {:>10} {}\n",
                "Index", "Size", "Slot", "Offset", "Kind", "Name"
            ));
        } else {
            output.push_str(&format!("{:>12} {:>10} {}\n", "Size", "Kind", "Name"));
        }
        output.push_str(&"-".repeat(70));
        output.push('\n');

        let mut total_size: u64 = 0;
        for entry in entries {
            total_size += entry.unpacked_size;
            let kind = if entry.is_truncated() {
                "truncated"
            } else {
                entry.kind.as_str()
            };

            if technical {
                output.push_str(&format!(
                    "{:>6} {:>12} {:>12} {:>#12x} {:>10} {}\n",
                    entry.index,
                    entry.unpacked_size,
                    entry.compressed_size,
                    entry.data_offset,
                    kind,
                    entry.name
                ));
            } else {
                output.push_str(&format!(
                    "{:>12} {:>10} {}\n",
                    format_bytes_iec(entry.unpacked_size),
                    kind,
                    entry.name
                ));
            }
        }

        output.push_str(&"-".repeat(70));
        output.push('\n');
        output.push_str(&format!(
            "{} entries, {} total\n",
            entries.len(),
            format_bytes_iec(total_size)
        ));

        output
    }

    fn format_info(&self, info: &ArchiveSummary) -> String {
        let mut output = String::new();

        output.push_str("Archive Information:\n");
        output.push_str(&"-".repeat(40));
        output.push('\n');
        output.push_str(&format!("  Entries:        {}\n", info.entry_count));
        output.push_str(&format!("  Stored:         {}\n", info.stored));
        output.push_str(&format!("  Compressed:     {}\n", info.compressed));
        output.push_str(&format!("  Opaque:         {}\n", info.opaque));
        if info.truncated > 0 {
            output.push_str(&format!("  Truncated:      {}\n", info.truncated));
        }
        output.push_str(&format!(
            "  Unpacked size:  {}\n",
            format_bytes_iec(info.unpacked_size)
        ));
        output.push_str(&format!(
            "  Slot size:      {}\n",
            format_bytes_iec(info.compressed_size)
        ));
        output.push_str(&format!("  Payload offset: {:#x}\n", info.payload_offset));
        output.push_str(&format!(
            "  Archive size:   {}\n",
            format_bytes_iec(info.archive_size)
        ));
        output.push_str(&format!(
            "  Writable:       {}\n",
            if info.writable { "Yes" } else { "No" }
        ));

        output
    }

    fn format_extract_result(&self, result: &ExtractResult) -> String {
        let mut output = format!(
            "Extracted {} entries ({})\n",
            result.entries_extracted,
            format_bytes_iec(result.bytes_extracted)
        );

        if !result.is_complete() {
            output.push_str(&format!("Skipped {} entries:\n", result.entries_skipped));
            for (name, reason) in &result.skipped {
                output.push_str(&format!("  {}: {}\n", name, reason));
            }
        }

        output
    }

    fn format_replace_result(&self, summary: &ReplaceSummary<'_>) -> String {
        format!(
            "Replaced '{}' in {}: {} of {} slot bytes used ({} padding)\n",
            summary.entry.name,
            summary.target,
            summary.result.bytes_written,
            summary.result.slot_bytes(),
            summary.result.padding_bytes
        )
    }
}

/// JSON output formatter
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format_list(&self, entries: &[Entry], _technical: bool) -> String {
        let items: Vec<_> = entries
            .iter()
            .map(|e| {
                json!({
                    "index": e.index,
                    "name": e.name,
                    "unpacked_size": e.unpacked_size,
                    "compressed_size": e.compressed_size,
                    "data_offset": e.data_offset,
                    "kind": e.kind.as_str(),
                    "codec": e.codec().to_string(),
                    "truncated": e.is_truncated(),
                })
            })
            .collect();

        serde_json::to_string_pretty(&items).unwrap_or_else(|_| "[]".to_string())
    }

    fn format_info(&self, info: &ArchiveSummary) -> String {
        let obj = json!({
            "entry_count": info.entry_count,
            "stored": info.stored,
            "compressed": info.compressed,
            "opaque": info.opaque,
            "truncated": info.truncated,
            "unpacked_size": info.unpacked_size,
            "compressed_size": info.compressed_size,
            "payload_offset": info.payload_offset,
            "archive_size": info.archive_size,
            "writable": info.writable,
        });

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_extract_result(&self, result: &ExtractResult) -> String {
        let obj = json!({
            "success": result.is_complete(),
            "entries_extracted": result.entries_extracted,
            "entries_skipped": result.entries_skipped,
            "bytes_extracted": result.bytes_extracted,
            "skipped": result.skipped.iter().map(|(p, r)| json!({"name": p, "reason": r})).collect::<Vec<_>>(),
        });

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_replace_result(&self, summary: &ReplaceSummary<'_>) -> String {
        let obj = json!({
            "entry": summary.entry.name,
            "index": summary.entry.index,
            "target": summary.target,
            "slot_size": summary.entry.compressed_size,
            "bytes_written": summary.result.bytes_written,
            "padding_bytes": summary.result.padding_bytes,
            "rewritten_bytes": summary.result.slot_bytes(),
            "entries_copied": summary.result.entries_copied,
        });

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Creates the appropriate formatter based on output format
pub fn create_formatter(format: super::OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        super::OutputFormat::Human => Box::new(HumanFormatter),
        super::OutputFormat::Json => Box::new(JsonFormatter),
    }
}
