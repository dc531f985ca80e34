//! Progress reporting for folder extraction.
//!
//! [`Archive::extract_all`](crate::Archive::extract_all) reports every entry
//! it starts and finishes, plus an overall percentage after each one.
//!
//! # Example
//!
//! ```rust,ignore
//! use cmfkit::progress::progress_fn;
//!
//! archive.extract_all("./out", &mut progress_fn(|pct| println!("{pct}%")))?;
//! ```

/// IEC byte unit: 1 KiB = 1024 bytes.
pub const BYTES_KIB: u64 = 1024;
/// IEC byte unit: 1 MiB = 1024 KiB.
pub const BYTES_MIB: u64 = 1024 * BYTES_KIB;
/// IEC byte unit: 1 GiB = 1024 MiB.
pub const BYTES_GIB: u64 = 1024 * BYTES_MIB;

const BYTES_KB: f64 = 1024.0;
const BYTES_MB: f64 = BYTES_KB * 1024.0;
const BYTES_GB: f64 = BYTES_MB * 1024.0;

/// Progress reporting trait for extraction.
///
/// Every method has an empty default, so implementors only override what
/// they display.
pub trait ProgressReporter {
    /// Called once before the first entry with the number of table records.
    fn on_total(&mut self, entry_count: usize) {
        let _ = entry_count;
    }

    /// Called when starting to process an entry.
    fn on_entry_start(&mut self, entry_name: &str, size: u64) {
        let _ = (entry_name, size);
    }

    /// Called when an entry has been written, or skipped (`success == false`).
    fn on_entry_complete(&mut self, entry_name: &str, success: bool) {
        let _ = (entry_name, success);
    }

    /// Called after every entry with the overall completion, 0 to 100.
    fn on_percent(&mut self, percent: u8) {
        let _ = percent;
    }

    /// Called when an entry is skipped.
    fn on_warning(&mut self, message: &str) {
        let _ = message;
    }
}

impl ProgressReporter for () {}

impl<P: ProgressReporter + ?Sized> ProgressReporter for &mut P {
    fn on_total(&mut self, entry_count: usize) {
        (**self).on_total(entry_count);
    }

    fn on_entry_start(&mut self, entry_name: &str, size: u64) {
        (**self).on_entry_start(entry_name, size);
    }

    fn on_entry_complete(&mut self, entry_name: &str, success: bool) {
        (**self).on_entry_complete(entry_name, success);
    }

    fn on_percent(&mut self, percent: u8) {
        (**self).on_percent(percent);
    }

    fn on_warning(&mut self, message: &str) {
        (**self).on_warning(message);
    }
}

/// A progress reporter that does nothing (null object pattern).
#[derive(Debug, Default, Clone)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {}

/// A progress reporter that collects statistics.
#[derive(Debug, Default, Clone)]
pub struct StatisticsProgress {
    /// Number of table records.
    pub entries_total: usize,
    /// Entries finished so far, successful or not.
    pub entries_processed: usize,
    /// Entries that were skipped.
    pub entries_skipped: usize,
    /// Entry currently being written.
    pub current_entry: Option<String>,
    /// Every percentage reported, in order.
    pub percents: Vec<u8>,
    /// Warnings collected.
    pub warnings: Vec<String>,
}

impl StatisticsProgress {
    /// Creates a new statistics progress reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the last reported percentage.
    pub fn percent(&self) -> u8 {
        self.percents.last().copied().unwrap_or(0)
    }
}

impl ProgressReporter for StatisticsProgress {
    fn on_total(&mut self, entry_count: usize) {
        self.entries_total = entry_count;
    }

    fn on_entry_start(&mut self, entry_name: &str, _size: u64) {
        self.current_entry = Some(entry_name.to_string());
    }

    fn on_entry_complete(&mut self, _entry_name: &str, success: bool) {
        self.entries_processed += 1;
        if !success {
            self.entries_skipped += 1;
        }
        self.current_entry = None;
    }

    fn on_percent(&mut self, percent: u8) {
        self.percents.push(percent);
    }

    fn on_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }
}

/// A progress reporter that calls a closure with each percentage.
pub struct ClosureProgress<F> {
    callback: F,
}

impl<F: FnMut(u8)> ClosureProgress<F> {
    /// Creates a progress reporter from a closure.
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F: FnMut(u8)> ProgressReporter for ClosureProgress<F> {
    fn on_percent(&mut self, percent: u8) {
        (self.callback)(percent)
    }
}

/// Creates a closure-based progress reporter.
pub fn progress_fn<F: FnMut(u8)>(f: F) -> ClosureProgress<F> {
    ClosureProgress::new(f)
}

/// Percentage of `done` out of `total`, rounded down; 100 when `total` is 0.
pub(crate) fn percent_of(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) as u128 * 100) / total as u128) as u8
}

/// Formats bytes as a human-readable string using IEC units (KiB, MiB, GiB).
///
/// # Examples
///
/// ```rust
/// use cmfkit::progress::format_bytes_iec;
///
/// assert_eq!(format_bytes_iec(0), "0 B");
/// assert_eq!(format_bytes_iec(512), "512 B");
/// assert_eq!(format_bytes_iec(1024), "1.0 KiB");
/// assert_eq!(format_bytes_iec(1536), "1.5 KiB");
/// assert_eq!(format_bytes_iec(1048576), "1.0 MiB");
/// ```
pub fn format_bytes_iec(bytes: u64) -> String {
    let bytes_f64 = bytes as f64;
    if bytes_f64 < BYTES_KB {
        format!("{} B", bytes)
    } else if bytes_f64 < BYTES_MB {
        format!("{:.1} KiB", bytes_f64 / BYTES_KB)
    } else if bytes_f64 < BYTES_GB {
        format!("{:.1} MiB", bytes_f64 / BYTES_MB)
    } else {
        format!("{:.1} GiB", bytes_f64 / BYTES_GB)
    }
}
