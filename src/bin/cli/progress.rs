//! Progress bar implementation for CLI operations.

use cmfkit::progress::ProgressReporter;
use indicatif::{ProgressBar, ProgressStyle};

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} entries {wide_msg}";

/// Overall progress bar for folder extraction
pub struct CliProgress {
    overall: ProgressBar,
    quiet: bool,
}

impl CliProgress {
    /// Creates a new progress display
    pub fn new(quiet: bool) -> Self {
        let overall = if quiet {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new(0);
            if let Ok(style) = ProgressStyle::default_bar().template(BAR_TEMPLATE) {
                pb.set_style(style.progress_chars("#>-"));
            }
            pb
        };

        Self { overall, quiet }
    }

    /// Finishes the progress display
    pub fn finish(&self) {
        self.overall.finish_and_clear();
    }

    /// Finishes with a custom message
    pub fn finish_with_message(&self, msg: impl Into<String>) {
        self.overall.abandon_with_message(msg.into());
    }
}

impl ProgressReporter for CliProgress {
    fn on_total(&mut self, entries: usize) {
        self.overall.set_length(entries as u64);
    }

    fn on_entry_start(&mut self, entry_name: &str, _entry_size: u64) {
        if self.quiet {
            return;
        }
        // Keep the tail of long names
        let display_name = match entry_name.char_indices().rev().nth(39) {
            Some((cut, _)) => format!("...{}", &entry_name[cut..]),
            None => entry_name.to_string(),
        };
        self.overall.set_message(display_name);
    }

    fn on_entry_complete(&mut self, _entry_name: &str, _success: bool) {
        self.overall.inc(1);
    }

    fn on_warning(&mut self, message: &str) {
        if !self.quiet {
            self.overall.println(format!("warning: {}", message));
        }
    }
}
