//! Progress bar utilities for CLI output
//!
//! The hashing pipeline reports running counters through a callback on the
//! aggregating thread; `HashProgress` turns those into an indicatif bar (when
//! the input size is known) or a spinner (directory walks).

use crate::pipeline::PipelineProgress;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::time::{Duration, Instant};

// ============================================================================
// Styles
// ============================================================================

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {pos} hashed {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⣾⣽⣻⢿⡿⣟⣯⣷")
}

fn progress_bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("  {spinner:.green} [{bar:40.cyan/dim}] {pos}/{len} ({percent}%) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━━╾─")
}

fn completed_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("  ✓ [{bar:40.green/dim}] {pos}/{len} ({percent}%) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━━━")
}

// ============================================================================
// Console output helpers
// ============================================================================

/// Print a header section with a box
pub fn print_header(title: &str) {
    let width = 68;
    let title_padded = format!("{:^width$}", title, width = width - 4);
    println!();
    println!("╔{}╗", "═".repeat(width - 2));
    println!("║{}║", title_padded);
    println!("╚{}╝", "═".repeat(width - 2));
    println!();
}

/// Print a success message with checkmark
pub fn print_success(msg: &str) {
    println!("  ✓ {}", msg);
}

/// Print an info message with bullet
pub fn print_info(msg: &str) {
    println!("  • {}", msg);
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("  ⚠ {}", msg);
}

// ============================================================================
// Pipeline progress
// ============================================================================

/// Progress display for one pipeline run
pub struct HashProgress {
    bar: ProgressBar,
    start_time: Instant,
    bounded: bool,
}

impl HashProgress {
    /// Bar for a run of `total` files, or a spinner when `total` is unknown
    pub fn new(total: Option<u64>) -> Self {
        let (bar, bounded) = match total {
            Some(total) => {
                let bar = ProgressBar::new(total);
                bar.set_style(progress_bar_style());
                (bar, true)
            }
            None => {
                let bar = ProgressBar::new_spinner();
                bar.set_style(spinner_style());
                (bar, false)
            }
        };
        bar.enable_steady_tick(Duration::from_millis(100));

        Self {
            bar,
            start_time: Instant::now(),
            bounded,
        }
    }

    /// A display that draws nothing
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            start_time: Instant::now(),
            bounded: false,
        }
    }

    /// Pipeline progress callback
    pub fn update(&self, progress: &PipelineProgress) {
        self.bar.set_position(progress.processed);
        if progress.failed > 0 {
            self.bar
                .set_message(format!("({} unreadable)", progress.failed));
        }
    }

    /// Finish the progress display
    pub fn finish(&self) {
        if self.bounded {
            self.bar.set_style(completed_style());
        }
        self.bar.finish_with_message(format!(
            "done in {}",
            format_duration(self.start_time.elapsed())
        ));
    }

    /// Finish with an error
    pub fn finish_with_error(&self, msg: &str) {
        self.bar.abandon_with_message(format!("✗ {}", msg));
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

// ============================================================================
// Utility functions
// ============================================================================

/// Format duration as human-readable string
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        format!("{}h {}m", hours, mins)
    } else if secs >= 60 {
        let mins = secs / 60;
        let secs = secs % 60;
        format!("{}m {}s", mins, secs)
    } else {
        format!("{:.1}s", duration.as_secs_f64())
    }
}

// ============================================================================
// Dual writer for file + console logging
// ============================================================================

/// A writer that writes to both console and file
///
/// Used for logging to both stderr and a log file simultaneously.
pub struct DualWriter {
    pub console: std::io::Stderr,
    pub file: std::fs::File,
}

impl Write for DualWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        // Console output is best-effort; the file is the record
        let _ = self.console.write_all(buf);
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let _ = self.console.flush();
        self.file.flush()
    }
}
