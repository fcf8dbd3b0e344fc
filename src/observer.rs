//! Progress presentation.
//!
//! The reporter in [`crate::progress`] samples the shared counter and pushes
//! snapshots through a [`ProgressObserver`]. The console implementation
//! renders them with `indicatif`. Tests use a hidden bar.
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};

/// A point-in-time view of the transfer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    /// Bytes written so far, including bytes credited from resumed parts.
    pub written: u64,
    /// Size of the resource.
    pub total: u64,
    /// Instantaneous throughput since the previous sample.
    pub bytes_per_sec: f64,
}

impl ProgressSnapshot {
    /// Completion percentage in `0.0..=100.0`. An empty resource is complete
    /// as soon as it is observed.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.written as f64 / self.total as f64 * 100.0).min(100.0)
    }

    /// Human readable speed, e.g. `1.50 MiB/s`.
    pub fn speed(&self) -> String {
        format!("{}/s", HumanBytes(self.bytes_per_sec.max(0.0) as u64))
    }
}

pub trait ProgressObserver: Send + Sync {
    fn update(&self, snapshot: ProgressSnapshot);
    fn message(&self, msg: String);
    fn finish(&self);
}

/// Renders progress to the terminal.
pub struct ConsoleObserver {
    pub pb: ProgressBar,
}

impl ConsoleObserver {
    /// Creates a styled bar labelled with `name`.
    pub fn new(name: &str, total: u64) -> Self {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::with_template(
            "{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%) {prefix}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-");
        pb.set_style(style);
        pb.set_message(name.to_string());
        Self { pb }
    }

    /// A bar that never draws.
    pub fn hidden() -> Self {
        Self {
            pb: ProgressBar::hidden(),
        }
    }
}

impl ProgressObserver for ConsoleObserver {
    fn update(&self, snapshot: ProgressSnapshot) {
        self.pb.set_length(snapshot.total);
        self.pb.set_position(snapshot.written.min(snapshot.total));
        self.pb.set_prefix(snapshot.speed());
    }

    fn message(&self, msg: String) {
        self.pb.set_message(msg);
    }

    fn finish(&self) {
        self.pb.finish();
    }
}
