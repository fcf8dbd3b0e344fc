//! Shared byte counter and the reporter task that samples it.
use crate::observer::{ProgressObserver, ProgressSnapshot};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;

/// Interval at which the reporter samples the counter.
pub const REPORT_INTERVAL: Duration = Duration::from_millis(100);

/// Cumulative count of bytes written by every fetch task.
///
/// Only atomics are used. Transferred and credited bytes are kept apart so
/// the speed sample never sees credited bytes. Writers only ever increment,
/// so readers always observe a non-decreasing total.
#[derive(Debug)]
pub struct ProgressCounter {
    transferred: AtomicU64,
    credited: AtomicU64,
    origin: Instant,
    last_sample_nanos: AtomicU64,
    last_sample_bytes: AtomicU64,
}

impl ProgressCounter {
    pub fn new() -> Self {
        Self {
            transferred: AtomicU64::new(0),
            credited: AtomicU64::new(0),
            origin: Instant::now(),
            last_sample_nanos: AtomicU64::new(0),
            last_sample_bytes: AtomicU64::new(0),
        }
    }

    /// Records `n` freshly transferred bytes.
    pub fn add(&self, n: u64) {
        self.transferred.fetch_add(n, Ordering::Relaxed);
    }

    /// Records `n` bytes recovered from disk. They count toward the total
    /// but not toward the transfer speed.
    pub fn credit(&self, n: u64) {
        self.credited.fetch_add(n, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.transferred.load(Ordering::Relaxed) + self.credited.load(Ordering::Relaxed)
    }

    /// Transferred bytes per second since the previous call, or since
    /// construction on the first call.
    pub fn speed(&self) -> f64 {
        let now = self.origin.elapsed().as_nanos() as u64;
        let transferred = self.transferred.load(Ordering::Relaxed);

        let prev_nanos = self.last_sample_nanos.swap(now, Ordering::Relaxed);
        let prev_bytes = self.last_sample_bytes.swap(transferred, Ordering::Relaxed);

        let elapsed = now.saturating_sub(prev_nanos);
        if elapsed == 0 {
            return 0.0;
        }
        transferred.saturating_sub(prev_bytes) as f64 / (elapsed as f64 / 1e9)
    }

    pub fn snapshot(&self, total: u64) -> ProgressSnapshot {
        let bytes_per_sec = self.speed();
        ProgressSnapshot {
            written: self.count(),
            total,
            bytes_per_sec,
        }
    }
}

impl Default for ProgressCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a running reporter.
pub struct Reporter {
    done: oneshot::Receiver<()>,
    handle: JoinHandle<()>,
}

impl Reporter {
    /// Waits until the reporter has observed the full size.
    pub async fn wait(self) {
        // A dropped sender means the task was aborted or panicked.
        let _ = self.done.await;
    }

    /// Stops the reporter without waiting for completion.
    pub fn abort(self) {
        self.handle.abort();
    }
}

/// Spawns the task that polls `counter` every `interval` and forwards
/// snapshots to `observer`. It finishes the observer and fires its
/// completion signal once `counter.count() >= total`.
pub fn spawn_reporter(
    counter: Arc<ProgressCounter>,
    total: u64,
    observer: Arc<dyn ProgressObserver>,
    interval: Duration,
) -> Reporter {
    let (tx, done) = oneshot::channel();

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let snapshot = counter.snapshot(total);
            observer.update(snapshot);

            if snapshot.written >= total {
                debug!(written = snapshot.written, total, "reporter reached total");
                observer.finish();
                let _ = tx.send(());
                return;
            }
        }
    });

    Reporter { done, handle }
}
