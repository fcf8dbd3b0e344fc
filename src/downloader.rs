//! Orchestrates a full run: plan, fetch every segment concurrently,
//! aggregate, and wait for the progress reporter to catch up.
use crate::error::{DownloadError, Result};
use crate::merge::aggregate_parts;
use crate::observer::ProgressObserver;
use crate::progress::{ProgressCounter, REPORT_INTERVAL, Reporter, spawn_reporter};
use crate::state::DownloadSpec;
use crate::utils::plan_segments;
use crate::worker::{SegmentOutcome, download_segment};
use futures_util::future::join_all;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Stages of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Planning,
    Fetching,
    Aggregating,
    Done,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Planning => "planning",
            Phase::Fetching => "fetching",
            Phase::Aggregating => "aggregating",
            Phase::Done => "done",
            Phase::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    pub path: PathBuf,
    pub bytes: u64,
    pub segments: usize,
    /// Bytes recovered from part files of an earlier run.
    pub resumed_bytes: u64,
    pub elapsed: Duration,
}

/// Runs the segmented download described by `spec`.
pub struct Downloader {
    client: reqwest::Client,
    observer: Arc<dyn ProgressObserver>,
    report_interval: Duration,
}

impl Downloader {
    pub fn new(client: reqwest::Client, observer: Arc<dyn ProgressObserver>) -> Self {
        Self {
            client,
            observer,
            report_interval: REPORT_INTERVAL,
        }
    }

    pub fn with_report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = interval;
        self
    }

    /// Downloads the resource to `spec.target_path`.
    ///
    /// Every segment task is joined before the outcome is decided. If any
    /// segment fails, the lowest failing index is reported and aggregation
    /// is skipped, leaving the part files on disk for the next run.
    pub async fn run(&self, spec: &DownloadSpec) -> Result<DownloadReport> {
        let started = Instant::now();
        self.enter(Phase::Planning);

        let segments = plan_segments(spec);
        info!(
            url = %spec.url,
            total = spec.total_size,
            segments = segments.len(),
            "planned download"
        );

        let counter = Arc::new(ProgressCounter::new());
        let reporter = spawn_reporter(
            counter.clone(),
            spec.total_size,
            self.observer.clone(),
            self.report_interval,
        );

        self.enter(Phase::Fetching);
        let mut tasks = Vec::with_capacity(segments.len());
        for segment in segments.iter().cloned() {
            let client = self.client.clone();
            let url = spec.url.clone();
            let counter = counter.clone();
            let can_resume = segment.ranged || spec.range_supported;

            tasks.push(tokio::spawn(async move {
                download_segment(&client, &url, &segment, can_resume, &counter)
                    .await
                    .map_err(|e| DownloadError::Segment {
                        index: segment.index,
                        source: Box::new(e),
                    })
            }));
        }

        let results = join_all(tasks).await;
        let mut outcomes: Vec<SegmentOutcome> = Vec::with_capacity(results.len());
        let mut failure = None;

        for (index, result) in results.into_iter().enumerate() {
            let outcome = result
                .map_err(|source| DownloadError::Task { index, source })
                .and_then(|r| r);
            match outcome {
                Ok(o) => outcomes.push(o),
                Err(e) => {
                    error!(index, error = %e, "segment failed");
                    if failure.is_none() {
                        failure = Some(e);
                    }
                }
            }
        }

        if let Some(e) = failure {
            return Err(self.fail(reporter, e));
        }

        if segments.len() > 1 {
            self.enter(Phase::Aggregating);
            if let Err(e) = aggregate_parts(&spec.target_path, &segments).await {
                let e = DownloadError::Aggregate {
                    source: Box::new(e),
                };
                return Err(self.fail(reporter, e));
            }
        }

        reporter.wait().await;
        self.enter(Phase::Done);

        let report = DownloadReport {
            path: spec.target_path.clone(),
            bytes: spec.total_size,
            segments: segments.len(),
            resumed_bytes: outcomes.iter().map(|o| o.resumed).sum(),
            elapsed: started.elapsed(),
        };
        info!(?report, "download finished");
        Ok(report)
    }

    fn enter(&self, phase: Phase) {
        info!(%phase, "phase");
    }

    fn fail(&self, reporter: Reporter, e: DownloadError) -> DownloadError {
        reporter.abort();
        self.enter(Phase::Failed);
        self.observer.message(format!("failed: {e}"));
        e
    }
}
