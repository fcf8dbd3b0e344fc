//! # splitget
//!
//! `splitget` fetches a single HTTP resource as several concurrent byte-range
//! segments and joins them into one file.
//!
//! - Segments are planned so they exactly cover the resource.
//! - Each segment is written to `<target>.part<index>`. Part files left by an
//!   interrupted run are resumed from their current length.
//! - A shared atomic counter feeds a progress reporter.
//! - Parts are merged strictly in index order once every segment is done.
//!
//! ## Example Usage
//!
//! ```no_run
//! use splitget::{ConsoleObserver, DownloadSpec, Downloader, probe_resource};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), splitget::DownloadError> {
//! let client = reqwest::Client::new();
//! let info = probe_resource("https://example.com/big.iso", &client).await?;
//! let spec = DownloadSpec::new(
//!     info.url,
//!     info.total_size,
//!     info.range_supported,
//!     info.filename,
//!     8,
//! );
//! let observer = Arc::new(ConsoleObserver::new("big.iso", spec.total_size));
//! Downloader::new(client, observer).run(&spec).await?;
//! # Ok(())
//! # }
//! ```

pub mod args;
pub mod config;
pub mod downloader;
pub mod error;
pub mod merge;
pub mod observer;
pub mod probe;
pub mod progress;
pub mod resume;
pub mod state;
pub mod utils;
pub mod worker;

pub use args::Args;
pub use downloader::{DownloadReport, Downloader, Phase};
pub use error::DownloadError;
pub use observer::{ConsoleObserver, ProgressObserver, ProgressSnapshot};
pub use probe::{ResourceInfo, probe_resource};
pub use progress::ProgressCounter;
pub use state::{DownloadSpec, Segment};
pub use worker::{RangeRequest, download_segment, fetch_range};
