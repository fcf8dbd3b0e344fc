//! Download descriptors shared between the planner, the fetch tasks and the
//! aggregator.
//!
//! Nothing here is persisted. Resumption is inferred from the part files
//! left on disk by an earlier run, whose names are derived by [`part_path`].
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Default number of segments when the requested count is out of range.
pub const DEFAULT_SEGMENTS: usize = 8;

/// Upper bound on concurrent segments.
pub const MAX_SEGMENTS: usize = 16;

/// Resources at or below this size are always fetched as one stream.
pub const SEGMENT_THRESHOLD: u64 = 1024;

/// Everything the orchestrator needs to know about one run.
///
/// Built once from the prober's output and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSpec {
    /// The source URL of the resource.
    pub url: String,
    /// Size of the resource in bytes, as reported by `Content-Length`.
    pub total_size: u64,
    /// Whether the server advertised `Accept-Ranges: bytes`.
    pub range_supported: bool,
    /// Final location of the downloaded file.
    pub target_path: PathBuf,
    /// Requested segment count. The planner clamps it.
    pub segment_count: usize,
}

impl DownloadSpec {
    pub fn new(
        url: impl Into<String>,
        total_size: u64,
        range_supported: bool,
        target_path: impl Into<PathBuf>,
        segment_count: usize,
    ) -> Self {
        Self {
            url: url.into(),
            total_size,
            range_supported,
            target_path: target_path.into(),
            segment_count,
        }
    }
}

/// A contiguous byte range of the resource, fetched by one task.
///
/// The range is half-open: `[start, start + length)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Index of the segment, which is also its merge position.
    pub index: usize,
    /// The starting byte offset (0-based).
    pub start: u64,
    /// Number of bytes in this segment.
    pub length: u64,
    /// Staging file for this segment's bytes.
    pub part_path: PathBuf,
    /// `false` when the segment is the whole resource fetched without a
    /// `Range` header.
    pub ranged: bool,
}

impl Segment {
    /// Inclusive last byte offset, as used in a `Range` header.
    ///
    /// Only meaningful for non-empty segments.
    pub fn end_inclusive(&self) -> u64 {
        self.start + self.length.saturating_sub(1)
    }

    /// Exclusive end offset.
    pub fn end(&self) -> u64 {
        self.start + self.length
    }
}

/// Path of the staging file for segment `index`: `<target>.part<index>`.
pub fn part_path(target: &Path, index: usize) -> PathBuf {
    let mut name = OsString::from(target.as_os_str());
    name.push(format!(".part{index}"));
    PathBuf::from(name)
}
