//! Error taxonomy for a segmented download run.
//!
//! Fetch-level failures (`Transport`, `HttpStatus`, `FileSystem`,
//! `IncompleteBody`) are wrapped in `Segment` by the orchestrator so the
//! caller learns which segment failed. Aggregation failures are wrapped in
//! `Aggregate`.
use reqwest::StatusCode;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T, E = DownloadError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DownloadError {
    /// DNS, connect or mid-body transport failure.
    #[error("transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected HTTP status: expected {expected}, got {actual}")]
    HttpStatus {
        expected: StatusCode,
        actual: StatusCode,
    },

    #[error("failed to {op} {}: {source}", .path.display())]
    FileSystem {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("response body was {received} bytes, expected {expected}")]
    IncompleteBody { expected: u64, received: u64 },

    #[error("part file {} is {actual} bytes, expected {expected}", .path.display())]
    PartSizeMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("server did not report a Content-Length for {0}")]
    MissingContentLength(String),

    #[error("segment {index} failed: {source}")]
    Segment {
        index: usize,
        #[source]
        source: Box<DownloadError>,
    },

    #[error("aggregation failed: {source}")]
    Aggregate {
        #[source]
        source: Box<DownloadError>,
    },

    #[error("fetch task for segment {index} did not complete: {source}")]
    Task {
        index: usize,
        #[source]
        source: tokio::task::JoinError,
    },
}

impl DownloadError {
    pub(crate) fn transport(url: &str, source: reqwest::Error) -> Self {
        Self::Transport {
            url: url.to_string(),
            source,
        }
    }

    pub(crate) fn fs(op: &'static str, path: &Path, source: io::Error) -> Self {
        Self::FileSystem {
            op,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Index of the segment this error is attributed to, if any.
    pub fn segment_index(&self) -> Option<usize> {
        match self {
            Self::Segment { index, .. } | Self::Task { index, .. } => Some(*index),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_error_names_index_and_kind() {
        let inner = DownloadError::HttpStatus {
            expected: StatusCode::PARTIAL_CONTENT,
            actual: StatusCode::OK,
        };
        let err = DownloadError::Segment {
            index: 3,
            source: Box::new(inner),
        };

        let msg = err.to_string();
        assert!(msg.contains("segment 3"));
        assert!(msg.contains("206"));
        assert!(msg.contains("200"));
        assert_eq!(err.segment_index(), Some(3));
    }

    #[test]
    fn fs_error_mentions_operation_and_path() {
        let err = DownloadError::fs(
            "rename",
            Path::new("/tmp/out.bin.part0"),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.starts_with("failed to rename /tmp/out.bin.part0"));
        assert_eq!(err.segment_index(), None);
    }
}
