use crate::error::{DownloadError, Result};
use crate::progress::ProgressCounter;
use crate::resume::{ResumeAction, probe_part};
use crate::state::Segment;
use reqwest::StatusCode;
use reqwest::header::RANGE;
use std::path::Path;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, warn};

/// How the part file is opened before the body is streamed into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Create or truncate.
    Create,
    /// Append after the bytes already present.
    Append,
}

/// Result of one segment's task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SegmentOutcome {
    pub index: usize,
    /// Bytes transferred over the network by this run.
    pub fetched: u64,
    /// Bytes that were already on disk.
    pub resumed: u64,
}

/// One body transfer into a part file.
#[derive(Debug, Clone, Copy)]
pub struct RangeRequest<'a> {
    pub path: &'a Path,
    /// First byte offset to request.
    pub start: u64,
    pub length: u64,
    /// Send a `Range` header and require `206`. Otherwise the whole
    /// resource is requested and `200` is required.
    pub ranged: bool,
    pub mode: WriteMode,
}

impl<'a> RangeRequest<'a> {
    /// The untouched remainder of `segment`, starting `existing` bytes in.
    pub fn for_segment(segment: &'a Segment, existing: u64) -> Self {
        if existing == 0 {
            Self {
                path: &segment.part_path,
                start: segment.start,
                length: segment.length,
                ranged: segment.ranged,
                mode: WriteMode::Create,
            }
        } else {
            Self {
                path: &segment.part_path,
                start: segment.start + existing,
                length: segment.length - existing,
                ranged: true,
                mode: WriteMode::Append,
            }
        }
    }
}

/// Streams `[start, start + length)` of `url` into `req.path`.
///
/// Every chunk read is added to `counter` before it is written. The body
/// must be exactly `length` bytes long. No retries are attempted.
pub async fn fetch_range(
    client: &reqwest::Client,
    url: &str,
    req: RangeRequest<'_>,
    counter: &ProgressCounter,
) -> Result<u64> {
    let RangeRequest {
        path,
        start,
        length,
        ranged,
        mode,
    } = req;
    let mut request = client.get(url);
    let expected = if ranged {
        if length == 0 {
            return Ok(0);
        }
        let range_header = format!("bytes={}-{}", start, start + length - 1);
        debug!(%range_header, path = %path.display(), "requesting range");
        request = request.header(RANGE, range_header);
        StatusCode::PARTIAL_CONTENT
    } else {
        debug!(path = %path.display(), "requesting whole resource");
        StatusCode::OK
    };

    let mut response = request
        .send()
        .await
        .map_err(|e| DownloadError::transport(url, e))?;

    let status = response.status();
    if status != expected {
        if ranged && status == StatusCode::OK {
            warn!(url, "server ignored the Range header");
        }
        return Err(DownloadError::HttpStatus {
            expected,
            actual: status,
        });
    }

    let mut options = OpenOptions::new();
    options.create(true);
    match mode {
        WriteMode::Create => options.write(true).truncate(true),
        WriteMode::Append => options.append(true),
    };
    let file = options
        .open(path)
        .await
        .map_err(|e| DownloadError::fs("open", path, e))?;

    let mut writer = BufWriter::new(file);
    let mut received = 0u64;

    while let Some(bytes) = response
        .chunk()
        .await
        .map_err(|e| DownloadError::transport(url, e))?
    {
        counter.add(bytes.len() as u64);
        received += bytes.len() as u64;
        writer
            .write_all(&bytes)
            .await
            .map_err(|e| DownloadError::fs("write", path, e))?;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::fs("flush", path, e))?;

    if received != length {
        return Err(DownloadError::IncompleteBody {
            expected: length,
            received,
        });
    }

    Ok(received)
}

/// Runs one segment: probes its part file, credits recovered bytes to the
/// counter, then fetches whatever is missing.
pub async fn download_segment(
    client: &reqwest::Client,
    url: &str,
    segment: &Segment,
    can_resume: bool,
    counter: &ProgressCounter,
) -> Result<SegmentOutcome> {
    let action = probe_part(segment, can_resume).await?;
    let resumed = action.credited_bytes(segment);
    counter.credit(resumed);

    let fetched = match action {
        ResumeAction::Complete => 0,
        ResumeAction::Fresh => {
            fetch_range(client, url, RangeRequest::for_segment(segment, 0), counter).await?
        }
        ResumeAction::Resume { existing } => {
            fetch_range(
                client,
                url,
                RangeRequest::for_segment(segment, existing),
                counter,
            )
            .await?
        }
    };

    Ok(SegmentOutcome {
        index: segment.index,
        fetched,
        resumed,
    })
}
