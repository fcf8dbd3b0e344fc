//! Inspects leftover part files to decide how much of a segment is still
//! needed.
use crate::error::{DownloadError, Result};
use crate::state::Segment;
use std::io::ErrorKind;
use tokio::fs;
use tracing::{debug, info, warn};

/// What a segment's fetch task should do, given what is already on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeAction {
    /// No usable bytes on disk. Create or truncate the part file and fetch
    /// the whole segment.
    Fresh,
    /// `existing` bytes are already on disk. Append the missing tail.
    Resume { existing: u64 },
    /// The part file already holds the whole segment.
    Complete,
}

impl ResumeAction {
    /// Bytes to credit to the progress counter before any transfer. A
    /// complete segment counts in full so the total can reach 100%.
    pub fn credited_bytes(&self, segment: &Segment) -> u64 {
        match *self {
            ResumeAction::Fresh => 0,
            ResumeAction::Resume { existing } => existing,
            ResumeAction::Complete => segment.length,
        }
    }
}

/// Looks at `segment.part_path` and decides how to proceed.
///
/// `can_resume` is false when the server cannot serve a partial range for
/// this segment. A partial file is then discarded and refetched.
///
/// A part file longer than the segment is truncated to the segment length,
/// since surplus bytes would shift every later segment in the merged file.
pub async fn probe_part(segment: &Segment, can_resume: bool) -> Result<ResumeAction> {
    let path = &segment.part_path;
    let size = match fs::metadata(path).await {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(index = segment.index, "no part file, starting fresh");
            return Ok(ResumeAction::Fresh);
        }
        Err(e) => return Err(DownloadError::fs("inspect", path, e)),
    };

    if size > segment.length {
        warn!(
            index = segment.index,
            size,
            length = segment.length,
            "part file longer than segment, truncating"
        );
        let file = fs::OpenOptions::new()
            .write(true)
            .open(path)
            .await
            .map_err(|e| DownloadError::fs("open", path, e))?;
        file.set_len(segment.length)
            .await
            .map_err(|e| DownloadError::fs("truncate", path, e))?;
    }

    if size >= segment.length {
        info!(index = segment.index, "segment already complete");
        return Ok(ResumeAction::Complete);
    }

    if size == 0 || !can_resume {
        debug!(index = segment.index, size, "discarding partial file");
        return Ok(ResumeAction::Fresh);
    }

    info!(
        index = segment.index,
        existing = size,
        remaining = segment.length - size,
        "resuming segment"
    );
    Ok(ResumeAction::Resume { existing: size })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::tempdir;

    fn segment(path: &Path, length: u64) -> Segment {
        Segment {
            index: 2,
            start: 4096,
            length,
            part_path: path.to_path_buf(),
            ranged: true,
        }
    }

    #[tokio::test]
    async fn missing_part_is_fresh() {
        let dir = tempdir().unwrap();
        let seg = segment(&dir.path().join("f.part2"), 100);
        assert_eq!(probe_part(&seg, true).await.unwrap(), ResumeAction::Fresh);
        assert_eq!(ResumeAction::Fresh.credited_bytes(&seg), 0);
    }

    #[tokio::test]
    async fn partial_part_resumes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f.part2");
        std::fs::write(&path, vec![7u8; 40]).unwrap();
        let seg = segment(&path, 100);

        let action = probe_part(&seg, true).await.unwrap();
        assert_eq!(action, ResumeAction::Resume { existing: 40 });
        assert_eq!(action.credited_bytes(&seg), 40);
    }

    #[tokio::test]
    async fn partial_part_without_range_support_is_fresh() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f");
        std::fs::write(&path, vec![7u8; 40]).unwrap();
        let seg = segment(&path, 100);

        assert_eq!(probe_part(&seg, false).await.unwrap(), ResumeAction::Fresh);
    }

    #[tokio::test]
    async fn empty_part_is_fresh() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f.part2");
        std::fs::write(&path, b"").unwrap();
        let seg = segment(&path, 100);

        assert_eq!(probe_part(&seg, true).await.unwrap(), ResumeAction::Fresh);
    }

    #[tokio::test]
    async fn full_part_is_complete_and_credits_segment_length() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f.part2");
        std::fs::write(&path, vec![1u8; 100]).unwrap();
        let seg = segment(&path, 100);

        let action = probe_part(&seg, true).await.unwrap();
        assert_eq!(action, ResumeAction::Complete);
        assert_eq!(action.credited_bytes(&seg), 100);
    }

    #[tokio::test]
    async fn oversized_part_is_truncated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f.part2");
        std::fs::write(&path, vec![1u8; 150]).unwrap();
        let seg = segment(&path, 100);

        let action = probe_part(&seg, true).await.unwrap();
        assert_eq!(action, ResumeAction::Complete);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 100);
    }
}
