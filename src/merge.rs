//! Concatenates part files into the target file.
use crate::error::{DownloadError, Result};
use crate::state::Segment;
use std::path::Path;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{self, AsyncWriteExt};
use tracing::{debug, info};

/// Merges the part files of `segments` onto part 0, in index order, then
/// renames part 0 to `target`.
///
/// Part 0 is only ever the append target and is never read. Each later
/// part is deleted once copied. On failure nothing is cleaned up: parts
/// that were merged but not yet deleted stay on disk, and `target` is left
/// as it was.
pub async fn aggregate_parts(target: &Path, segments: &[Segment]) -> Result<()> {
    let Some((base, rest)) = segments.split_first() else {
        return Ok(());
    };

    for segment in segments {
        check_part_size(segment).await?;
    }

    let base_path = &base.part_path;
    let mut main_file = OpenOptions::new()
        .append(true)
        .open(base_path)
        .await
        .map_err(|e| DownloadError::fs("open", base_path, e))?;

    for segment in rest {
        let part_path = &segment.part_path;
        let mut part = File::open(part_path)
            .await
            .map_err(|e| DownloadError::fs("open", part_path, e))?;

        let copied = io::copy(&mut part, &mut main_file)
            .await
            .map_err(|e| DownloadError::fs("copy", part_path, e))?;
        drop(part);
        debug!(index = segment.index, copied, "merged part");

        fs::remove_file(part_path)
            .await
            .map_err(|e| DownloadError::fs("remove", part_path, e))?;
    }

    main_file
        .flush()
        .await
        .map_err(|e| DownloadError::fs("flush", base_path, e))?;
    main_file
        .sync_all()
        .await
        .map_err(|e| DownloadError::fs("sync", base_path, e))?;
    drop(main_file);

    fs::rename(base_path, target)
        .await
        .map_err(|e| DownloadError::fs("rename", base_path, e))?;

    info!(target = %target.display(), parts = segments.len(), "aggregation complete");
    Ok(())
}

async fn check_part_size(segment: &Segment) -> Result<()> {
    let path = &segment.part_path;
    let actual = fs::metadata(path)
        .await
        .map_err(|e| DownloadError::fs("inspect", path, e))?
        .len();

    if actual != segment.length {
        return Err(DownloadError::PartSizeMismatch {
            path: path.clone(),
            expected: segment.length,
            actual,
        });
    }
    Ok(())
}
