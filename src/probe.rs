//! Resource metadata discovery.
//!
//! One metadata request decides the total size, whether byte ranges are
//! served, and the name the file is saved under.
use crate::error::{DownloadError, Result};
use crate::utils::{get_filename_from_disposition, get_filename_from_url};
use reqwest::header::{ACCEPT_RANGES, CONTENT_DISPOSITION, CONTENT_LENGTH, HeaderMap};
use tracing::{debug, warn};

/// What the prober learned about a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceInfo {
    pub url: String,
    pub total_size: u64,
    pub range_supported: bool,
    pub filename: String,
}

/// Fetches the headers of `url` with a `HEAD` request.
///
/// Servers that reject `HEAD` get a `GET` instead, whose body is dropped
/// unread.
///
/// # Errors
///
/// Returns an error if:
/// * Both requests fail at the transport level.
/// * The server returns a non-success status code.
/// * The server does not provide a `Content-Length` header.
pub async fn probe_resource(url: &str, client: &reqwest::Client) -> Result<ResourceInfo> {
    let response = match client.head(url).send().await {
        Ok(resp) if resp.status().is_success() => resp,
        Ok(resp) => {
            warn!(status = %resp.status(), "HEAD rejected, retrying with GET");
            client
                .get(url)
                .send()
                .await
                .map_err(|e| DownloadError::transport(url, e))?
        }
        Err(e) => {
            warn!(error = %e, "HEAD failed, retrying with GET");
            client
                .get(url)
                .send()
                .await
                .map_err(|e| DownloadError::transport(url, e))?
        }
    };

    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::HttpStatus {
            expected: reqwest::StatusCode::OK,
            actual: status,
        });
    }

    let info = parse_headers(url, response.headers())?;
    debug!(?info, "probed resource");
    Ok(info)
}

/// Builds a [`ResourceInfo`] from response headers.
///
/// `Content-Length` is read from the header map directly. The body size
/// hint is zero for `HEAD` responses.
pub fn parse_headers(url: &str, headers: &HeaderMap) -> Result<ResourceInfo> {
    let total_size = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .ok_or_else(|| DownloadError::MissingContentLength(url.to_string()))?;

    let range_supported = headers
        .get(ACCEPT_RANGES)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("bytes"));

    let filename = headers
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(get_filename_from_disposition)
        .unwrap_or_else(|| get_filename_from_url(url));

    Ok(ResourceInfo {
        url: url.to_string(),
        total_size,
        range_supported,
        filename,
    })
}
