//! Utility helpers used across the crate.
//!
//! Segment planning and filename extraction.
use crate::state::{
    DEFAULT_SEGMENTS, DownloadSpec, MAX_SEGMENTS, SEGMENT_THRESHOLD, Segment, part_path,
};
use percent_encoding::percent_decode_str;
use sanitize_filename::sanitize;
use url::Url;

/// Clamps a requested segment count. Anything outside `1..=16` becomes 8.
pub fn effective_segment_count(requested: usize) -> usize {
    if (1..=MAX_SEGMENTS).contains(&requested) {
        requested
    } else {
        DEFAULT_SEGMENTS
    }
}

/// Divides the resource into disjoint byte ranges for concurrent fetching.
///
/// Falls back to a single whole-resource segment written straight to the
/// target path when ranges are unsupported, the resource is small, or only
/// one segment was requested. Otherwise every segment has the nominal
/// length `ceil(total / n)` except the last, which is clipped to the bytes
/// that remain.
pub fn plan_segments(spec: &DownloadSpec) -> Vec<Segment> {
    let n = effective_segment_count(spec.segment_count);
    let total_size = spec.total_size;

    if !spec.range_supported || total_size <= SEGMENT_THRESHOLD || n == 1 {
        return vec![Segment {
            index: 0,
            start: 0,
            length: total_size,
            part_path: spec.target_path.clone(),
            ranged: false,
        }];
    }

    let nominal = total_size.div_ceil(n as u64);

    (0..n)
        .map(|i| (i, i as u64 * nominal))
        .take_while(|&(_, start)| start < total_size)
        .map(|(i, start)| Segment {
            index: i,
            start,
            length: nominal.min(total_size - start),
            part_path: part_path(&spec.target_path, i),
            ranged: true,
        })
        .collect()
}

/// Extracts the `filename` parameter from a `Content-Disposition` value.
///
/// Handles both quoted and bare forms. Returns `None` if the parameter is
/// missing or sanitizes to nothing.
pub fn get_filename_from_disposition(value: &str) -> Option<String> {
    let idx = value.find("filename=")?;
    let rest = &value[idx + "filename=".len()..];

    let raw = match rest.strip_prefix('"') {
        Some(quoted) => quoted.split('"').next().unwrap_or(""),
        None => rest.split(';').next().unwrap_or("").trim(),
    };

    Some(sanitize(raw)).filter(|s| !s.is_empty())
}

/// Extracts a clean filename from a URL.
///
/// 1. Parses the URL.
/// 2. Extracts the last segment of the path.
/// 3. URL-decodes it (converts %20 to space, etc.).
/// 4. Sanitizes it to remove characters invalid for the OS.
/// 5. Falls back to "output.bin" if no valid filename is found.
pub fn get_filename_from_url(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .map(|mut s| s.next_back().unwrap_or("").to_string())
        })
        .map(|s| percent_decode_str(&s).decode_utf8_lossy().to_string())
        .map(sanitize)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "output.bin".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn spec(total: u64, n: usize) -> DownloadSpec {
        DownloadSpec::new("http://example.com/f", total, true, "/tmp/f.bin", n)
    }

    fn assert_exact_cover(segments: &[Segment], total: u64) {
        let mut cursor = 0;
        for (i, seg) in segments.iter().enumerate() {
            assert_eq!(seg.index, i);
            assert_eq!(seg.start, cursor, "gap or overlap before segment {i}");
            cursor += seg.length;
        }
        assert_eq!(cursor, total, "segments do not end at total size");
    }

    #[test]
    fn test_plan_even_split() {
        // 4096 bytes, 4 segments -> 1024 each
        let segments = plan_segments(&spec(4096, 4));
        assert_eq!(segments.len(), 4);
        assert!(segments.iter().all(|s| s.length == 1024));
        assert_eq!(segments[3].start, 3072);
        assert_exact_cover(&segments, 4096);
    }

    #[test]
    fn test_plan_clips_last_segment() {
        // 2050 bytes, 3 segments -> 684, 684, 682
        let segments = plan_segments(&spec(2050, 3));
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].length, 684);
        assert_eq!(segments[1].length, 684);
        assert_eq!(segments[2].length, 682);
        assert_eq!(segments[2].end(), 2050);
    }

    #[test]
    fn test_plan_covers_range_for_many_sizes() {
        for total in [1025u64, 1031, 2048, 4097, 65_535, 1 << 20, (2 << 20) + 7] {
            for n in 1..=MAX_SEGMENTS {
                let segments = plan_segments(&spec(total, n));
                assert!(!segments.is_empty());
                assert!(segments.len() <= n);
                assert!(segments.iter().all(|s| s.length > 0));
                assert_exact_cover(&segments, total);
            }
        }
    }

    #[test]
    fn test_plan_part_paths() {
        let segments = plan_segments(&spec(8192, 2));
        assert_eq!(segments[0].part_path, PathBuf::from("/tmp/f.bin.part0"));
        assert_eq!(segments[1].part_path, PathBuf::from("/tmp/f.bin.part1"));
        assert!(segments.iter().all(|s| s.ranged));
    }

    #[test]
    fn test_out_of_range_count_defaults_to_eight() {
        assert_eq!(effective_segment_count(0), 8);
        assert_eq!(effective_segment_count(17), 8);
        assert_eq!(effective_segment_count(16), 16);
        assert_eq!(effective_segment_count(1), 1);
        assert_eq!(plan_segments(&spec(1 << 20, 40)).len(), 8);
    }

    #[test]
    fn test_single_segment_fallbacks() {
        let cases = [
            DownloadSpec::new("u", 1 << 20, false, "/tmp/a", 8),
            DownloadSpec::new("u", 1024, true, "/tmp/a", 8),
            DownloadSpec::new("u", 1 << 20, true, "/tmp/a", 1),
            DownloadSpec::new("u", 0, true, "/tmp/a", 8),
        ];

        for case in cases {
            let segments = plan_segments(&case);
            assert_eq!(segments.len(), 1);
            assert_eq!(segments[0].start, 0);
            assert_eq!(segments[0].length, case.total_size);
            assert_eq!(segments[0].part_path, PathBuf::from("/tmp/a"));
            assert!(!segments[0].ranged);
        }
    }

    #[test]
    fn test_filename_from_disposition() {
        assert_eq!(
            get_filename_from_disposition("attachment; filename=\"report 2024.pdf\""),
            Some("report 2024.pdf".to_string())
        );
        assert_eq!(
            get_filename_from_disposition("attachment; filename=data.csv; size=10"),
            Some("data.csv".to_string())
        );
        let traversal =
            get_filename_from_disposition("attachment; filename=\"../../etc/passwd\"").unwrap();
        assert!(!traversal.contains('/'));
        assert_eq!(get_filename_from_disposition("inline"), None);
        assert_eq!(get_filename_from_disposition("attachment; filename=\"\""), None);
    }

    #[test]
    fn test_filename_extraction() {
        // Simple case
        assert_eq!(
            get_filename_from_url("https://example.com/archive.zip"),
            "archive.zip"
        );

        // With query parameters (should ignore ?id=123)
        assert_eq!(
            get_filename_from_url("https://example.com/image.png?id=123&quality=high"),
            "image.png"
        );

        // With URL encoding (%20)
        assert_eq!(
            get_filename_from_url("https://example.com/my%20vacation%20photo.jpg"),
            "my vacation photo.jpg"
        );

        // Edge case: No filename (ends in slash)
        assert_eq!(get_filename_from_url("https://example.com/"), "output.bin");
    }

    #[test]
    fn url_name_is_used_when_server_sends_no_disposition() {
        // Signed download link on a local mirror
        assert_eq!(
            get_filename_from_url("http://127.0.0.1:8080/files/ignored-name.bin?token=abc"),
            "ignored-name.bin"
        );
        // Endpoint without an extension
        assert_eq!(
            get_filename_from_url("https://example.com/download?id=9"),
            "download"
        );
        // Encoded slash must not escape the target directory
        let name = get_filename_from_url("https://example.com/dl/..%2F..%2Fpasswd");
        assert!(!name.contains('/'));
        assert!(!name.is_empty());
        // Unparseable input still yields a usable name
        assert_eq!(get_filename_from_url("not a url"), "output.bin");
    }
}
