//! Parse HTTP response header lines into HeadResult.

/// Headers of a probe response that matter for resuming.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadResult {
    /// `Content-Length`, if present and numeric.
    pub content_length: Option<u64>,
    /// Complete length from `Content-Range: bytes a-b/<total>`; `None` for `*`.
    pub content_range_total: Option<u64>,
    /// True if server sent `Accept-Ranges: bytes`.
    pub accept_ranges: bool,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

/// Parse collected header lines. Status lines and malformed lines are skipped.
pub fn parse_headers(lines: &[String]) -> HeadResult {
    let mut out = HeadResult::default();

    for line in lines {
        let Some((name, value)) = line.trim().split_once(':') else {
            continue;
        };
        let name = name.trim();
        let value = value.trim();
        if name.eq_ignore_ascii_case("content-length") {
            out.content_length = value.parse::<u64>().ok();
        } else if name.eq_ignore_ascii_case("content-range") {
            out.content_range_total = parse_content_range_total(value);
        } else if name.eq_ignore_ascii_case("accept-ranges") {
            out.accept_ranges = value.eq_ignore_ascii_case("bytes");
        } else if name.eq_ignore_ascii_case("etag") {
            out.etag = Some(value.trim_matches('"').to_string());
        } else if name.eq_ignore_ascii_case("last-modified") {
            out.last_modified = Some(value.to_string());
        }
    }

    out
}

/// `bytes 0-0/4096` -> `Some(4096)`; `bytes */4096` -> `Some(4096)`; `bytes 0-0/*` -> `None`.
fn parse_content_range_total(value: &str) -> Option<u64> {
    let rest = value.strip_prefix("bytes")?.trim_start();
    let (_, total) = rest.split_once('/')?;
    total.trim().parse::<u64>().ok()
}
