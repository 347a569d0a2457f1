//! Page-number extraction from pagination links

use crate::{UrlError, UrlResult};
use url::Url;

/// Returns the last non-empty path segment of `href` resolved against `base`
///
/// Relative links such as `/search/country/VN/pages/7` and absolute ones
/// both resolve to the same segment (`"7"`). A trailing slash is ignored.
pub fn last_path_segment(base: &Url, href: &str) -> UrlResult<String> {
    let resolved = base
        .join(href.trim())
        .map_err(|e| UrlError::Parse(format!("{}: {}", href, e)))?;

    resolved
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(str::to_string)
        .ok_or_else(|| UrlError::NoPathSegment(resolved.to_string()))
}

/// Parses a path segment as a 1-based page count
///
/// Returns `None` for anything that is not a positive integer.
pub fn parse_page_number(segment: &str) -> Option<u32> {
    segment.parse::<u32>().ok().filter(|n| *n >= 1)
}
