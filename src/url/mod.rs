//! URL handling module for Deface-Harvest
//!
//! This module builds per-page URLs from the configured template and pulls
//! the page number out of the listing's "last page" link.

mod pagination;
mod template;

// Re-export main functions
pub use pagination::{last_path_segment, parse_page_number};
pub use template::{page_url, validate_template, PAGE_PLACEHOLDER};

use crate::{UrlError, UrlResult};
use url::Url;

/// Parses an absolute URL and requires an HTTP(S) scheme
///
/// # Arguments
///
/// * `raw` - The URL string to parse
///
/// # Returns
///
/// * `Ok(Url)` - The parsed URL
/// * `Err(UrlError)` - The string is not a valid http or https URL
pub fn parse_http_url(raw: &str) -> UrlResult<Url> {
    let url = Url::parse(raw).map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(UrlError::InvalidScheme(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_http_url() {
        assert!(parse_http_url("https://mirror-h.org/search/country/VN/pages").is_ok());
        assert!(parse_http_url("http://127.0.0.1:8080/").is_ok());
    }

    #[test]
    fn test_parse_http_url_rejects_other_schemes() {
        assert!(matches!(
            parse_http_url("ftp://example.com/"),
            Err(UrlError::InvalidScheme(_))
        ));
        assert!(matches!(
            parse_http_url("not a url"),
            Err(UrlError::Parse(_))
        ));
    }
}
