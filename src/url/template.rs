//! Page URL templates
//!
//! A template is an absolute URL containing the `{page}` placeholder, e.g.
//! `https://mirror-h.org/search/country/VN/pages/{page}`.

use crate::url::parse_http_url;
use crate::{UrlError, UrlResult};

/// Placeholder substituted with the 1-based page index
pub const PAGE_PLACEHOLDER: &str = "{page}";

/// Builds the URL of one page by substituting its index into the template
///
/// # Example
///
/// ```
/// use deface_harvest::url::page_url;
///
/// let url = page_url("https://example.com/pages/{page}", 7);
/// assert_eq!(url, "https://example.com/pages/7");
/// ```
pub fn page_url(template: &str, page: u32) -> String {
    template.replace(PAGE_PLACEHOLDER, &page.to_string())
}

/// Checks that a template has the placeholder and expands to an HTTP(S) URL
pub fn validate_template(template: &str) -> UrlResult<()> {
    if !template.contains(PAGE_PLACEHOLDER) {
        return Err(UrlError::MissingPlaceholder(template.to_string()));
    }

    parse_http_url(&page_url(template, 1))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_url_substitution() {
        let template = "https://mirror-h.org/search/country/VN/pages/{page}";
        assert_eq!(
            page_url(template, 1),
            "https://mirror-h.org/search/country/VN/pages/1"
        );
        assert_eq!(
            page_url(template, 1234),
            "https://mirror-h.org/search/country/VN/pages/1234"
        );
    }

    #[test]
    fn test_page_url_in_query() {
        assert_eq!(
            page_url("http://127.0.0.1:9000/list?page={page}", 3),
            "http://127.0.0.1:9000/list?page=3"
        );
    }

    #[test]
    fn test_validate_template() {
        assert!(validate_template("https://example.com/pages/{page}").is_ok());

        assert!(matches!(
            validate_template("https://example.com/pages/"),
            Err(UrlError::MissingPlaceholder(_))
        ));
        assert!(matches!(
            validate_template("ftp://example.com/{page}"),
            Err(UrlError::InvalidScheme(_))
        ));
    }
}
