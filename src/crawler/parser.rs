//! HTML parser for extracting records and pagination links
//!
//! This module turns one listing page into:
//! - The records in its result table (one per row)
//! - The href of its "last page" pagination link

use crate::config::{validate_selector, SelectorConfig};
use crate::record::{Record, CSV_HEADER};
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

/// Errors produced while extracting records from a document
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("row {row} has {cells} cells, expected at least {expected}")]
    MalformedRow {
        row: usize,
        cells: usize,
        expected: usize,
    },
}

/// Converts a fetched document into records
///
/// Implementations never mutate the document and may return an empty list.
pub trait PageParser: Send + Sync {
    /// Extracts every record on the page
    fn parse_records(&self, document: &str) -> Result<Vec<Record>, ParseError>;

    /// Returns the href of the last pagination link, if the page has one
    fn last_page_href(&self, document: &str) -> Option<String>;
}

/// [`PageParser`] driven by CSS selectors
///
/// # Row Extraction Rules
///
/// - Each element matched by the row selector is one candidate record
/// - Cell texts are trimmed; the first five cells map to actor, region,
///   locator, address and timestamp
/// - Parentheses are stripped from the region cell (`"(VN)"` → `"VN"`)
/// - Rows without any cell (e.g. header rows made of `th`) are skipped
/// - Rows with one to four cells fail the whole page
///
/// # Example
///
/// ```
/// use deface_harvest::config::SelectorConfig;
/// use deface_harvest::crawler::{HtmlPageParser, PageParser};
///
/// let parser = HtmlPageParser::new(&SelectorConfig::default()).unwrap();
/// let html = r#"<table><tbody><tr>
///     <td>A</td><td>(VN)</td><td>http://x</td><td>1.2.3.4</td><td>2024-01-01</td>
/// </tr></tbody></table>"#;
/// let records = parser.parse_records(html).unwrap();
/// assert_eq!(records[0].region, "VN");
/// ```
#[derive(Debug, Clone)]
pub struct HtmlPageParser {
    rows: Selector,
    cells: Selector,
    last_page: Selector,
}

impl HtmlPageParser {
    /// Compiles the configured selectors
    pub fn new(config: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            rows: validate_selector(&config.record_rows)?,
            cells: validate_selector(&config.record_cells)?,
            last_page: validate_selector(&config.last_page_link)?,
        })
    }

    fn parse_row(&self, index: usize, row: ElementRef<'_>) -> Result<Option<Record>, ParseError> {
        let cells: Vec<String> = row
            .select(&self.cells)
            .map(|cell| cell.text().collect::<String>().trim().to_string())
            .collect();

        if cells.is_empty() {
            return Ok(None);
        }

        if cells.len() < CSV_HEADER.len() {
            return Err(ParseError::MalformedRow {
                row: index,
                cells: cells.len(),
                expected: CSV_HEADER.len(),
            });
        }

        let mut cells = cells.into_iter();
        let mut next = || cells.next().unwrap_or_default();
        let actor = next();
        let region = strip_parentheses(&next());
        Ok(Some(Record {
            actor,
            region,
            locator: next(),
            address: next(),
            timestamp: next(),
        }))
    }
}

impl PageParser for HtmlPageParser {
    fn parse_records(&self, document: &str) -> Result<Vec<Record>, ParseError> {
        let html = Html::parse_document(document);
        let mut records = Vec::new();

        for (index, row) in html.select(&self.rows).enumerate() {
            match self.parse_row(index, row)? {
                Some(record) => records.push(record),
                None => tracing::trace!(row = index, "skipping row without cells"),
            }
        }

        Ok(records)
    }

    fn last_page_href(&self, document: &str) -> Option<String> {
        let html = Html::parse_document(document);

        html.select(&self.last_page)
            .last()
            .and_then(|a| a.value().attr("href"))
            .map(|href| href.trim().to_string())
            .filter(|href| !href.is_empty())
    }
}

/// Removes every `(` and `)` and surrounding whitespace
fn strip_parentheses(text: &str) -> String {
    text.trim().replace(['(', ')'], "")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> HtmlPageParser {
        HtmlPageParser::new(&SelectorConfig::default()).unwrap()
    }

    const LISTING: &str = r#"
<html><body>
<table>
  <thead><tr><th>Attacker</th><th>Country</th><th>Web Url</th><th>Ip</th><th>Date</th></tr></thead>
  <tbody>
    <tr><td> Crew1 </td><td> (VN) </td><td>http://a.vn</td><td>1.1.1.1</td><td>2024-01-01</td></tr>
    <tr><td>Crew2</td><td>(VN)</td><td>http://b.vn</td><td>2.2.2.2</td><td>2024-01-02</td></tr>
  </tbody>
</table>
<ul class="pagination">
  <li><a href="/search/country/VN/pages/1">1</a></li>
  <li><a href="/search/country/VN/pages/2">2</a></li>
  <li><a href="/search/country/VN/pages/317">Last</a></li>
</ul>
</body></html>
"#;

    #[test]
    fn test_parse_records() {
        let records = parser().parse_records(LISTING).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0],
            Record::new("Crew1", "VN", "http://a.vn", "1.1.1.1", "2024-01-01")
        );
        assert_eq!(records[1].actor, "Crew2");
    }

    #[test]
    fn test_header_rows_in_tbody_are_skipped() {
        let html = r#"<table><tbody>
            <tr><th>Attacker</th><th>Country</th></tr>
            <tr><td>A</td><td>VN</td><td>http://x</td><td>1.2.3.4</td><td>2024-01-01</td></tr>
        </tbody></table>"#;

        let records = parser().parse_records(html).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_short_row_fails_page() {
        let html = r#"<table><tbody>
            <tr><td>A</td><td>VN</td><td>http://x</td></tr>
        </tbody></table>"#;

        assert_eq!(
            parser().parse_records(html),
            Err(ParseError::MalformedRow {
                row: 0,
                cells: 3,
                expected: 5
            })
        );
    }

    #[test]
    fn test_empty_page_has_no_records() {
        let records = parser()
            .parse_records("<html><body><p>No results</p></body></html>")
            .unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_last_page_href() {
        assert_eq!(
            parser().last_page_href(LISTING).as_deref(),
            Some("/search/country/VN/pages/317")
        );
    }

    #[test]
    fn test_missing_pagination() {
        assert_eq!(parser().last_page_href("<html><body></body></html>"), None);
    }

    #[test]
    fn test_strip_parentheses() {
        assert_eq!(strip_parentheses(" (VN) "), "VN");
        assert_eq!(strip_parentheses("US"), "US");
    }
}
