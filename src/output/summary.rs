//! Crawl report and its human-readable renderings
//!
//! The report is produced for every crawl, including aborted ones, and can be
//! printed to stdout or written as a markdown file.

use crate::state::{CounterSnapshot, CrawlPhase};
use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Final state of one crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Terminal phase (`Done` or `Aborted`)
    pub phase: CrawlPhase,

    /// Page count from discovery, if it succeeded
    pub total_pages: Option<u32>,

    /// Per-page tallies
    pub pages: CounterSnapshot,

    /// Records written to the sink
    pub records: u64,

    /// Highest number of page tasks in flight at once
    pub peak_concurrency: usize,

    /// Configured concurrency cap
    pub max_concurrency: usize,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Message of the fatal error that aborted the crawl
    pub error: Option<String>,
}

impl CrawlReport {
    /// Returns true if the crawl reached `Done`
    pub fn is_success(&self) -> bool {
        self.phase.is_success()
    }

    /// Wall-clock duration in seconds
    pub fn duration_seconds(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }

    /// Share of launched pages that succeeded, as a percentage
    pub fn success_rate(&self) -> f64 {
        let finished = self.pages.finished();
        if finished == 0 {
            return 0.0;
        }
        (self.pages.succeeded as f64 / finished as f64) * 100.0
    }
}

/// Prints the report to stdout
pub fn print_summary(report: &CrawlReport) {
    println!("=== Crawl Summary ===\n");

    println!("Outcome: {}", report.phase);
    if let Some(error) = &report.error {
        println!("Error: {}", error);
    }
    println!();

    println!("Pages:");
    match report.total_pages {
        Some(total) => println!("  Discovered: {}", total),
        None => println!("  Discovered: unknown"),
    }
    println!("  Attempted: {}", report.pages.scheduled);
    println!("  Succeeded: {}", report.pages.succeeded);
    println!("  Failed: {}", report.pages.failed);
    println!("  Cancelled: {}", report.pages.cancelled);
    println!("  Skipped: {}", report.pages.skipped);
    println!();

    println!("Total records: {}", report.records);
    println!(
        "Peak concurrency: {} (cap {})",
        report.peak_concurrency, report.max_concurrency
    );
    println!(
        "Success Rate: {:.1}% ({} / {} pages)",
        report.success_rate(),
        report.pages.succeeded,
        report.pages.finished()
    );
    println!("Duration: {:.2}s", report.duration_seconds());
}

/// Writes the report as markdown to `output_path`
pub fn write_markdown_summary(report: &CrawlReport, output_path: &Path) -> std::io::Result<()> {
    let markdown = format_markdown_summary(report);
    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;
    Ok(())
}

/// Formats the report as markdown
pub fn format_markdown_summary(report: &CrawlReport) -> String {
    let mut md = String::new();

    md.push_str("# Deface-Harvest Crawl Summary\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", report.started_at.to_rfc3339()));
    md.push_str(&format!(
        "- **Finished**: {}\n",
        report.finished_at.to_rfc3339()
    ));
    md.push_str(&format!(
        "- **Duration**: {:.2} seconds\n",
        report.duration_seconds()
    ));
    md.push_str(&format!("- **Outcome**: {}\n", report.phase));
    if let Some(error) = &report.error {
        md.push_str(&format!("- **Error**: {}\n", error));
    }
    md.push('\n');

    md.push_str("## Pages\n\n");
    md.push_str("| Outcome | Count |\n");
    md.push_str("|---------|-------|\n");
    let discovered = report
        .total_pages
        .map(|n| n.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    md.push_str(&format!("| Discovered | {} |\n", discovered));
    md.push_str(&format!("| Attempted | {} |\n", report.pages.scheduled));
    md.push_str(&format!("| Succeeded | {} |\n", report.pages.succeeded));
    md.push_str(&format!("| Failed | {} |\n", report.pages.failed));
    md.push_str(&format!("| Cancelled | {} |\n", report.pages.cancelled));
    md.push_str(&format!("| Skipped | {} |\n", report.pages.skipped));
    md.push('\n');

    md.push_str("## Records\n\n");
    md.push_str(&format!("- **Total records**: {}\n", report.records));
    md.push_str(&format!(
        "- **Peak concurrency**: {} of {}\n",
        report.peak_concurrency, report.max_concurrency
    ));
    md.push_str(&format!(
        "- **Success rate**: {:.1}%\n",
        report.success_rate()
    ));

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn report() -> CrawlReport {
        let started_at = Utc::now();
        CrawlReport {
            phase: CrawlPhase::Done,
            total_pages: Some(10),
            pages: CounterSnapshot {
                scheduled: 10,
                succeeded: 8,
                failed: 2,
                cancelled: 0,
                skipped: 0,
            },
            records: 80,
            peak_concurrency: 4,
            max_concurrency: 4,
            started_at,
            finished_at: started_at + Duration::milliseconds(2_500),
            error: None,
        }
    }

    #[test]
    fn test_success_rate() {
        let rate = report().success_rate();
        assert!((rate - 80.0).abs() < 0.01);
    }

    #[test]
    fn test_success_rate_zero_pages() {
        let mut report = report();
        report.pages = CounterSnapshot::default();
        assert_eq!(report.success_rate(), 0.0);
    }

    #[test]
    fn test_duration_seconds() {
        assert!((report().duration_seconds() - 2.5).abs() < 0.001);
    }

    #[test]
    fn test_markdown_contains_totals() {
        let md = format_markdown_summary(&report());
        assert!(md.contains("# Deface-Harvest Crawl Summary"));
        assert!(md.contains("| Succeeded | 8 |"));
        assert!(md.contains("- **Total records**: 80"));
        assert!(!md.contains("**Error**"));
    }

    #[test]
    fn test_markdown_for_aborted_crawl() {
        let mut report = report();
        report.phase = CrawlPhase::Aborted;
        report.total_pages = None;
        report.error = Some("no last-page link found".to_string());

        let md = format_markdown_summary(&report);
        assert!(md.contains("- **Outcome**: aborted"));
        assert!(md.contains("| Discovered | unknown |"));
        assert!(md.contains("no last-page link found"));
    }

    #[test]
    fn test_write_markdown_summary() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("summary.md");

        write_markdown_summary(&report(), &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# Deface-Harvest Crawl Summary"));
    }
}
