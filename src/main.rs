//! Deface-Harvest main entry point
//!
//! This is the command-line interface for the Deface-Harvest listing crawler.

use anyhow::{bail, Context};
use clap::Parser;
use deface_harvest::config::{load_config_with_hash, validate_config, Config};
use deface_harvest::crawler::Coordinator;
use deface_harvest::output::{print_summary, write_markdown_summary, CsvSink};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Deface-Harvest: a bounded-concurrency harvester for paginated listings
///
/// Deface-Harvest discovers how many pages a listing has, fetches them all
/// under a fixed concurrency cap with bounded retry, and writes every record
/// into a single CSV file.
#[derive(Parser, Debug)]
#[command(name = "deface-harvest")]
#[command(version)]
#[command(about = "A bounded-concurrency harvester for paginated listings", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "discover_only")]
    dry_run: bool,

    /// Discover the number of pages and exit
    #[arg(long, conflicts_with = "dry_run")]
    discover_only: bool,

    /// Override the configured concurrency cap
    #[arg(long, value_name = "N")]
    max_concurrency: Option<u32>,

    /// Override the configured CSV output path
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load, override and re-validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    apply_overrides(&mut config, &cli);
    validate_config(&config).context("invalid command-line override")?;

    if cli.dry_run {
        handle_dry_run(&config);
        Ok(())
    } else if cli.discover_only {
        handle_discover(&config).await
    } else {
        handle_crawl(&config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("deface_harvest=info,warn"),
            1 => EnvFilter::new("deface_harvest=debug,info"),
            2 => EnvFilter::new("deface_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(max_concurrency) = cli.max_concurrency {
        tracing::debug!(max_concurrency, "Concurrency cap overridden on command line");
        config.crawler.max_concurrency = Some(max_concurrency);
    }
    if let Some(output) = &cli.output {
        config.output.csv_path = output.display().to_string();
    }
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Deface-Harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!(
        "  Max concurrency: {}",
        config.crawler.effective_max_concurrency()
    );
    println!(
        "  Backoff schedule: {:?} ({} attempts per page)",
        config.crawler.backoff_schedule(),
        config.crawler.backoff_schedule().len().max(1)
    );
    println!(
        "  Request timeout: {}s",
        config.crawler.request_timeout_secs
    );
    println!("  Page failure policy: {:?}", config.crawler.page_failure);

    println!("\nSource:");
    println!("  Seed: {}", config.source.seed_url);
    println!("  Page template: {}", config.source.page_url_template);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nSelectors:");
    println!("  Rows: {}", config.selectors.record_rows);
    println!("  Cells: {}", config.selectors.record_cells);
    println!("  Last page link: {}", config.selectors.last_page_link);

    println!("\nOutput:");
    println!("  CSV: {}", config.output.csv_path);
    if let Some(summary_path) = &config.output.summary_path {
        println!("  Summary: {}", summary_path);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --discover-only mode: prints the page count
async fn handle_discover(config: &Config) -> anyhow::Result<()> {
    let coordinator = Coordinator::new(config)?;
    let total_pages = coordinator
        .discover_total_pages()
        .await
        .context("pagination discovery failed")?;

    println!("Total pages: {}", total_pages);
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config) -> anyhow::Result<()> {
    let coordinator = Coordinator::new(config)?;
    let sink = CsvSink::create(Path::new(&config.output.csv_path))
        .with_context(|| format!("cannot create {}", config.output.csv_path))?;

    let cancel = coordinator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling crawl");
            cancel.cancel();
        }
    });

    tracing::info!("Starting crawl of {}", config.source.seed_url);
    let report = coordinator.run(Arc::new(sink)).await;

    print_summary(&report);

    if let Some(summary_path) = &config.output.summary_path {
        write_markdown_summary(&report, Path::new(summary_path))
            .with_context(|| format!("cannot write summary to {}", summary_path))?;
        println!("\n✓ Summary written to: {}", summary_path);
    }

    if !report.is_success() {
        bail!(
            "crawl aborted: {}",
            report.error.as_deref().unwrap_or("unknown error")
        );
    }

    println!("\n✓ Records written to: {}", config.output.csv_path);
    Ok(())
}
