//! Configuration module for Deface-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use deface_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("At most {} pages in flight", config.crawler.effective_max_concurrency());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, OutputConfig, PageFailurePolicy, SelectorConfig, SourceConfig,
    UserAgentConfig, DEFAULT_BACKOFF_SCHEDULE_MS, DEFAULT_REQUEST_TIMEOUT_SECS,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};

pub(crate) use validation::validate_selector;
pub use validation::{validate as validate_config, MAX_BACKOFF_ENTRIES, MAX_CONCURRENCY_LIMIT};
