use crate::config::types::{
    Config, CrawlerConfig, OutputConfig, SelectorConfig, SourceConfig, UserAgentConfig,
};
use crate::url::{parse_http_url, validate_template};
use crate::ConfigError;
use scraper::Selector;

/// Upper bound on `max-concurrency`
pub const MAX_CONCURRENCY_LIMIT: u32 = 256;

/// Upper bound on the number of backoff entries
pub const MAX_BACKOFF_ENTRIES: usize = 32;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_source_config(&config.source)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_selector_config(&config.selectors)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if let Some(n) = config.max_concurrency {
        if n < 1 || n > MAX_CONCURRENCY_LIMIT {
            return Err(ConfigError::Validation(format!(
                "max-concurrency must be between 1 and {}, got {}",
                MAX_CONCURRENCY_LIMIT, n
            )));
        }
    }

    if config.backoff_schedule_ms.is_empty() {
        return Err(ConfigError::Validation(
            "backoff-schedule-ms must contain at least one entry".to_string(),
        ));
    }

    if config.backoff_schedule_ms.len() > MAX_BACKOFF_ENTRIES {
        return Err(ConfigError::Validation(format!(
            "backoff-schedule-ms may contain at most {} entries, got {}",
            MAX_BACKOFF_ENTRIES,
            config.backoff_schedule_ms.len()
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates the seed URL and the page URL template
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    parse_http_url(&config.seed_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed-url: {}", e)))?;

    validate_template(&config.page_url_template)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid page-url-template: {}", e)))?;

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler-version cannot be empty".to_string(),
        ));
    }

    if let Some(contact) = &config.contact_url {
        parse_http_url(contact)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;
    }

    Ok(())
}

/// Validates that every selector parses
fn validate_selector_config(config: &SelectorConfig) -> Result<(), ConfigError> {
    for selector in [
        &config.record_rows,
        &config.record_cells,
        &config.last_page_link,
    ] {
        validate_selector(selector)?;
    }
    Ok(())
}

/// Parses a single CSS selector
pub(crate) fn validate_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.csv_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "csv-path cannot be empty".to_string(),
        ));
    }

    if let Some(summary) = &config.summary_path {
        if summary.trim().is_empty() {
            return Err(ConfigError::Validation(
                "summary-path cannot be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crawler(max_concurrency: Option<u32>, schedule: Vec<u64>) -> CrawlerConfig {
        CrawlerConfig {
            max_concurrency,
            backoff_schedule_ms: schedule,
            ..CrawlerConfig::default()
        }
    }

    #[test]
    fn test_validate_crawler_config() {
        assert!(validate_crawler_config(&crawler(Some(8), vec![10, 20])).is_ok());
        assert!(validate_crawler_config(&crawler(None, vec![10])).is_ok());

        assert!(validate_crawler_config(&crawler(Some(0), vec![10])).is_err());
        assert!(validate_crawler_config(&crawler(Some(257), vec![10])).is_err());
        assert!(validate_crawler_config(&crawler(Some(4), vec![])).is_err());
        assert!(validate_crawler_config(&crawler(Some(4), vec![1; 33])).is_err());
    }

    #[test]
    fn test_validate_source_config() {
        let ok = SourceConfig {
            seed_url: "https://mirror-h.org/search/country/VN/pages".to_string(),
            page_url_template: "https://mirror-h.org/search/country/VN/pages/{page}".to_string(),
        };
        assert!(validate_source_config(&ok).is_ok());

        let no_placeholder = SourceConfig {
            page_url_template: "https://mirror-h.org/search/country/VN/pages/".to_string(),
            ..ok.clone()
        };
        assert!(matches!(
            validate_source_config(&no_placeholder),
            Err(ConfigError::InvalidUrl(_))
        ));

        let bad_seed = SourceConfig {
            seed_url: "mirror-h.org".to_string(),
            ..ok
        };
        assert!(validate_source_config(&bad_seed).is_err());
    }

    #[test]
    fn test_validate_selector() {
        assert!(validate_selector("ul.pagination li:last-child a").is_ok());
        assert!(matches!(
            validate_selector("table["),
            Err(ConfigError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn test_validate_user_agent_name() {
        let mut ua = UserAgentConfig {
            crawler_name: "deface-harvest".to_string(),
            crawler_version: "0.1.0".to_string(),
            contact_url: None,
        };
        assert!(validate_user_agent_config(&ua).is_ok());

        ua.crawler_name = "bad name".to_string();
        assert!(validate_user_agent_config(&ua).is_err());

        ua.crawler_name = String::new();
        assert!(validate_user_agent_config(&ua).is_err());
    }
}
