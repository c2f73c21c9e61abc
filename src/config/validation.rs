use crate::config::types::{Config, LookupConfig, OutputConfig, ScraperConfig, SourceConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scraper_config(&config.scraper)?;
    validate_source_config(&config.source)?;
    validate_output_config(&config.output)?;
    validate_lookup_config(&config.lookup)?;
    Ok(())
}

/// Validates scheduler configuration
fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_fetches < 1 || config.max_concurrent_fetches > 16 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_fetches must be between 1 and 16, got {}",
            config.max_concurrent_fetches
        )));
    }

    if config.dispatch_delay_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "dispatch_delay_ms must be >= 100ms, got {}ms",
            config.dispatch_delay_ms
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.delivery_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "delivery_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.result_buffer < 1 {
        return Err(ConfigError::Validation(
            "result_buffer must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates documentation host configuration
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            config.base_url
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' has no host",
            config.base_url
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_lookup_config(config: &LookupConfig) -> Result<(), ConfigError> {
    if config.cache_capacity < 1 {
        return Err(ConfigError::Validation(
            "cache_capacity must be >= 1".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scraper() -> ScraperConfig {
        ScraperConfig {
            max_concurrent_fetches: 3,
            dispatch_delay_ms: 2000,
            request_timeout_secs: 30,
            delivery_timeout_secs: 60,
            result_buffer: 8,
        }
    }

    fn source(base_url: &str) -> SourceConfig {
        SourceConfig {
            base_url: base_url.to_string(),
            user_agent: "ntdocs/0.1".to_string(),
        }
    }

    #[test]
    fn test_validate_scraper_config() {
        assert!(validate_scraper_config(&scraper()).is_ok());

        let mut zero_workers = scraper();
        zero_workers.max_concurrent_fetches = 0;
        assert!(validate_scraper_config(&zero_workers).is_err());

        let mut too_fast = scraper();
        too_fast.dispatch_delay_ms = 10;
        assert!(validate_scraper_config(&too_fast).is_err());

        let mut no_buffer = scraper();
        no_buffer.result_buffer = 0;
        assert!(validate_scraper_config(&no_buffer).is_err());
    }

    #[test]
    fn test_validate_source_config() {
        assert!(validate_source_config(&source("https://learn.microsoft.com/en-us")).is_ok());
        assert!(validate_source_config(&source("http://127.0.0.1:8080")).is_ok());

        assert!(validate_source_config(&source("not a url")).is_err());
        assert!(validate_source_config(&source("ftp://example.com/")).is_err());

        let mut anonymous = source("https://learn.microsoft.com/en-us");
        anonymous.user_agent = "  ".to_string();
        assert!(validate_source_config(&anonymous).is_err());
    }

    #[test]
    fn test_validate_lookup_config() {
        assert!(validate_lookup_config(&LookupConfig::default()).is_ok());
        assert!(validate_lookup_config(&LookupConfig { cache_capacity: 0 }).is_err());
    }
}
