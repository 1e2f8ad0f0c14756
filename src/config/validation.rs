use crate::config::types::{ApiConfig, Config, CrawlerConfig, ResolverConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_api_config(&config.api)?;
    validate_resolver_config(&config.resolver)?;
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;
    validate_overrides(config)?;
    Ok(())
}

/// Validates API access and quota configuration
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    if config.api_key.trim().is_empty() {
        return Err(ConfigError::Validation("api-key cannot be empty".to_string()));
    }

    if config.base_url.trim().is_empty() {
        return Err(ConfigError::Validation(
            "base-url cannot be empty".to_string(),
        ));
    }

    if config.daily_quota_budget == 0 {
        return Err(ConfigError::Validation(
            "daily-quota-budget must be >= 1".to_string(),
        ));
    }

    if config.quota_safety_buffer >= config.daily_quota_budget {
        return Err(ConfigError::Validation(format!(
            "quota-safety-buffer ({}) must be smaller than daily-quota-budget ({})",
            config.quota_safety_buffer, config.daily_quota_budget
        )));
    }

    if config.max_retries < 1 {
        return Err(ConfigError::Validation(
            "max-retries must be >= 1".to_string(),
        ));
    }

    if config.retry_backoff_factor < 1.0 {
        return Err(ConfigError::Validation(format!(
            "retry-backoff-factor must be >= 1.0, got {}",
            config.retry_backoff_factor
        )));
    }

    if config.retry_max_delay_ms < config.retry_base_delay_ms {
        return Err(ConfigError::Validation(format!(
            "retry-max-delay-ms ({}ms) must be >= retry-base-delay-ms ({}ms)",
            config.retry_max_delay_ms, config.retry_base_delay_ms
        )));
    }

    Ok(())
}

/// Validates resolver configuration
fn validate_resolver_config(config: &ResolverConfig) -> Result<(), ConfigError> {
    if config.max_search_results < 1 || config.max_search_results > 50 {
        return Err(ConfigError::Validation(format!(
            "max-search-results must be between 1 and 50, got {}",
            config.max_search_results
        )));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(_config: &CrawlerConfig) -> Result<(), ConfigError> {
    // max_pages_per_run of 0 means unlimited, any u32 is valid
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &crate::config::types::OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates override entries
fn validate_overrides(config: &Config) -> Result<(), ConfigError> {
    for entry in &config.overrides {
        if entry.seed.trim().is_empty() {
            return Err(ConfigError::Validation(
                "override seed name cannot be empty".to_string(),
            ));
        }

        if entry.channel_id.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "override for '{}' has an empty channel-id",
                entry.seed
            )));
        }
    }

    Ok(())
}
