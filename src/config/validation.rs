use crate::config::types::{Config, CrawlConfig, ThrottleConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_config(&config.crawl)?;
    validate_throttle_config(&config.throttle)?;
    Ok(())
}

/// Validates fetch and orchestration configuration
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if let Some(allowance) = config.rate_limit_attempts {
        if allowance < 1 {
            return Err(ConfigError::Validation(format!(
                "rate_limit_attempts must be >= 1 when set, got {}",
                allowance
            )));
        }
    }

    if config.backoff_cap_ms < config.backoff_base_ms {
        return Err(ConfigError::Validation(format!(
            "backoff_cap_ms ({}) must be >= backoff_base_ms ({})",
            config.backoff_cap_ms, config.backoff_base_ms
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    if config.session_rotation_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "session_rotation_pages must be >= 1, got {}",
            config.session_rotation_pages
        )));
    }

    if config.page_step < 1 {
        return Err(ConfigError::Validation(format!(
            "page_step must be >= 1, got {}",
            config.page_step
        )));
    }

    Ok(())
}

/// Validates throttle configuration
fn validate_throttle_config(config: &ThrottleConfig) -> Result<(), ConfigError> {
    if config.max_delay_ms < config.min_delay_ms {
        return Err(ConfigError::Validation(format!(
            "throttle max_delay_ms ({}) must be >= min_delay_ms ({})",
            config.max_delay_ms, config.min_delay_ms
        )));
    }

    Ok(())
}
