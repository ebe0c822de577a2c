use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// Environment overrides are applied after parsing, then the merged
/// configuration is validated.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let mut config: Config = toml::from_str(&content)?;

    apply_env_overrides(&mut config)?;
    validate(&config)?;

    Ok(config)
}

/// Builds a configuration from defaults plus environment overrides only
///
/// Used when no configuration file is supplied.
pub fn config_from_env() -> Result<Config, ConfigError> {
    let mut config = Config::default();
    apply_env_overrides(&mut config)?;
    validate(&config)?;
    Ok(config)
}

/// Applies `VEILLEUR_*` environment variables on top of a parsed configuration
///
/// Recognized variables:
///
/// | Variable | Field |
/// |----------|-------|
/// | `VEILLEUR_MAX_ATTEMPTS` | `crawl.max-attempts` |
/// | `VEILLEUR_RATE_LIMIT_ATTEMPTS` | `crawl.rate-limit-attempts` |
/// | `VEILLEUR_BACKOFF_BASE_MS` | `crawl.backoff-base-ms` |
/// | `VEILLEUR_BACKOFF_CAP_MS` | `crawl.backoff-cap-ms` |
/// | `VEILLEUR_REQUEST_TIMEOUT_SECS` | `crawl.request-timeout-secs` |
/// | `VEILLEUR_SESSION_ROTATION_PAGES` | `crawl.session-rotation-pages` |
/// | `VEILLEUR_USER_AGENTS_FILE` | `crawl.user-agents-file` |
/// | `VEILLEUR_THROTTLE_MIN_MS` | `throttle.min-delay-ms` |
/// | `VEILLEUR_THROTTLE_MAX_MS` | `throttle.max-delay-ms` |
///
/// Proxy settings (`HTTP_PROXY`/`HTTPS_PROXY`) are deliberately not handled
/// here; the session reads them once at construction.
pub fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigError> {
    if let Some(v) = parse_env("VEILLEUR_MAX_ATTEMPTS")? {
        config.crawl.max_attempts = v;
    }
    if let Some(v) = parse_env("VEILLEUR_RATE_LIMIT_ATTEMPTS")? {
        config.crawl.rate_limit_attempts = Some(v);
    }
    if let Some(v) = parse_env("VEILLEUR_BACKOFF_BASE_MS")? {
        config.crawl.backoff_base_ms = v;
    }
    if let Some(v) = parse_env("VEILLEUR_BACKOFF_CAP_MS")? {
        config.crawl.backoff_cap_ms = v;
    }
    if let Some(v) = parse_env("VEILLEUR_REQUEST_TIMEOUT_SECS")? {
        config.crawl.request_timeout_secs = v;
    }
    if let Some(v) = parse_env("VEILLEUR_SESSION_ROTATION_PAGES")? {
        config.crawl.session_rotation_pages = v;
    }
    if let Ok(path) = std::env::var("VEILLEUR_USER_AGENTS_FILE") {
        if !path.is_empty() {
            config.crawl.user_agents_file = Some(path);
        }
    }
    if let Some(v) = parse_env("VEILLEUR_THROTTLE_MIN_MS")? {
        config.throttle.min_delay_ms = v;
    }
    if let Some(v) = parse_env("VEILLEUR_THROTTLE_MAX_MS")? {
        config.throttle.max_delay_ms = v;
    }
    Ok(())
}

/// Reads and parses a numeric environment variable, if present
fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(value) => {
            let parsed = value
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidOverride {
                    name: name.to_string(),
                    message: e.to_string(),
                })?;
            Ok(Some(parsed))
        }
        Err(_) => Ok(None),
    }
}
