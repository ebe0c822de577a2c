use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for veilleur
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub throttle: ThrottleConfig,
}

/// Fetch and orchestration behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Maximum number of attempts for one logical fetch
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Separate attempt allowance for HTTP 429 responses.
    ///
    /// When unset, rate-limit responses consume the shared `max-attempts`
    /// budget, matching transient failures.
    #[serde(rename = "rate-limit-attempts")]
    pub rate_limit_attempts: Option<u32>,

    /// Base delay for exponential backoff between retries (milliseconds)
    #[serde(rename = "backoff-base-ms")]
    pub backoff_base_ms: u64,

    /// Upper bound on any single backoff wait (milliseconds)
    #[serde(rename = "backoff-cap-ms")]
    pub backoff_cap_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Successful pages between session resets (cookie jar + identity)
    #[serde(rename = "session-rotation-pages")]
    pub session_rotation_pages: u32,

    /// Result pagination advances by this many entries per page
    #[serde(rename = "page-step")]
    pub page_step: u32,

    /// Pagination stops once the offset exceeds this value
    #[serde(rename = "max-offset")]
    pub max_offset: u32,

    /// Optional path to a newline-separated user-agent list extending the
    /// built-in identity pool
    #[serde(rename = "user-agents-file")]
    pub user_agents_file: Option<String>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            rate_limit_attempts: None,
            backoff_base_ms: 1_000,
            backoff_cap_ms: 30_000,
            request_timeout_secs: 30,
            session_rotation_pages: 5,
            page_step: 10,
            max_offset: 1_000,
            user_agents_file: None,
        }
    }
}

impl CrawlConfig {
    /// Per-request timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Backoff base delay as a `Duration`
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    /// Backoff cap as a `Duration`
    pub fn backoff_cap(&self) -> Duration {
        Duration::from_millis(self.backoff_cap_ms)
    }
}

/// Inter-request delay configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Minimum delay before a request (milliseconds)
    #[serde(rename = "min-delay-ms")]
    pub min_delay_ms: u64,

    /// Maximum delay before a request (milliseconds)
    #[serde(rename = "max-delay-ms")]
    pub max_delay_ms: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 500,
            max_delay_ms: 2_500,
        }
    }
}
