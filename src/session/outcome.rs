use reqwest::header::HeaderMap;
use reqwest::Method;
use std::time::Duration;

/// One logical fetch to perform
///
/// Constructed per call; attempt-level details (identity, cookies, backoff)
/// are the session's business.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Absolute URL to fetch
    pub url: String,

    /// HTTP method (GET for all crawl traffic today)
    pub method: Method,

    /// Extra headers layered over the session identity's bundle
    pub header_overrides: HeaderMap,

    /// Overrides the session's default per-request timeout when set
    pub timeout: Option<Duration>,
}

impl FetchRequest {
    /// A plain GET request with no overrides
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::GET,
            header_overrides: HeaderMap::new(),
            timeout: None,
        }
    }

    /// Sets a per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Terminal result of one logical fetch
///
/// Built once by the session and never mutated. `RateLimited` and
/// `TransientFailure` only reach the caller after the retry budget is
/// exhausted; `PermanentFailure` is returned immediately.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The request succeeded
    Success {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
        /// Response headers
        headers: HeaderMap,
    },

    /// The server signalled rate limiting (HTTP 429)
    RateLimited {
        /// Server-provided Retry-After hint, if parseable
        retry_after: Option<Duration>,
    },

    /// A retryable failure: network error, timeout, or 5xx
    TransientFailure {
        /// Error description
        cause: String,
    },

    /// A non-retryable failure: 4xx other than 429, or malformed response
    PermanentFailure {
        /// Error description
        cause: String,
    },
}

impl FetchOutcome {
    /// Whether this outcome is a success
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }

    /// Whether another attempt could change this outcome
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchOutcome::RateLimited { .. } | FetchOutcome::TransientFailure { .. }
        )
    }

    /// Short label for logging
    pub fn label(&self) -> &'static str {
        match self {
            FetchOutcome::Success { .. } => "success",
            FetchOutcome::RateLimited { .. } => "rate-limited",
            FetchOutcome::TransientFailure { .. } => "transient-failure",
            FetchOutcome::PermanentFailure { .. } => "permanent-failure",
        }
    }
}
