use crate::config::{CrawlConfig, ThrottleConfig};
use crate::identity::{Identity, IdentityPool};
use crate::session::{FetchOutcome, FetchRequest};
use crate::throttle::Throttle;
use reqwest::cookie::Jar;
use reqwest::header::USER_AGENT;
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Proxy settings read once at session construction
///
/// Both variables absent means the session runs proxy-less; that is not an
/// error.
#[derive(Debug, Clone, Default)]
pub struct ProxyConfig {
    pub http: Option<String>,
    pub https: Option<String>,
}

impl ProxyConfig {
    /// Reads `HTTP_PROXY`/`HTTPS_PROXY` (and lowercase variants) from the
    /// environment
    pub fn from_env() -> Self {
        Self {
            http: std::env::var("HTTP_PROXY")
                .or_else(|_| std::env::var("http_proxy"))
                .ok(),
            https: std::env::var("HTTPS_PROXY")
                .or_else(|_| std::env::var("https_proxy"))
                .ok(),
        }
    }

    /// Whether any proxy is configured
    pub fn is_configured(&self) -> bool {
        self.http.is_some() || self.https.is_some()
    }
}

/// A stateful HTTP client wrapper with retry, backoff and identity hygiene
///
/// One session serves one crawl job; sessions are never shared across jobs.
/// The session owns its cookie jar, current identity, and the page counter
/// that drives rotation. `reset` is the only operation that replaces jar and
/// identity, and it replaces both together.
pub struct ResilientSession {
    client: Client,
    identity: Identity,
    pool: IdentityPool,
    throttle: Throttle,
    config: CrawlConfig,
    proxy: ProxyConfig,
    pages_since_reset: u32,
    resets: u32,
}

impl ResilientSession {
    /// Creates a session, reading proxy configuration from the environment
    pub fn new(
        crawl: &CrawlConfig,
        throttle: &ThrottleConfig,
    ) -> Result<Self, reqwest::Error> {
        let proxy = ProxyConfig::from_env();
        if proxy.is_configured() {
            tracing::info!(
                "Proxy configured (http: {}, https: {})",
                proxy.http.is_some(),
                proxy.https.is_some()
            );
        }

        let pool = match &crawl.user_agents_file {
            Some(path) => IdentityPool::with_user_agents_file(Path::new(path)),
            None => IdentityPool::new(),
        };

        let identity = pool.next_identity();
        let client = build_client(&proxy, crawl.request_timeout())?;

        Ok(Self {
            client,
            identity,
            pool,
            throttle: Throttle::new(throttle),
            config: crawl.clone(),
            proxy,
            pages_since_reset: 0,
            resets: 0,
        })
    }

    /// Executes one logical fetch, retrying per the backoff policy
    ///
    /// Flow per attempt:
    /// 1. First attempt waits one throttle delay; retries wait the backoff
    ///    delay instead (always at least the throttle maximum).
    /// 2. HTTP 429 counts against the rate-limit allowance (the shared budget
    ///    unless a separate one is configured).
    /// 3. Network errors and 5xx count against the shared budget.
    /// 4. Other 4xx and malformed responses return immediately, no retry.
    ///
    /// On exhaustion the last retryable outcome is returned unchanged.
    /// Rotation is checked once here, before the first attempt, never between
    /// retries of the same fetch.
    pub async fn fetch(&mut self, request: &FetchRequest) -> FetchOutcome {
        self.maybe_rotate();

        let mut transient_used: u32 = 0;
        let mut rate_limit_used: u32 = 0;

        loop {
            let attempts_made = transient_used + rate_limit_used;
            if attempts_made == 0 {
                self.throttle.wait().await;
            }

            tracing::debug!(
                "Fetching {} (attempt {}/{})",
                request.url,
                attempts_made + 1,
                self.config.max_attempts
            );

            let outcome = self.attempt(request).await;

            match &outcome {
                FetchOutcome::Success { status, .. } => {
                    tracing::debug!("Fetch succeeded for {} (HTTP {})", request.url, status);
                    self.pages_since_reset += 1;
                    return outcome;
                }

                FetchOutcome::PermanentFailure { cause } => {
                    tracing::warn!("Permanent failure for {}: {}", request.url, cause);
                    return outcome;
                }

                FetchOutcome::RateLimited { retry_after } => {
                    rate_limit_used += 1;
                    if self.rate_limit_exhausted(rate_limit_used, transient_used) {
                        tracing::warn!(
                            "Rate-limit budget exhausted for {} after {} attempts",
                            request.url,
                            rate_limit_used + transient_used
                        );
                        return outcome;
                    }

                    let mut delay = self.backoff_delay(rate_limit_used + transient_used);
                    if let Some(hint) = retry_after {
                        delay = delay.max(*hint);
                    }
                    tracing::info!(
                        "Rate limited on {}, backing off {:?} before retry",
                        request.url,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }

                FetchOutcome::TransientFailure { cause } => {
                    transient_used += 1;
                    if self.transient_exhausted(rate_limit_used, transient_used) {
                        tracing::warn!(
                            "Retry budget exhausted for {} after {} attempts: {}",
                            request.url,
                            transient_used + rate_limit_used,
                            cause
                        );
                        return outcome;
                    }

                    let delay = self.backoff_delay(rate_limit_used + transient_used);
                    tracing::info!(
                        "Transient failure for {} ({}), backing off {:?} before retry",
                        request.url,
                        cause,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Issues one HTTP attempt and classifies the response
    async fn attempt(&self, request: &FetchRequest) -> FetchOutcome {
        let timeout = request.timeout.unwrap_or(self.config.request_timeout());

        let result = self
            .client
            .request(request.method.clone(), &request.url)
            .headers(self.identity.headers.clone())
            .header(USER_AGENT, self.identity.user_agent.clone())
            .headers(request.header_overrides.clone())
            .timeout(timeout)
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                return if e.is_timeout() {
                    FetchOutcome::TransientFailure {
                        cause: format!("Request timeout after {:?}", timeout),
                    }
                } else if e.is_connect() {
                    FetchOutcome::TransientFailure {
                        cause: format!("Connection error: {}", e),
                    }
                } else if e.is_redirect() {
                    FetchOutcome::PermanentFailure {
                        cause: format!("Redirect error: {}", e),
                    }
                } else {
                    FetchOutcome::TransientFailure {
                        cause: e.to_string(),
                    }
                };
            }
        };

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = parse_retry_after(response.headers());
            return FetchOutcome::RateLimited { retry_after };
        }

        if status.is_server_error() {
            return FetchOutcome::TransientFailure {
                cause: format!("HTTP {}", status.as_u16()),
            };
        }

        if status.is_client_error() {
            return FetchOutcome::PermanentFailure {
                cause: format!("HTTP {}", status.as_u16()),
            };
        }

        let headers = response.headers().clone();
        match response.text().await {
            Ok(body) => FetchOutcome::Success {
                status: status.as_u16(),
                body,
                headers,
            },
            Err(e) => FetchOutcome::TransientFailure {
                cause: format!("Failed to read body: {}", e),
            },
        }
    }

    /// Replaces the cookie jar and identity if the rotation threshold is due
    ///
    /// Called only at the start of a logical fetch.
    fn maybe_rotate(&mut self) {
        if self.pages_since_reset >= self.config.session_rotation_pages {
            self.reset();
        }
    }

    /// Replaces cookie jar and identity atomically and zeroes the page counter
    ///
    /// A client build failure keeps the previous client rather than killing
    /// the crawl; the stale identity is still a working one.
    pub fn reset(&mut self) {
        match build_client(&self.proxy, self.config.request_timeout()) {
            Ok(client) => {
                self.client = client;
                self.identity = self.pool.next_identity();
                self.pages_since_reset = 0;
                self.resets += 1;
                tracing::info!(
                    "Session reset complete (rotation #{}, new identity: {})",
                    self.resets,
                    self.identity.user_agent
                );
            }
            Err(e) => {
                tracing::warn!("Session reset failed, keeping current identity: {}", e);
            }
        }
    }

    /// Whether the rate-limit budget is spent, honoring the configured policy
    fn rate_limit_exhausted(&self, rate_limit_used: u32, transient_used: u32) -> bool {
        match self.config.rate_limit_attempts {
            // Separate allowance for 429s
            Some(allowance) => rate_limit_used >= allowance,
            // Shared budget with transient failures
            None => rate_limit_used + transient_used >= self.config.max_attempts,
        }
    }

    /// Whether the transient-failure budget is spent
    ///
    /// With a separate 429 allowance configured, rate-limited attempts do not
    /// count against the transient budget either.
    fn transient_exhausted(&self, rate_limit_used: u32, transient_used: u32) -> bool {
        match self.config.rate_limit_attempts {
            Some(_) => transient_used >= self.config.max_attempts,
            None => rate_limit_used + transient_used >= self.config.max_attempts,
        }
    }

    /// Backoff wait before the next attempt
    ///
    /// Exponential in the number of attempts already made, capped, and never
    /// below the throttle maximum so a retry is never faster than an ordinary
    /// request.
    fn backoff_delay(&self, attempts_made: u32) -> Duration {
        backoff_delay(
            self.config.backoff_base(),
            self.config.backoff_cap(),
            self.throttle.max_delay(),
            attempts_made,
        )
    }

    /// Pages fetched successfully since the last reset
    pub fn pages_since_reset(&self) -> u32 {
        self.pages_since_reset
    }

    /// Number of rotations performed so far
    pub fn resets(&self) -> u32 {
        self.resets
    }

    /// The user-agent currently presented to servers
    pub fn current_user_agent(&self) -> &str {
        &self.identity.user_agent
    }
}

/// Builds the underlying HTTP client with a fresh cookie jar
fn build_client(proxy: &ProxyConfig, timeout: Duration) -> Result<Client, reqwest::Error> {
    let jar = Arc::new(Jar::default());

    let mut builder = Client::builder()
        .cookie_provider(jar)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(5))
        .gzip(true)
        .brotli(true);

    if let Some(url) = &proxy.http {
        builder = builder.proxy(reqwest::Proxy::http(url)?);
    }
    if let Some(url) = &proxy.https {
        builder = builder.proxy(reqwest::Proxy::https(url)?);
    }

    builder.build()
}

/// Parses a Retry-After header given in seconds
///
/// HTTP-date forms are ignored; the exponential backoff covers those.
fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Computes the backoff wait after `attempts_made` failed attempts
fn backoff_delay(
    base: Duration,
    cap: Duration,
    floor: Duration,
    attempts_made: u32,
) -> Duration {
    // 2^attempts with saturation; attempts are bounded by the retry budget
    // but the shift is clamped anyway
    let factor = 1u32 << attempts_made.min(20);
    let delay = base.saturating_mul(factor).min(cap);
    delay.max(floor)
}
