//! Inter-request throttling
//!
//! Requests are spaced out by a random delay drawn from a bounded uniform
//! range. Randomized spacing makes the crawl look less mechanical than a fixed
//! interval would; the range defaults to 0.5–2.5 seconds.

use crate::config::ThrottleConfig;
use rand::Rng;
use std::time::Duration;

/// Computes and enforces delays between requests
///
/// Holds only the configured range; every delay is drawn independently.
#[derive(Debug, Clone)]
pub struct Throttle {
    min_delay: Duration,
    max_delay: Duration,
}

impl Throttle {
    /// Creates a throttle from the configured bounds
    pub fn new(config: &ThrottleConfig) -> Self {
        Self {
            min_delay: Duration::from_millis(config.min_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }

    /// Draws the delay to apply before the next request
    ///
    /// Uniform in `[min_delay, max_delay]`.
    pub fn delay_for_next_request(&self) -> Duration {
        if self.max_delay <= self.min_delay {
            return self.min_delay;
        }
        let mut rng = rand::thread_rng();
        let millis = rng.gen_range(self.min_delay.as_millis()..=self.max_delay.as_millis());
        Duration::from_millis(millis as u64)
    }

    /// Suspends the caller for one throttle delay
    pub async fn wait(&self) {
        let delay = self.delay_for_next_request();
        tracing::trace!("Throttling for {:?}", delay);
        tokio::time::sleep(delay).await;
    }

    /// Upper bound of the throttle range
    ///
    /// Retry backoff must never wait less than this, or a retry would arrive
    /// faster than an ordinary request.
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }
}
