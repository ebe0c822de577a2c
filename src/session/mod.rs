//! Resilient HTTP session
//!
//! This module owns everything between "fetch this URL" and the network:
//! - Cookie persistence across requests, with periodic jar replacement
//! - Identity rotation (user-agent + header bundle) every N successful pages
//! - Proxy configuration read once from the environment
//! - Throttled request pacing
//! - The retry/backoff state machine around a single logical fetch
//!
//! Callers see only `fetch(request) -> FetchOutcome`; retries, backoff waits
//! and identity hygiene are invisible to them.

mod outcome;
mod resilient;

pub use outcome::{FetchOutcome, FetchRequest};
pub use resilient::{ProxyConfig, ResilientSession};
