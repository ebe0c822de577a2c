use rand::seq::SliceRandom;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::path::Path;

/// Built-in user agents for rotation
///
/// Recent desktop browsers across the three major families. The pool can be
/// extended from a file, but this list is always available as a fallback.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:120.0) Gecko/20100101 Firefox/120.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:120.0) Gecko/20100101 Firefox/120.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64; rv:120.0) Gecko/20100101 Firefox/120.0",
];

/// Browser family a user-agent belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Chrome,
    Firefox,
    Safari,
}

impl Family {
    /// Classifies a user-agent string
    ///
    /// Chrome UAs contain "Safari" too, so Chrome is checked first; anything
    /// unrecognized is treated as Chrome, the most common family.
    fn of(user_agent: &str) -> Self {
        if user_agent.contains("Chrome/") {
            Family::Chrome
        } else if user_agent.contains("Firefox/") {
            Family::Firefox
        } else if user_agent.contains("Safari/") {
            Family::Safari
        } else {
            Family::Chrome
        }
    }
}

/// A user-agent plus its matching header bundle
#[derive(Debug, Clone)]
pub struct Identity {
    /// The User-Agent string presented to the server
    pub user_agent: String,

    /// Headers consistent with the user-agent family (not including
    /// User-Agent itself)
    pub headers: HeaderMap,
}

/// Pool of identities for session rotation
///
/// The pool is stateless from the caller's perspective: `next_identity` can be
/// called at any time and always succeeds.
#[derive(Debug, Clone)]
pub struct IdentityPool {
    user_agents: Vec<String>,
}

impl IdentityPool {
    /// Creates a pool from the built-in user agents
    pub fn new() -> Self {
        Self {
            user_agents: USER_AGENTS.iter().map(|ua| ua.to_string()).collect(),
        }
    }

    /// Creates a pool extended from a newline-separated user-agent file
    ///
    /// A missing or unreadable file degrades to the built-in pool with a
    /// warning; this constructor never fails.
    pub fn with_user_agents_file(path: &Path) -> Self {
        let mut pool = Self::new();

        match std::fs::read_to_string(path) {
            Ok(content) => {
                let extra: Vec<String> = content
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty() && !line.starts_with('#'))
                    .map(str::to_string)
                    .collect();
                tracing::info!(
                    "Loaded {} extra user agents from {}",
                    extra.len(),
                    path.display()
                );
                pool.user_agents.extend(extra);
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to read user agents from {}: {}. Using built-in pool",
                    path.display(),
                    e
                );
            }
        }

        pool
    }

    /// Returns a randomly chosen identity with a family-coherent header bundle
    pub fn next_identity(&self) -> Identity {
        let mut rng = rand::thread_rng();
        // The pool is never empty: construction always seeds the built-ins
        let user_agent = self
            .user_agents
            .choose(&mut rng)
            .map(String::as_str)
            .unwrap_or(USER_AGENTS[0])
            .to_string();

        let headers = build_headers(&user_agent);

        Identity {
            user_agent,
            headers,
        }
    }

    /// Number of user agents available for rotation
    pub fn len(&self) -> usize {
        self.user_agents.len()
    }

    /// Whether the pool is empty (never true for constructed pools)
    pub fn is_empty(&self) -> bool {
        self.user_agents.is_empty()
    }
}

impl Default for IdentityPool {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the header bundle matching a user-agent's browser family
fn build_headers(user_agent: &str) -> HeaderMap {
    let family = Family::of(user_agent);
    let mut headers = HeaderMap::new();

    let accept = match family {
        Family::Chrome => {
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8"
        }
        Family::Firefox => {
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8"
        }
        Family::Safari => "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
    };
    insert(&mut headers, "accept", accept);

    // Target sites are French government portals
    insert(&mut headers, "accept-language", "fr-FR,fr;q=0.9,en;q=0.8");
    insert(&mut headers, "accept-encoding", "gzip, deflate, br");
    insert(&mut headers, "dnt", "1");
    insert(&mut headers, "connection", "keep-alive");
    insert(&mut headers, "upgrade-insecure-requests", "1");

    // Sec-Fetch metadata is sent by Chrome and Firefox but not Safari
    if family != Family::Safari {
        insert(&mut headers, "sec-fetch-dest", "document");
        insert(&mut headers, "sec-fetch-mode", "navigate");
        insert(&mut headers, "sec-fetch-site", "none");
    }

    insert(&mut headers, "cache-control", "max-age=0");

    headers
}

/// Inserts a static header, skipping values that fail validation
fn insert(headers: &mut HeaderMap, name: &'static str, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(HeaderName::from_static(name), value);
    }
}
