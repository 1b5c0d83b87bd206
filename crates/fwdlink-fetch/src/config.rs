//! Fetcher configuration.

use std::time::Duration;

/// Default `User-Agent` header.
pub const DEFAULT_USER_AGENT: &str = "ForwardLinkBot/0.1";

/// Default body cap: 2 MiB. Longer bodies are truncated, not rejected.
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Settings for [`HttpPageFetcher`](crate::HttpPageFetcher).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    pub user_agent: String,
    /// Retries after the first attempt, on connection failures only.
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub max_body_bytes: usize,
    /// Maximum redirects followed.
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_retries: 2,
            retry_base_delay: Duration::from_millis(200),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            max_redirects: 5,
        }
    }
}
