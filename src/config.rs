//! Loader configuration
//!
//! A fixed set of named options with env-backed defaults, shared by the OLS
//! client, the retry gateway and the loading orchestration.

use std::time::Duration;

/// Default OLS API root, overridable through `OLS_BASE_URL`.
pub const DEFAULT_BASE_URL: &str = "https://www.ebi.ac.uk/ols/api";

/// Configuration for an [`OlsLoader`](crate::loader::OlsLoader) instance.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Root URL of the OLS REST API.
    pub base_url: String,
    /// Schema version tag recorded by `init_meta` (from `ENS_VERSION`).
    pub db_version: Option<String>,
    /// Destructive reload: wipe prior ontology state and its meta rows
    /// before loading. Defaults to an in-place update.
    pub wipe: bool,
    /// Total attempts made against the remote source before a network
    /// failure is surfaced to the caller.
    pub max_retry: u32,
    /// HTTP request timeout.
    pub timeout: Duration,
    /// Pause between retry attempts after a network failure.
    pub retry_wait: Duration,
    /// Page size used when draining the paginated term listing.
    pub page_size: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("OLS_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            db_version: std::env::var("ENS_VERSION").ok(),
            wipe: false,
            max_retry: 5,
            timeout: Duration::from_secs(720),
            retry_wait: Duration::from_secs(5),
            page_size: 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = LoaderConfig::default();
        assert!(!config.wipe);
        assert_eq!(config.max_retry, 5);
        assert_eq!(config.timeout, Duration::from_secs(720));
        assert_eq!(config.retry_wait, Duration::from_secs(5));
        assert_eq!(config.page_size, 500);
    }
}
