//! Live search configuration
//!
//! Defaults match the search page; environment variables override them so the
//! terminal front end can point at another server without flags.

use std::time::Duration;

use url::Url;

use crate::interface::LiveSearchError;
use crate::models::DISPLAY_PER_CATEGORY;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);
pub const DEFAULT_LIMIT: u32 = 50;
/// Queries shorter than this (in characters) never hit the network
pub const MIN_QUERY_CHARS: usize = 2;

pub const ENV_BASE_URL: &str = "RBT_SEARCH_BASE_URL";
pub const ENV_DEBOUNCE_MS: &str = "RBT_SEARCH_DEBOUNCE_MS";
pub const ENV_LIMIT: &str = "RBT_SEARCH_LIMIT";

#[derive(Debug, Clone, PartialEq)]
pub struct LiveSearchConfig {
    /// Server root; the live endpoint is resolved against it
    pub base_url: Url,
    /// Quiet period before a keystroke turns into a request
    pub debounce: Duration,
    /// `limit` parameter sent to the server
    pub limit: u32,
    pub min_query_chars: usize,
    pub per_category: usize,
}

impl Default for LiveSearchConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            debounce: DEFAULT_DEBOUNCE,
            limit: DEFAULT_LIMIT,
            min_query_chars: MIN_QUERY_CHARS,
            per_category: DISPLAY_PER_CATEGORY,
        }
    }
}

impl LiveSearchConfig {
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, LiveSearchError> {
        self.base_url = Url::parse(base_url)?;
        Ok(self)
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Defaults overridden by `RBT_SEARCH_*` variables
    pub fn from_env() -> Result<Self, LiveSearchError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LiveSearchError> {
        let mut config = Self::default();

        if let Some(base_url) = lookup(ENV_BASE_URL) {
            config = config.with_base_url(&base_url)?;
        }
        if let Some(ms) = lookup(ENV_DEBOUNCE_MS) {
            let ms: u64 = ms.trim().parse().map_err(|_| {
                LiveSearchError::InvalidInput(format!("{} must be milliseconds, got '{}'", ENV_DEBOUNCE_MS, ms))
            })?;
            config.debounce = Duration::from_millis(ms);
        }
        if let Some(limit) = lookup(ENV_LIMIT) {
            config.limit = limit
                .trim()
                .parse()
                .ok()
                .filter(|n: &u32| *n > 0)
                .ok_or_else(|| {
                    LiveSearchError::InvalidInput(format!("{} must be a positive integer, got '{}'", ENV_LIMIT, limit))
                })?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = LiveSearchConfig::default();
        assert_eq!(config.debounce, Duration::from_millis(300));
        assert_eq!(config.limit, 50);
        assert_eq!(config.min_query_chars, 2);
        assert_eq!(config.per_category, 5);
    }

    #[test]
    fn test_env_overrides() {
        let config = LiveSearchConfig::from_lookup(lookup(&[
            (ENV_BASE_URL, "https://search.example.org"),
            (ENV_DEBOUNCE_MS, "150"),
            (ENV_LIMIT, "20"),
        ]))
        .unwrap();
        assert_eq!(config.base_url.as_str(), "https://search.example.org/");
        assert_eq!(config.debounce, Duration::from_millis(150));
        assert_eq!(config.limit, 20);
    }

    #[test]
    fn test_bad_env_values_are_rejected() {
        assert!(LiveSearchConfig::from_lookup(lookup(&[(ENV_DEBOUNCE_MS, "soon")])).is_err());
        assert!(LiveSearchConfig::from_lookup(lookup(&[(ENV_BASE_URL, "not a url")])).is_err());
    }

    #[test]
    fn test_zero_limit_is_rejected() {
        let err = LiveSearchConfig::from_lookup(lookup(&[(ENV_LIMIT, "0")])).unwrap_err();
        assert!(matches!(err, LiveSearchError::InvalidInput(ref m) if m.contains("positive")));
        assert!(LiveSearchConfig::from_lookup(lookup(&[(ENV_LIMIT, "-5")])).is_err());
    }
}
