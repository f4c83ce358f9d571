//! Response cache configuration.

use std::num::NonZeroUsize;
use std::time::Duration;

// Default values for cache configuration
const DEFAULT_FEED_TTL_SECS: u64 = 20;
const DEFAULT_RESPONSE_LIMIT: usize = 64;

/// Settings for the global-feed response cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Serve and store cached feed responses.
    pub enabled: bool,
    /// How long a cached feed rendering stays valid.
    pub feed_ttl: Duration,
    /// Maximum cached responses before LRU eviction.
    pub response_limit: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            feed_ttl: Duration::from_secs(DEFAULT_FEED_TTL_SECS),
            response_limit: DEFAULT_RESPONSE_LIMIT,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            feed_ttl: settings.ttl,
            response_limit: settings.response_limit,
        }
    }
}

impl CacheConfig {
    /// Returns the response limit as NonZeroUsize, clamping to 1 if zero.
    pub fn response_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.response_limit).unwrap_or(NonZeroUsize::MIN)
    }
}
