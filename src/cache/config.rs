//! Cache configuration.

use std::num::NonZeroUsize;
use std::time::Duration;

const DEFAULT_OPERATION_TIMEOUT_MS: u64 = 500;
const DEFAULT_WARM_CONCURRENCY: usize = 8;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Redis connection URL; `None` keeps the cache in process memory.
    pub url: Option<String>,
    /// Deadline applied to every individual cache call.
    pub operation_timeout: Duration,
    /// Copy the relational store into the cache before serving.
    pub warm_on_startup: bool,
    /// Maximum concurrent writes while warming.
    pub warm_concurrency: NonZeroUsize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: None,
            operation_timeout: Duration::from_millis(DEFAULT_OPERATION_TIMEOUT_MS),
            warm_on_startup: true,
            warm_concurrency: NonZeroUsize::new(DEFAULT_WARM_CONCURRENCY)
                .unwrap_or(NonZeroUsize::MIN),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            url: settings.url.clone(),
            operation_timeout: settings.operation_timeout,
            warm_on_startup: settings.warm_on_startup,
            warm_concurrency: settings.warm_concurrency,
        }
    }
}

impl CacheConfig {
    pub fn uses_redis(&self) -> bool {
        self.url.is_some()
    }
}
