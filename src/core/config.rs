//! Runtime settings assembled from global flags and their env fallbacks

use std::path::PathBuf;
use std::time::Duration;

use crate::backends::{FetchContext, GITHUB_API};
use crate::cache::item::DEFAULT_CHECK_INTERVAL;
use crate::core::error::FetchResult;
use crate::core::paths::{default_home, CacheLayout};

/// Default per-fetch timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Directory holding `cache.json` and the item directories
    pub home: PathBuf,
    pub timeout: Duration,
    /// Check interval recorded on new items; `None` never goes stale
    pub interval: Option<u64>,
    pub api_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            home: default_home(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            interval: Some(DEFAULT_CHECK_INTERVAL),
            api_url: GITHUB_API.to_string(),
        }
    }
}

impl Settings {
    /// Build settings from raw flag values; `interval_secs == 0` disables staleness
    pub fn from_args(
        home: Option<PathBuf>,
        timeout_secs: u64,
        interval_secs: u64,
        api_url: Option<String>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            home: home.unwrap_or(defaults.home),
            timeout: Duration::from_secs(timeout_secs.max(1)),
            interval: interval_from_secs(interval_secs),
            api_url: api_url.unwrap_or(defaults.api_url),
        }
    }

    pub fn layout(&self) -> CacheLayout {
        CacheLayout::new(&self.home)
    }

    pub fn fetch_context(&self) -> FetchResult<FetchContext> {
        FetchContext::new(self.api_url.clone(), self.timeout)
    }
}

/// `0` means the item is never considered stale
pub fn interval_from_secs(secs: u64) -> Option<u64> {
    (secs > 0).then_some(secs)
}
