//! Cache item records stored in cache.json

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::kind::ResourceKind;
use crate::cache::resource::Resource;

/// Default check interval for new items (24h, in seconds)
pub const DEFAULT_CHECK_INTERVAL: u64 = 24 * 60 * 60;

/// One cached resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheItem {
    /// Kind tag plus canonical parameters; the dedup key
    pub resource: Resource,

    /// Time of the last successful fetch; `None` until the first one lands
    #[serde(default)]
    pub last_checked: Option<DateTime<Utc>>,

    /// Seconds after `last_checked` when the item becomes due.
    /// `None` means the item never goes stale on its own.
    #[serde(default)]
    pub check_interval: Option<u64>,

    pub created_at: DateTime<Utc>,
}

impl CacheItem {
    pub fn new(resource: Resource, check_interval: Option<u64>) -> Self {
        Self {
            resource,
            last_checked: None,
            check_interval,
            created_at: Utc::now(),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.resource.kind()
    }

    /// When the item becomes due, if it ever does
    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        let interval = self.check_interval?;
        let last = self.last_checked?;
        let delta = Duration::try_seconds(i64::try_from(interval).ok()?)?;
        last.checked_add_signed(delta)
    }

    /// Whether the item's interval has elapsed at `now`.
    ///
    /// An item that was never fetched successfully is always due.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        if self.last_checked.is_none() {
            return true;
        }
        self.due_at().map(|due| due <= now).unwrap_or(false)
    }
}
