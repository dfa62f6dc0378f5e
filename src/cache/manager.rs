//! Cache manager - lookup-or-create, staleness checks, removal and purge
//!
//! The manager borrows an open `Store` for its lifetime and is the only
//! component that mutates it. Everything runs synchronously: one fetch at
//! a time, in the calling thread.

use chrono::Utc;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::backends::{FetchContext, FetcherRegistry};
use crate::cache::item::{CacheItem, DEFAULT_CHECK_INTERVAL};
use crate::cache::kind::ResourceKind;
use crate::cache::params::Params;
use crate::cache::resolve::resolve;
use crate::cache::resource::Resource;
use crate::cache::store::Store;
use crate::core::error::{CacheError, CacheResult};
use crate::core::paths::{is_dir_empty, CacheLayout};
use crate::core::util::new_id;

/// Minimum length of a short id accepted by `query`
const MIN_SHORT_ID: usize = 4;

/// Options for [`CacheManager::cache_or_get`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
    /// Run a conditional `check` when the item already exists
    pub check_on_hit: bool,
    /// Interval (seconds) recorded on newly created items
    pub interval: Option<u64>,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            check_on_hit: true,
            interval: Some(DEFAULT_CHECK_INTERVAL),
        }
    }
}

pub struct CacheManager<'s> {
    store: &'s mut Store,
    layout: CacheLayout,
    registry: FetcherRegistry,
    ctx: FetchContext,
}

impl<'s> CacheManager<'s> {
    pub fn new(store: &'s mut Store, layout: CacheLayout, ctx: FetchContext) -> Self {
        Self {
            store,
            layout,
            registry: FetcherRegistry::with_defaults(),
            ctx,
        }
    }

    /// Replace the driver registry
    #[cfg(test)]
    pub fn with_registry(mut self, registry: FetcherRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn layout(&self) -> &CacheLayout {
        &self.layout
    }

    /// Items in insertion order, optionally of one kind
    pub fn iter(&self, kind: Option<ResourceKind>) -> impl Iterator<Item = (&str, &CacheItem)> + '_ {
        self.store.iter(kind)
    }

    pub fn get(&self, id: &str) -> Option<&CacheItem> {
        self.store.get(id)
    }

    /// Id of the item whose canonical resource equals `resource`
    pub fn find(&self, resource: &Resource) -> Option<&str> {
        self.store
            .iter(Some(resource.kind()))
            .find(|(_, item)| item.resource == *resource)
            .map(|(id, _)| id)
    }

    /// Resolve `params` and return the matching item's id, creating and
    /// fetching the item when none exists.
    ///
    /// Resolution errors abort before the store is touched. A failed
    /// initial fetch keeps the new record so a later `check` can retry.
    pub fn cache_or_get(
        &mut self,
        kind: ResourceKind,
        params: &Params,
        options: CacheOptions,
    ) -> CacheResult<String> {
        let resource = resolve(kind, params)?;

        if let Some(id) = self.find(&resource).map(String::from) {
            debug!(%id, %kind, "Cache hit");
            if options.check_on_hit {
                self.check(&id, false)?;
            }
            return Ok(id);
        }

        let id = new_id();
        info!(%id, %kind, signature = %resource.signature(), "Caching new item");
        self.store
            .put(&id, CacheItem::new(resource, options.interval))?;
        self.renew(&id)?;
        Ok(id)
    }

    /// Whether `check(id, force)` would refresh right now
    pub fn needs_refresh(&self, id: &str, force: bool) -> CacheResult<bool> {
        let item = self
            .store
            .get(id)
            .ok_or_else(|| CacheError::not_found(format!("item {}", id)))?;

        Ok(force || is_dir_empty(&self.layout.item_dir(id)) || item.is_due(Utc::now()))
    }

    /// Refresh the item when forced, when its directory is empty, or when
    /// its interval has elapsed. Returns whether a refresh happened.
    pub fn check(&mut self, id: &str, force: bool) -> CacheResult<bool> {
        if !self.needs_refresh(id, force)? {
            info!(%id, "Item is not due for checking");
            return Ok(false);
        }
        self.renew(id)?;
        Ok(true)
    }

    /// Run the item's driver unconditionally and stamp `last_checked`
    fn renew(&mut self, id: &str) -> CacheResult<()> {
        let mut item = self
            .store
            .get(id)
            .cloned()
            .ok_or_else(|| CacheError::not_found(format!("item {}", id)))?;
        let kind = item.kind();
        let dir = self.layout.item_dir(id);

        fs::create_dir_all(&dir)
            .map_err(|e| CacheError::io(format!("Failed to create {}", dir.display()), e))?;

        let fetched = self
            .registry
            .get(kind)
            .and_then(|fetcher| fetcher.fetch(&self.ctx, &item.resource, &dir));
        if let Err(source) = fetched {
            warn!(%id, %kind, error = %source, "Fetch failed");
            return Err(CacheError::Fetch {
                id: id.to_string(),
                kind,
                source,
            });
        }

        item.last_checked = Some(Utc::now());
        self.store.put(id, item)?;
        info!(%id, %kind, "Refreshed item");
        Ok(())
    }

    /// Delete the record and its directory
    pub fn remove(&mut self, id: &str) -> CacheResult<CacheItem> {
        let item = self.store.delete(id)?;
        let dir = self.layout.item_dir(id);
        remove_dir_if_present(&dir)?;
        info!(%id, "Removed item");
        Ok(item)
    }

    /// Clear the store and recreate an empty cache root
    pub fn purge(&mut self) -> CacheResult<()> {
        self.store.clear()?;
        let root = self.layout.cache_dir();
        remove_dir_if_present(&root)?;
        fs::create_dir_all(&root)
            .map_err(|e| CacheError::io(format!("Failed to create {}", root.display()), e))?;
        info!(root = %root.display(), "Purged cache");
        Ok(())
    }

    /// Entries under the cache root that no record refers to, sorted
    pub fn orphans(&self) -> CacheResult<Vec<String>> {
        orphan_entries(&self.layout.cache_dir(), &*self.store)
    }

    /// Delete the given orphan entries; referenced ids are left alone.
    /// Returns how many were removed.
    pub fn remove_orphans(&self, names: &[String]) -> CacheResult<usize> {
        let root = self.layout.cache_dir();
        let mut removed = 0;
        for name in names {
            if self.store.contains(name) {
                continue;
            }
            let path = root.join(name);
            if path.is_dir() {
                remove_dir_if_present(&path)?;
            } else if path.exists() {
                fs::remove_file(&path)
                    .map_err(|e| CacheError::io(format!("Failed to remove {}", path.display()), e))?;
            } else {
                continue;
            }
            debug!(orphan = %name, "Removed orphan");
            removed += 1;
        }
        Ok(removed)
    }

    /// Find an item by id, by `kind/<id, short id or field value>`, or by
    /// any canonical field value
    pub fn query(&self, query: &str) -> Option<(&str, &CacheItem)> {
        if let Some((id, item)) = self.store.iter(None).find(|(id, _)| *id == query) {
            return Some((id, item));
        }

        for kind in ResourceKind::ALL {
            let rest = query
                .strip_prefix(kind.as_str())
                .or_else(|| query.strip_prefix(kind.alias()))
                .and_then(|r| r.strip_prefix('/'));
            let Some(rest) = rest else {
                continue;
            };
            let hit = self.store.iter(Some(kind)).find(|(id, item)| {
                id_matches(id, rest) || item.resource.has_field_value(rest)
            });
            if hit.is_some() {
                return hit;
            }
        }

        self.store
            .iter(None)
            .find(|(_, item)| item.resource.has_field_value(query))
    }

    /// Content directory of an item
    pub fn path_of(&self, id: &str) -> CacheResult<PathBuf> {
        if !self.store.contains(id) {
            return Err(CacheError::not_found(format!("item {}", id)));
        }
        Ok(self.layout.item_dir(id))
    }
}

/// Names under `root` that `store` has no record for, sorted.
/// A missing root has no orphans.
pub fn orphan_entries(root: &Path, store: &Store) -> CacheResult<Vec<String>> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(CacheError::io(format!("Failed to read {}", root.display()), e)),
    };

    let mut orphans: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .filter(|name| !store.contains(name))
        .collect();
    orphans.sort();
    Ok(orphans)
}

fn id_matches(id: &str, candidate: &str) -> bool {
    id == candidate
        || (candidate.len() >= MIN_SHORT_ID && (id.starts_with(candidate) || id.ends_with(candidate)))
}

fn remove_dir_if_present(dir: &Path) -> CacheResult<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CacheError::io(format!("Failed to remove {}", dir.display()), e)),
    }
}
