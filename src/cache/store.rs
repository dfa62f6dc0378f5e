//! Cache store - persistent id -> CacheItem mapping
//!
//! The whole document is rewritten on every mutation: serialized to a
//! temporary sibling file, then renamed over `cache.json` while an
//! exclusive lock is held on `cache.lock`. The store assumes a single
//! writer per process; the lock only keeps concurrent invocations from
//! interleaving their rewrites.

use fs4::fs_std::FileExt;
use indexmap::IndexMap;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::cache::item::CacheItem;
use crate::cache::kind::ResourceKind;
use crate::core::error::{CacheError, CacheResult};
use crate::core::paths::LOCK_FILE;

/// Open handle on the store document
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    items: IndexMap<String, CacheItem>,
}

impl Store {
    /// Load the document at `path`; a missing file is an empty store
    pub fn open(path: impl Into<PathBuf>) -> CacheResult<Self> {
        let path = path.into();
        let items = if path.exists() {
            let content = fs::read_to_string(&path)
                .map_err(|e| CacheError::io(format!("Failed to read {}", path.display()), e))?;
            if content.trim().is_empty() {
                IndexMap::new()
            } else {
                serde_json::from_str(&content).map_err(|source| CacheError::Json {
                    path: path.clone(),
                    source,
                })?
            }
        } else {
            IndexMap::new()
        };

        debug!(path = %path.display(), items = items.len(), "Opened cache store");
        Ok(Self { path, items })
    }

    pub fn get(&self, id: &str) -> Option<&CacheItem> {
        self.items.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Insert or replace an item and persist
    pub fn put(&mut self, id: impl Into<String>, item: CacheItem) -> CacheResult<()> {
        self.items.insert(id.into(), item);
        self.flush()
    }

    /// Remove an item and persist; `NotFound` when absent
    pub fn delete(&mut self, id: &str) -> CacheResult<CacheItem> {
        let item = self
            .items
            .shift_remove(id)
            .ok_or_else(|| CacheError::not_found(format!("item {}", id)))?;
        self.flush()?;
        Ok(item)
    }

    /// Remove every item and persist
    pub fn clear(&mut self) -> CacheResult<()> {
        self.items.clear();
        self.flush()
    }

    /// Iterate `(id, item)` pairs in insertion order, optionally by kind
    pub fn iter(
        &self,
        kind: Option<ResourceKind>,
    ) -> impl Iterator<Item = (&str, &CacheItem)> + '_ {
        self.items
            .iter()
            .filter(move |(_, item)| kind.map(|k| item.kind() == k).unwrap_or(true))
            .map(|(id, item)| (id.as_str(), item))
    }

    /// Rewrite the document atomically
    pub fn flush(&self) -> CacheResult<()> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)
            .map_err(|e| CacheError::io(format!("Failed to create {}", parent.display()), e))?;

        let lock_path = parent.join(LOCK_FILE);
        let lock = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|source| CacheError::Lock {
                path: lock_path.clone(),
                source,
            })?;
        lock.lock_exclusive().map_err(|source| CacheError::Lock {
            path: lock_path.clone(),
            source,
        })?;

        let json = serde_json::to_string_pretty(&self.items).map_err(|source| CacheError::Json {
            path: self.path.clone(),
            source,
        })?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .map_err(|e| CacheError::io(format!("Failed to write {}", tmp.display()), e))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| CacheError::io(format!("Failed to replace {}", self.path.display()), e))?;

        debug!(path = %self.path.display(), items = self.items.len(), "Flushed cache store");
        // lock released when `lock` is dropped
        drop(lock);
        Ok(())
    }
}
