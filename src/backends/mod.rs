//! Backends module - fetch drivers and environment checks
//!
//! Provides:
//! - gist, raw, release, web: network drivers built on `http`
//! - local: copies from the local filesystem
//! - git: clones/updates repositories via the git executable
//! - doctor: dependency checking

pub mod doctor;
pub mod gist;
pub mod git;
pub mod http;
pub mod local;
pub mod raw;
pub mod release;
pub mod web;

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::cache::kind::ResourceKind;
use crate::cache::resource::Resource;
use crate::core::error::{FetchError, FetchResult};
use self::http::HttpClient;

/// Default GitHub REST API base
pub const GITHUB_API: &str = "https://api.github.com";

/// Shared state handed to every driver
#[derive(Debug, Clone)]
pub struct FetchContext {
    pub http: HttpClient,
    /// GitHub REST API base, without a trailing slash
    pub api_url: String,
    /// Per-fetch timeout; HTTP requests use it directly, git derives
    /// its low-speed abort from it
    pub timeout: Duration,
}

impl FetchContext {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> FetchResult<Self> {
        Ok(Self {
            http: HttpClient::new(timeout)?,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// Context for tests against loopback servers
    #[cfg(test)]
    pub fn direct(api_url: impl Into<String>) -> Self {
        let timeout = Duration::from_secs(10);
        Self {
            http: HttpClient::direct(timeout).unwrap(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }
}

/// Materializes one kind of resource into an item directory
pub trait Fetcher {
    fn kind(&self) -> ResourceKind;

    /// Populate `dest` with the resource's content, replacing what was there
    fn fetch(&self, ctx: &FetchContext, resource: &Resource, dest: &Path) -> FetchResult<()>;
}

/// Maps each kind to its driver
pub struct FetcherRegistry {
    fetchers: HashMap<ResourceKind, Box<dyn Fetcher>>,
}

impl Default for FetcherRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl FetcherRegistry {
    pub fn empty() -> Self {
        Self {
            fetchers: HashMap::new(),
        }
    }

    /// Registry with the built-in driver for every kind
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(gist::GistFetcher));
        registry.register(Box::new(raw::RawFileFetcher));
        registry.register(Box::new(release::ReleaseFetcher));
        registry.register(Box::new(web::WebFetcher));
        registry.register(Box::new(local::LocalFetcher));
        registry.register(Box::new(git::GitFetcher));
        registry
    }

    /// Register (or replace) the driver for its kind
    pub fn register(&mut self, fetcher: Box<dyn Fetcher>) {
        self.fetchers.insert(fetcher.kind(), fetcher);
    }

    pub fn get(&self, kind: ResourceKind) -> FetchResult<&dyn Fetcher> {
        self.fetchers
            .get(&kind)
            .map(|f| f.as_ref())
            .ok_or(FetchError::Unsupported(kind))
    }
}

/// Build `dest`'s new content in a sibling staging directory and swap it
/// in only when `fill` succeeds. `dest` exists afterwards either way.
pub fn replace_dir(dest: &Path, fill: impl FnOnce(&Path) -> FetchResult<()>) -> FetchResult<()> {
    let name = dest
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("item");
    let staging = dest.with_file_name(format!(".{}.partial", name));

    if staging.exists() {
        fs::remove_dir_all(&staging)
            .map_err(|e| FetchError::io(format!("Failed to clear {}", staging.display()), e))?;
    }
    fs::create_dir_all(&staging)
        .map_err(|e| FetchError::io(format!("Failed to create {}", staging.display()), e))?;

    if let Err(e) = fill(&staging) {
        let _ = fs::remove_dir_all(&staging);
        fs::create_dir_all(dest)
            .map_err(|e| FetchError::io(format!("Failed to create {}", dest.display()), e))?;
        return Err(e);
    }

    if dest.exists() {
        fs::remove_dir_all(dest)
            .map_err(|e| FetchError::io(format!("Failed to clear {}", dest.display()), e))?;
    }
    fs::rename(&staging, dest)
        .map_err(|e| FetchError::io(format!("Failed to move content into {}", dest.display()), e))?;
    Ok(())
}

/// File name for content downloaded from `url`: the last path segment,
/// or `index.html` when the URL has none
pub fn file_name_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .and_then(|segment| safe_file_name(&segment))
        .unwrap_or_else(|| "index.html".to_string())
}

/// Reduce a remote-supplied name to a plain file name, rejecting
/// anything that could escape the item directory
pub fn safe_file_name(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next()?;
    match base {
        "" | "." | ".." => None,
        other => Some(other.to_string()),
    }
}
