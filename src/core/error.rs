//! Error taxonomy for the cache core
//!
//! `CacheError` is what the manager and resolver surface to callers.
//! `FetchError` stays inside the drivers and is wrapped with the item id
//! when it crosses into the manager.

use std::path::PathBuf;
use thiserror::Error;

use crate::cache::kind::ResourceKind;

/// Errors returned by the resolver, store and manager
#[derive(Debug, Error)]
pub enum CacheError {
    /// Malformed or insufficient input to the resolver
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// Unknown id, or a local path that does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// A driver failed to materialize an item
    #[error("fetch failed for {kind} item {id}: {source}")]
    Fetch {
        id: String,
        kind: ResourceKind,
        #[source]
        source: FetchError,
    },

    /// Filesystem failure outside of a driver
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The store document could not be parsed or written
    #[error("store document {path:?} is invalid: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The store lock could not be acquired
    #[error("failed to lock store {path:?}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CacheError {
    pub fn invalid(message: impl Into<String>) -> Self {
        CacheError::InvalidReference(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        CacheError::NotFound(message.into())
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        CacheError::Io {
            context: context.into(),
            source,
        }
    }

    /// Stable machine-readable code used in rendered error items
    pub fn code(&self) -> &'static str {
        match self {
            CacheError::InvalidReference(_) => "INVALID_REFERENCE",
            CacheError::NotFound(_) => "NOT_FOUND",
            CacheError::Fetch { .. } => "FETCH_ERROR",
            CacheError::Io { .. } => "IO_ERROR",
            CacheError::Json { .. } => "STORE_INVALID",
            CacheError::Lock { .. } => "STORE_LOCKED",
        }
    }
}

/// Errors raised while a driver materializes content
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unexpected response from {url}: {message}")]
    Json { url: String, message: String },

    #[error("git {command} failed: {stderr}")]
    Git { command: String, stderr: String },

    #[error("git executable not found in PATH")]
    MissingGit,

    #[error("release {tag} has no assets matching {patterns:?}")]
    NoMatchingAssets { tag: String, patterns: Vec<String> },

    #[error("invalid asset pattern {pattern:?}: {message}")]
    Pattern { pattern: String, message: String },

    #[error("no fetcher registered for {0}")]
    Unsupported(ResourceKind),

    #[error("resource does not match the {0} fetcher")]
    Mismatch(ResourceKind),
}

impl FetchError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        FetchError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn http(url: impl Into<String>, source: reqwest::Error) -> Self {
        FetchError::Http {
            url: url.into(),
            source,
        }
    }
}

pub type CacheResult<T> = std::result::Result<T, CacheError>;
pub type FetchResult<T> = std::result::Result<T, FetchError>;
