//! Core module - Contains the fundamental data structures and utilities
//!
//! This module provides:
//! - Error taxonomy (CacheError, FetchError)
//! - Runtime settings and tracing setup
//! - Unified result model (ResultItem)
//! - Rendering functions for different output formats
//! - Path and layout utilities
//! - Common utilities

pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod paths;
pub mod render;
pub mod util;
