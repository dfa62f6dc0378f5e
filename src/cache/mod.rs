//! Cache module - resource identity, persistence and lifecycle
//!
//! Provides:
//! - Resource kinds, raw parameters and canonical resources
//! - Normalization of parameters into canonical resources
//! - The persistent store (`cache.json`)
//! - The cache manager (lookup-or-create, check, remove, purge, query)
//! - Command-level operations returning result sets

pub mod api;
pub mod item;
pub mod kind;
pub mod manager;
pub mod params;
pub mod resolve;
pub mod resource;
pub mod store;
