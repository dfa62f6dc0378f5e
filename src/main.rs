//! cacher - a local content cache keyed by normalized resource identity
//!
//! cacher provides:
//! - Normalization of gist, raw-file, release, web, local and git references
//! - A persistent store of cached items with staleness tracking
//! - Fetch drivers that materialize each kind into its own directory
//! - Unified output format (jsonl/json/md/table)

use anyhow::Result;
use clap::Parser;

mod backends;
mod cache;
mod cli;
mod core;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    crate::core::logging::init_tracing(crate::core::logging::level_for(cli.quiet, cli.verbose))?;
    cli::run(cli)
}
