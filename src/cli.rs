//! CLI module - Command-line interface definitions and handlers

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use crate::backends::doctor::doctor;
use crate::cache::api::{self, Target};
use crate::cache::item::DEFAULT_CHECK_INTERVAL;
use crate::cache::kind::ResourceKind;
use crate::cache::manager::{CacheManager, CacheOptions};
use crate::cache::params::Params;
use crate::cache::store::Store;
use crate::core::config::{Settings, DEFAULT_TIMEOUT_SECS};
use crate::core::error::CacheError;
use crate::core::model::{ItemError, ResultItem, ResultSet};
use crate::core::render::{OutputFormat, RenderConfig, Renderer};

/// cacher - a local content cache for GitHub gists, files, releases, web pages and repositories.
#[derive(Parser, Debug)]
#[command(name = "cacher")]
#[command(
    author,
    version,
    about,
    long_about = r#"cacher keeps local copies of remote (and local) resources, keyed by a
normalized identity, so equivalent references share one cache item.

Resource kinds (full name or alias):
- githubGist (gist): a gist, by URL or owner + id
- githubRawFile (raw): one file from a GitHub repository
- githubRelease (release): assets of a GitHub release
- webTarget (web): any URL, stored as one file
- localTarget (local): a local file or directory, copied
- gitRepo (repo): a git repository, cloned then updated in place

Arguments are a bare URL or key=value pairs (url, owner, repo, branch, path,
id, releaseTag, asset, assets).

Each command prints a ResultSet in the selected format (default: jsonl).

Examples:
    cacher cache raw https://github.com/o/r/blob/main/README.md
    cacher cache local path=~/notes
    cacher list --format table
    cacher check --id 1a2b3c4d -f
    cacher path -c repo -a https://github.com/o/r src/lib.rs
"#
)]
pub struct Cli {
    /// Cache home directory.
    #[arg(
        long,
        global = true,
        env = "CACHER_HOME",
        value_name = "DIR",
        long_help = "Directory holding cache.json and one content directory per item.\n\n\
Defaults to ~/.cacher."
    )]
    pub home: Option<PathBuf>,

    /// Per-fetch timeout in seconds.
    #[arg(
        long,
        global = true,
        env = "CACHER_TIMEOUT",
        default_value_t = DEFAULT_TIMEOUT_SECS,
        value_name = "SECS",
        long_help = "Timeout for each fetch, in seconds.\n\n\
HTTP requests abort after this long; git aborts when a transfer stalls for it."
    )]
    pub timeout: u64,

    /// Check interval for new items, in seconds (0 = never stale).
    #[arg(
        long,
        global = true,
        env = "CACHER_INTERVAL",
        default_value_t = DEFAULT_CHECK_INTERVAL,
        value_name = "SECS",
        long_help = "Check interval recorded on newly cached items, in seconds.\n\n\
An item is refreshed by `check` once this much time has passed since its last\n\
successful fetch. 0 records no interval: the item is only refreshed when forced\n\
or when its content directory is empty."
    )]
    pub interval: u64,

    /// GitHub REST API base URL.
    #[arg(
        long,
        global = true,
        env = "CACHER_GITHUB_API",
        value_name = "URL",
        long_help = "Base URL of the GitHub REST API used for gists and releases.\n\n\
Defaults to https://api.github.com."
    )]
    pub api_url: Option<String>,

    /// Output format (jsonl/json/md/table).
    #[arg(
        long,
        global = true,
        default_value = "jsonl",
        value_name = "FORMAT",
        long_help = "Select the output format for ResultSet.\n\n\
Supported values:\n\
- jsonl (default)\n\
- json\n\
- md (markdown)\n\
- table\n\n\
Tip: Prefer jsonl when you want stable, line-oriented output for piping."
    )]
    pub format: String,

    /// Disable colored output (when applicable).
    #[arg(
        long,
        global = true,
        long_help = "Disable colored output. This is useful when piping to files or when your\n\
terminal does not support ANSI colors."
    )]
    pub no_color: bool,

    /// Quiet mode (errors only on stderr).
    #[arg(
        short,
        long,
        global = true,
        long_help = "Only log errors to stderr. Results are still printed to stdout."
    )]
    pub quiet: bool,

    /// Verbose mode (more diagnostics).
    #[arg(
        short,
        long,
        global = true,
        long_help = "Log debug diagnostics (requests, git commands, store writes) to stderr.\n\n\
RUST_LOG, when set, takes precedence over both --quiet and --verbose."
    )]
    pub verbose: bool,

    /// Pretty-print JSON/JSONL output with indentation.
    #[arg(
        long,
        global = true,
        long_help = "Pretty-print JSON and JSONL output with indentation for human readability.\n\n\
Has no effect on md/table formats."
    )]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Cache a resource, or return the existing item for it.
    #[command(
        long_about = "Resolve KIND and ARGS to a canonical resource. If an item for it already\n\
exists it is checked (and refreshed when due); otherwise a new item is created and\n\
fetched.\n\n\
Examples:\n\
  cacher cache gist https://gist.github.com/octo/aa5a315d\n\
  cacher cache release owner=o repo=r releaseTag=v1.0 assets=*.tar.gz,*.zip\n\
  cacher cache repo https://github.com/o/r branch=dev\n"
    )]
    Cache {
        /// Resource kind.
        #[arg(value_name = "KIND")]
        kind: ResourceKind,

        /// A bare URL and/or key=value parameters.
        #[arg(value_name = "ARGS", required = true, num_args = 1..)]
        args: Vec<String>,
    },

    /// Show the canonical resource for KIND and ARGS without caching.
    #[command(
        long_about = "Normalize KIND and ARGS exactly as `cache` would and print the resulting\n\
canonical resource. Nothing is fetched and the store is not touched.\n\n\
Examples:\n\
  cacher resolve raw https://github.com/o/r/blob/main/a.txt\n\
  cacher resolve repo owner=o repo=r\n"
    )]
    Resolve {
        #[arg(value_name = "KIND")]
        kind: ResourceKind,

        #[arg(value_name = "ARGS", required = true, num_args = 1..)]
        args: Vec<String>,
    },

    /// Refresh an item when it is due (or always with -f).
    #[command(
        long_about = "Refresh one item when its check interval has elapsed, when it has never\n\
been fetched successfully, or when its content directory is empty. -f refreshes\n\
unconditionally.\n\n\
The item is named by --id (an id, short id or query) or by -c KIND -a ARG...;\n\
a resource that is not cached yet is cached first.\n\n\
Examples:\n\
  cacher check --id 1a2b3c4d\n\
  cacher check -c web -a https://example.com/feed.xml -f\n"
    )]
    Check {
        /// Item id, short id or query.
        #[arg(long, value_name = "ID")]
        id: Option<String>,

        /// Resource kind (with -a).
        #[arg(short = 'c', long = "kind", value_name = "KIND")]
        kind: Option<ResourceKind>,

        /// Resource arguments (repeatable).
        #[arg(short = 'a', long = "arg", value_name = "ARG")]
        args: Vec<String>,

        /// Refresh even when not due.
        #[arg(short, long)]
        force: bool,
    },

    /// List cached items.
    #[command(
        long_about = "List cached items in the order they were created: id, kind, signature\n\
(URL, or path for local targets) and last successful check.\n\n\
Examples:\n\
  cacher list\n\
  cacher list -c repo --format table\n"
    )]
    List {
        /// Only items of this kind.
        #[arg(short = 'c', long = "kind", value_name = "KIND")]
        kind: Option<ResourceKind>,
    },

    /// Remove an item and its content.
    #[command(
        long_about = "Delete one item's record and content directory.\n\n\
Examples:\n\
  cacher remove --id 1a2b3c4d\n\
  cacher remove -c local -a path=/tmp/notes\n"
    )]
    Remove {
        /// Item id, short id or query.
        #[arg(long, value_name = "ID")]
        id: Option<String>,

        /// Resource kind (with -a).
        #[arg(short = 'c', long = "kind", value_name = "KIND")]
        kind: Option<ResourceKind>,

        /// Resource arguments (repeatable).
        #[arg(short = 'a', long = "arg", value_name = "ARG")]
        args: Vec<String>,
    },

    /// Remove orphan directories, or everything with -f.
    #[command(
        long_about = "Without -f, list entries under the cache root that no item refers to and\n\
remove them after confirmation (-y skips the prompt).\n\n\
With -f, remove every item and recreate an empty cache root.\n\n\
Examples:\n\
  cacher purge\n\
  cacher purge -y\n\
  cacher purge -f\n"
    )]
    Purge {
        /// Remove all items.
        #[arg(short, long)]
        force: bool,

        /// Do not ask before removing orphans.
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Find an item by id, short id or any field value.
    #[command(
        long_about = "Find one item. QUERY may be:\n\
- an exact id\n\
- KIND/VALUE, where VALUE is an id, a short id (at least 4 characters of its\n\
  start or end) or a field value such as the URL\n\
- any field value of any item\n\n\
Examples:\n\
  cacher query web/1a2b\n\
  cacher query https://github.com/o/r.git\n"
    )]
    Query {
        #[arg(value_name = "QUERY")]
        query: String,
    },

    /// Print the content path of an item (or of a file inside it).
    #[command(
        long_about = "Print the content directory of an item, or SUBPATH inside it. The item is\n\
named by --id or by -c KIND -a ARG...; a resource is cached (and checked) first.\n\n\
Examples:\n\
  cacher path --id 1a2b3c4d\n\
  cacher path -c raw -a https://github.com/o/r/blob/main/a.txt a.txt\n"
    )]
    Path {
        /// Path inside the item directory.
        #[arg(value_name = "SUBPATH")]
        subpath: Option<PathBuf>,

        /// Item id, short id or query.
        #[arg(long, value_name = "ID")]
        id: Option<String>,

        /// Resource kind (with -a).
        #[arg(short = 'c', long = "kind", value_name = "KIND")]
        kind: Option<ResourceKind>,

        /// Resource arguments (repeatable).
        #[arg(short = 'a', long = "arg", value_name = "ARG")]
        args: Vec<String>,
    },

    /// Check external tools and the cache home.
    #[command(
        long_about = "Report whether git is available (needed for gitRepo items) and the state of\n\
the cache home: the store document, the cache root and any orphan entries.\n\n\
Example:\n\
  cacher doctor --format table\n"
    )]
    Doctor,
}

/// Run the CLI
pub fn run(cli: Cli) -> Result<()> {
    let format: OutputFormat = cli
        .format
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    let render_config = RenderConfig::with_pretty(format, cli.pretty);

    if cli.no_color {
        colored::control::set_override(false);
    }

    let settings = Settings::from_args(cli.home, cli.timeout, cli.interval, cli.api_url);
    let options = CacheOptions {
        check_on_hit: true,
        interval: settings.interval,
    };

    let result_set = match execute(cli.command, &settings, options) {
        Ok(result_set) => result_set,
        Err(e) => {
            if let Some(err) = e.downcast_ref::<CacheError>() {
                let failed = ResultSet::from_iter([ResultItem::error(ItemError::from(err))]);
                emit(&failed, render_config)?;
            }
            return Err(e);
        }
    };

    emit(&result_set, render_config)?;
    if result_set.has_errors() {
        anyhow::bail!("one or more checks reported errors");
    }
    Ok(())
}

/// Run one subcommand and collect its results
fn execute(command: Commands, settings: &Settings, options: CacheOptions) -> Result<ResultSet> {
    let result_set = match command {
        Commands::Cache { kind, args } => {
            let params = Params::from_cli_args(&args)?;
            with_manager(settings, |manager| {
                Ok(api::cache_resource(manager, kind, &params, options)?)
            })?
        }

        Commands::Resolve { kind, args } => {
            let params = Params::from_cli_args(&args)?;
            api::resolve_resource(kind, &params)?
        }

        Commands::Check {
            id,
            kind,
            args,
            force,
        } => {
            let target = Target::from_cli(id, kind, &args)?;
            with_manager(settings, |manager| {
                Ok(api::check_item(manager, &target, force, options)?)
            })?
        }

        Commands::List { kind } => {
            with_manager(settings, |manager| Ok(api::list_items(manager, kind)))?
        }

        Commands::Remove { id, kind, args } => {
            let target = Target::from_cli(id, kind, &args)?;
            with_manager(settings, |manager| Ok(api::remove_item(manager, &target)?))?
        }

        Commands::Purge { force, yes } => {
            with_manager(settings, |manager| run_purge(manager, force, yes))?
        }

        Commands::Query { query } => {
            with_manager(settings, |manager| Ok(api::query_items(manager, &query)?))?
        }

        Commands::Path {
            subpath,
            id,
            kind,
            args,
        } => {
            let target = Target::from_cli(id, kind, &args)?;
            with_manager(settings, |manager| {
                Ok(api::item_path(manager, &target, subpath.as_deref(), options)?)
            })?
        }

        Commands::Doctor => doctor(&settings.layout()),
    };
    Ok(result_set)
}

/// Open the store under the configured home and hand a manager to `f`
fn with_manager<T>(
    settings: &Settings,
    f: impl FnOnce(&mut CacheManager<'_>) -> Result<T>,
) -> Result<T> {
    let layout = settings.layout();
    let mut store = Store::open(layout.store_file())
        .with_context(|| format!("Failed to open cache store in {}", layout.home().display()))?;
    let ctx = settings
        .fetch_context()
        .context("Failed to set up the HTTP client")?;
    let mut manager = CacheManager::new(&mut store, layout, ctx);
    f(&mut manager)
}

fn run_purge(manager: &mut CacheManager<'_>, force: bool, yes: bool) -> Result<ResultSet> {
    if force {
        return Ok(api::purge_all(manager)?);
    }

    let orphans = manager.orphans()?;
    if orphans.is_empty() {
        return Ok(ResultSet::from_iter([ResultItem::status("no orphan entries")]));
    }

    let mut result_set = api::list_orphans(manager)?;
    let prompt = format!(
        "Remove {} orphan entr{} under {}?",
        orphans.len(),
        if orphans.len() == 1 { "y" } else { "ies" },
        manager.layout().cache_dir().display()
    );
    if yes || confirm(&prompt)? {
        result_set.extend(api::remove_orphans(manager, &orphans)?);
    } else {
        result_set.push(ResultItem::status("cache not purged"));
    }
    Ok(result_set)
}

/// Ask a yes/no question on stderr; anything but y/yes is a no
fn confirm(prompt: &str) -> Result<bool> {
    let mut stderr = io::stderr();
    write!(stderr, "{} [y/N] ", prompt)?;
    stderr.flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn emit(result_set: &ResultSet, render_config: RenderConfig) -> Result<()> {
    let renderer = Renderer::with_config(render_config);
    renderer
        .render_to(result_set, io::stdout().lock())
        .context("Failed to write output")
}
