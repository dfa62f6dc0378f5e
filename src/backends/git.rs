//! Git repository driver
//!
//! Clones into the item directory when it is empty, otherwise fetches and
//! moves the working tree to the requested branch (or the remote's default
//! branch when none is set).

use std::fs;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

use crate::backends::{FetchContext, Fetcher};
use crate::cache::kind::ResourceKind;
use crate::cache::resource::Resource;
use crate::core::error::{FetchError, FetchResult};
use crate::core::paths::is_dir_empty;
use crate::core::util::command_exists;

pub struct GitFetcher;

/// Run git with the transfer timeout applied; stderr becomes the error
fn run_git(ctx: &FetchContext, cwd: Option<&Path>, args: &[&str]) -> FetchResult<()> {
    let low_speed_time = format!("http.lowSpeedTime={}", ctx.timeout.as_secs().max(1));

    let mut cmd = Command::new("git");
    cmd.args(["-c", "http.lowSpeedLimit=1000", "-c", &low_speed_time])
        .args(args)
        .env("GIT_TERMINAL_PROMPT", "0");
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    debug!(args = ?args, "Running git");
    let output = cmd
        .output()
        .map_err(|e| FetchError::io("Failed to spawn git", e))?;

    if !output.status.success() {
        return Err(FetchError::Git {
            command: args.first().copied().unwrap_or("").to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

fn clone(ctx: &FetchContext, url: &str, branch: Option<&str>, dest: &Path) -> FetchResult<()> {
    let target = dest.to_string_lossy();
    let mut args = vec!["clone"];
    if let Some(branch) = branch {
        args.extend(["--branch", branch]);
    }
    args.extend(["--", url, &*target]);
    run_git(ctx, None, &args)
}

fn update(ctx: &FetchContext, branch: Option<&str>, dest: &Path) -> FetchResult<()> {
    match branch {
        Some(branch) => {
            run_git(ctx, Some(dest), &["fetch", "origin", branch])?;
            run_git(ctx, Some(dest), &["checkout", "-B", branch, "FETCH_HEAD"])
        }
        None => {
            run_git(ctx, Some(dest), &["fetch", "origin"])?;
            run_git(ctx, Some(dest), &["reset", "--hard", "FETCH_HEAD"])
        }
    }
}

impl Fetcher for GitFetcher {
    fn kind(&self) -> ResourceKind {
        ResourceKind::GitRepo
    }

    fn fetch(&self, ctx: &FetchContext, resource: &Resource, dest: &Path) -> FetchResult<()> {
        let Resource::Repo { url, branch, .. } = resource else {
            return Err(FetchError::Mismatch(self.kind()));
        };
        if !command_exists("git") {
            return Err(FetchError::MissingGit);
        }
        let branch = branch.as_deref();

        // a non-empty directory that is not a checkout is leftover from a
        // broken clone; start over
        if !is_dir_empty(dest) && !dest.join(".git").exists() {
            fs::remove_dir_all(dest)
                .map_err(|e| FetchError::io(format!("Failed to clear {}", dest.display()), e))?;
        }
        fs::create_dir_all(dest)
            .map_err(|e| FetchError::io(format!("Failed to create {}", dest.display()), e))?;

        if is_dir_empty(dest) {
            clone(ctx, url, branch, dest)?;
            info!(%url, branch = ?branch, "Cloned repository");
        } else {
            update(ctx, branch, dest)?;
            info!(%url, branch = ?branch, "Updated repository");
        }
        Ok(())
    }
}
