//! Release driver - downloads assets of a GitHub release
//!
//! `latest` resolves to the most recent release at fetch time; any other
//! tag is looked up by name. Assets are filtered by glob patterns, or all
//! assets are taken when no pattern is configured.

use glob::Pattern;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

use crate::backends::{replace_dir, safe_file_name, FetchContext, Fetcher};
use crate::cache::kind::ResourceKind;
use crate::cache::resolve::LATEST;
use crate::cache::resource::Resource;
use crate::core::error::{FetchError, FetchResult};

/// GitHub release metadata from the API
#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
    #[serde(default)]
    assets: Vec<Asset>,
}

/// GitHub release asset
#[derive(Debug, Clone, Deserialize)]
struct Asset {
    name: String,
    browser_download_url: String,
}

pub struct ReleaseFetcher;

impl ReleaseFetcher {
    fn release_url(api: &str, owner: &str, repo: &str, tag: &str) -> String {
        if tag == LATEST {
            format!("{}/repos/{}/{}/releases/latest", api, owner, repo)
        } else {
            format!("{}/repos/{}/{}/releases/tags/{}", api, owner, repo, tag)
        }
    }
}

/// Pick the assets whose names match any pattern; every asset when
/// `patterns` is empty
fn select_assets<'a>(assets: &'a [Asset], patterns: &[String]) -> FetchResult<Vec<&'a Asset>> {
    if patterns.is_empty() {
        return Ok(assets.iter().collect());
    }

    let compiled = patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| FetchError::Pattern {
                pattern: p.clone(),
                message: e.to_string(),
            })
        })
        .collect::<FetchResult<Vec<_>>>()?;

    Ok(assets
        .iter()
        .filter(|asset| compiled.iter().any(|p| p.matches(&asset.name)))
        .collect())
}

impl Fetcher for ReleaseFetcher {
    fn kind(&self) -> ResourceKind {
        ResourceKind::GithubRelease
    }

    fn fetch(&self, ctx: &FetchContext, resource: &Resource, dest: &Path) -> FetchResult<()> {
        let Resource::Release {
            owner,
            repo,
            release_tag,
            assets: patterns,
            ..
        } = resource
        else {
            return Err(FetchError::Mismatch(self.kind()));
        };

        let api = Self::release_url(&ctx.api_url, owner, repo, release_tag);
        let release: Release = ctx.http.get_json(&api)?;
        debug!(tag = %release.tag_name, assets = release.assets.len(), "Resolved release");

        let selected = select_assets(&release.assets, patterns)?;
        if selected.is_empty() && !patterns.is_empty() {
            return Err(FetchError::NoMatchingAssets {
                tag: release.tag_name.clone(),
                patterns: patterns.clone(),
            });
        }

        replace_dir(dest, |dir| {
            for asset in &selected {
                let Some(name) = safe_file_name(&asset.name) else {
                    continue;
                };
                ctx.http.download_to(&asset.browser_download_url, &dir.join(&name))?;
            }
            info!(
                repo = %format!("{}/{}", owner, repo),
                tag = %release.tag_name,
                assets = selected.len(),
                "Fetched release"
            );
            Ok(())
        })
    }
}
