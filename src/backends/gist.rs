//! Gist driver - downloads every file of a gist

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use crate::backends::{replace_dir, safe_file_name, FetchContext, Fetcher};
use crate::cache::kind::ResourceKind;
use crate::cache::resource::Resource;
use crate::core::error::{FetchError, FetchResult};

/// Gist metadata from the API
#[derive(Debug, Deserialize)]
struct Gist {
    files: BTreeMap<String, GistFile>,
}

#[derive(Debug, Deserialize)]
struct GistFile {
    #[serde(default)]
    filename: Option<String>,
    raw_url: String,
}

pub struct GistFetcher;

impl Fetcher for GistFetcher {
    fn kind(&self) -> ResourceKind {
        ResourceKind::GithubGist
    }

    fn fetch(&self, ctx: &FetchContext, resource: &Resource, dest: &Path) -> FetchResult<()> {
        let Resource::Gist { id, .. } = resource else {
            return Err(FetchError::Mismatch(self.kind()));
        };

        let api = format!("{}/gists/{}", ctx.api_url, id);
        let gist: Gist = ctx.http.get_json(&api)?;

        replace_dir(dest, |dir| {
            for (key, file) in &gist.files {
                let name = file.filename.as_deref().unwrap_or(key);
                let Some(name) = safe_file_name(name) else {
                    continue;
                };
                ctx.http.download_to(&file.raw_url, &dir.join(&name))?;
            }
            info!(gist = %id, files = gist.files.len(), "Fetched gist");
            Ok(())
        })
    }
}
