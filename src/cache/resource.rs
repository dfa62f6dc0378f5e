//! Canonical resource identities
//!
//! A `Resource` is the resolver's output and the store's dedup key: two
//! items of the same kind are the same item exactly when their resources
//! compare equal.

use serde::{Deserialize, Serialize};

use crate::cache::kind::ResourceKind;
#[cfg(test)]
use crate::cache::params::Params;

/// Canonical parameter set, one variant per kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "meta")]
pub enum Resource {
    #[serde(rename = "githubGist")]
    Gist { owner: String, id: String, url: String },

    #[serde(rename = "githubRawFile")]
    RawFile {
        owner: String,
        repo: String,
        branch: String,
        path: String,
        url: String,
    },

    #[serde(rename = "githubRelease", rename_all = "camelCase")]
    Release {
        owner: String,
        repo: String,
        release_tag: String,
        url: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        assets: Vec<String>,
    },

    #[serde(rename = "webTarget")]
    Web { url: String },

    #[serde(rename = "localTarget")]
    Local { path: String },

    #[serde(rename = "gitRepo")]
    Repo {
        owner: String,
        repo: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        branch: Option<String>,
        url: String,
    },
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Gist { .. } => ResourceKind::GithubGist,
            Resource::RawFile { .. } => ResourceKind::GithubRawFile,
            Resource::Release { .. } => ResourceKind::GithubRelease,
            Resource::Web { .. } => ResourceKind::WebTarget,
            Resource::Local { .. } => ResourceKind::LocalTarget,
            Resource::Repo { .. } => ResourceKind::GitRepo,
        }
    }

    /// Canonical fields as `(name, value)` pairs, in declaration order
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        let mut fields = Vec::new();
        match self {
            Resource::Gist { owner, id, url } => {
                fields.push(("owner", owner.as_str()));
                fields.push(("id", id.as_str()));
                fields.push(("url", url.as_str()));
            }
            Resource::RawFile {
                owner,
                repo,
                branch,
                path,
                url,
            } => {
                fields.push(("owner", owner.as_str()));
                fields.push(("repo", repo.as_str()));
                fields.push(("branch", branch.as_str()));
                fields.push(("path", path.as_str()));
                fields.push(("url", url.as_str()));
            }
            Resource::Release {
                owner,
                repo,
                release_tag,
                url,
                assets,
            } => {
                fields.push(("owner", owner.as_str()));
                fields.push(("repo", repo.as_str()));
                fields.push(("releaseTag", release_tag.as_str()));
                fields.push(("url", url.as_str()));
                fields.extend(assets.iter().map(|a| ("assets", a.as_str())));
            }
            Resource::Web { url } => fields.push(("url", url.as_str())),
            Resource::Local { path } => fields.push(("path", path.as_str())),
            Resource::Repo {
                owner,
                repo,
                branch,
                url,
            } => {
                fields.push(("owner", owner.as_str()));
                fields.push(("repo", repo.as_str()));
                if let Some(branch) = branch {
                    fields.push(("branch", branch.as_str()));
                }
                fields.push(("url", url.as_str()));
            }
        }
        fields
    }

    /// Whether any canonical field equals `value` exactly
    pub fn has_field_value(&self, value: &str) -> bool {
        self.fields().iter().any(|(_, v)| *v == value)
    }

    /// Short human-facing description: the url, or the path for local targets
    pub fn signature(&self) -> &str {
        match self {
            Resource::Gist { url, .. }
            | Resource::RawFile { url, .. }
            | Resource::Release { url, .. }
            | Resource::Web { url }
            | Resource::Repo { url, .. } => url,
            Resource::Local { path } => path,
        }
    }

    /// Convert back into partial form; resolving the result yields `self`
    #[cfg(test)]
    pub fn to_params(&self) -> Params {
        let mut params = Params::default();
        match self.clone() {
            Resource::Gist { owner, id, url } => {
                params.owner = Some(owner);
                params.id = Some(id);
                params.url = Some(url);
            }
            Resource::RawFile {
                owner,
                repo,
                branch,
                path,
                url,
            } => {
                params.owner = Some(owner);
                params.repo = Some(repo);
                params.branch = Some(branch);
                params.path = Some(path);
                params.url = Some(url);
            }
            Resource::Release {
                owner,
                repo,
                release_tag,
                url,
                assets,
            } => {
                params.owner = Some(owner);
                params.repo = Some(repo);
                params.release_tag = Some(release_tag);
                params.url = Some(url);
                params.assets = assets;
            }
            Resource::Web { url } => params.url = Some(url),
            Resource::Local { path } => params.path = Some(path),
            Resource::Repo {
                owner,
                repo,
                branch,
                url,
            } => {
                params.owner = Some(owner);
                params.repo = Some(repo);
                params.branch = branch;
                params.url = Some(url);
            }
        }
        params
    }
}
