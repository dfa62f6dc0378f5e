//! Resource kinds understood by the cache

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of resource kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    #[serde(rename = "githubGist")]
    GithubGist,
    #[serde(rename = "githubRawFile")]
    GithubRawFile,
    #[serde(rename = "githubRelease")]
    GithubRelease,
    #[serde(rename = "webTarget")]
    WebTarget,
    #[serde(rename = "localTarget")]
    LocalTarget,
    #[serde(rename = "gitRepo")]
    GitRepo,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::GithubGist,
        ResourceKind::GithubRawFile,
        ResourceKind::GithubRelease,
        ResourceKind::WebTarget,
        ResourceKind::LocalTarget,
        ResourceKind::GitRepo,
    ];

    /// Name used in the store document and in `kind/value` queries
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::GithubGist => "githubGist",
            ResourceKind::GithubRawFile => "githubRawFile",
            ResourceKind::GithubRelease => "githubRelease",
            ResourceKind::WebTarget => "webTarget",
            ResourceKind::LocalTarget => "localTarget",
            ResourceKind::GitRepo => "gitRepo",
        }
    }

    /// Short alias accepted on the command line
    pub fn alias(&self) -> &'static str {
        match self {
            ResourceKind::GithubGist => "gist",
            ResourceKind::GithubRawFile => "raw",
            ResourceKind::GithubRelease => "release",
            ResourceKind::WebTarget => "web",
            ResourceKind::LocalTarget => "local",
            ResourceKind::GitRepo => "repo",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s) || kind.alias() == s)
            .ok_or_else(|| {
                let names: Vec<_> = ResourceKind::ALL.iter().map(|k| k.as_str()).collect();
                format!("Unknown resource type: {} (expected one of {})", s, names.join(", "))
            })
    }
}
