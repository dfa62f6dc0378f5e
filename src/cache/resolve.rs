//! Identity resolution
//!
//! Maps a partial reference (`Params`) for a given kind onto its canonical
//! `Resource`. Resolution is pure apart from the existence check for local
//! targets, and idempotent: resolving `resource.to_params()` yields
//! `resource` again.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

use crate::cache::kind::ResourceKind;
use crate::cache::params::Params;
use crate::cache::resource::Resource;
use crate::core::error::{CacheError, CacheResult};
use crate::core::paths::normalize_path;

const GITHUB: &str = "https://github.com";
const GIST_HOST: &str = "https://gist.github.com";
const RAW_HOST: &str = "https://raw.githubusercontent.com";

/// Release tag meaning "most recent release"
pub const LATEST: &str = "latest";

/// https://gist.github.com/<owner>/<id>
static GIST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://gist\.github\.com/([^/]+)/([^/]+?)/?$").expect("Invalid GIST_RE regex")
});

/// https://raw.githubusercontent.com/<owner>/<repo>/<branch>/<path>
static RAW_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://raw\.githubusercontent\.com/([^/]+)/([^/]+)/([^/]+)/(.+)$")
        .expect("Invalid RAW_RE regex")
});

/// https://github.com/<owner>/<repo>/blob/<branch>/<path>
static BLOB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://github\.com/([^/]+)/([^/]+)/(?:blob|raw)/([^/]+)/(.+)$")
        .expect("Invalid BLOB_RE regex")
});

/// https://github.com/<owner>/<repo>[.git][/tree/<branch>[/...]]
static REPO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://github\.com/([^/]+)/([^/]+?)(?:\.git)?(?:/(?:tree|blob)/([^/]+)(?:/.*)?)?/?$")
        .expect("Invalid REPO_RE regex")
});

/// https://github.com/<owner>/<repo>/releases/tag/<tag> or .../releases/latest
static RELEASE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://github\.com/([^/]+)/([^/]+)/releases/(?:tag/([^/]+)|latest)/?$")
        .expect("Invalid RELEASE_RE regex")
});

/// Resolve a partial reference into its canonical resource
pub fn resolve(kind: ResourceKind, params: &Params) -> CacheResult<Resource> {
    match kind {
        ResourceKind::GithubGist => resolve_gist(params),
        ResourceKind::GithubRawFile => resolve_raw_file(params),
        ResourceKind::GithubRelease => resolve_release(params),
        ResourceKind::WebTarget => resolve_web(params),
        ResourceKind::LocalTarget => resolve_local(params),
        ResourceKind::GitRepo => resolve_repo(params),
    }
}

fn required<'a>(value: &'a Option<String>, name: &str, kind: ResourceKind) -> CacheResult<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(CacheError::invalid(format!("{} requires '{}'", kind, name))),
    }
}

fn capture(caps: &regex::Captures<'_>, i: usize) -> Option<String> {
    caps.get(i).map(|m| m.as_str().to_string())
}

fn resolve_gist(params: &Params) -> CacheResult<Resource> {
    let kind = ResourceKind::GithubGist;

    let (owner, id) = if let Some(url) = &params.url {
        let caps = GIST_RE.captures(url).ok_or_else(|| {
            CacheError::invalid(format!("{} url must look like {}/<owner>/<id>: {}", kind, GIST_HOST, url))
        })?;
        (caps[1].to_string(), caps[2].to_string())
    } else {
        (
            required(&params.owner, "owner", kind)?.to_string(),
            required(&params.id, "id", kind)?.to_string(),
        )
    };

    Ok(Resource::Gist {
        url: format!("{}/{}/{}", GIST_HOST, owner, id),
        owner,
        id,
    })
}

fn resolve_raw_file(params: &Params) -> CacheResult<Resource> {
    let kind = ResourceKind::GithubRawFile;

    let (owner, repo, branch, path) = if let Some(url) = &params.url {
        let caps = RAW_RE
            .captures(url)
            .or_else(|| BLOB_RE.captures(url))
            .ok_or_else(|| {
                CacheError::invalid(format!(
                    "{} url must be a raw content url or a github blob url: {}",
                    kind, url
                ))
            })?;
        (
            caps[1].to_string(),
            caps[2].to_string(),
            caps[3].to_string(),
            caps[4].to_string(),
        )
    } else {
        if params.owner.is_none()
            && params.repo.is_none()
            && params.branch.is_none()
            && params.path.is_none()
        {
            return Err(CacheError::invalid(format!(
                "{} requires a url or owner, repo, branch and path",
                kind
            )));
        }
        (
            required(&params.owner, "owner", kind)?.to_string(),
            required(&params.repo, "repo", kind)?.to_string(),
            required(&params.branch, "branch", kind)?.to_string(),
            required(&params.path, "path", kind)?
                .trim_start_matches('/')
                .to_string(),
        )
    };

    Ok(Resource::RawFile {
        url: format!("{}/{}/{}/{}/{}", RAW_HOST, owner, repo, branch, path),
        owner,
        repo,
        branch,
        path,
    })
}

fn resolve_repo(params: &Params) -> CacheResult<Resource> {
    let kind = ResourceKind::GitRepo;

    let (owner, repo, url_branch) = match &params.url {
        Some(url) if url.starts_with(RAW_HOST) => {
            let caps = RAW_RE
                .captures(url)
                .ok_or_else(|| CacheError::invalid(format!("malformed raw content url: {}", url)))?;
            (caps[1].to_string(), caps[2].to_string(), capture(&caps, 3))
        }
        Some(url) => {
            let caps = REPO_RE.captures(url).ok_or_else(|| {
                CacheError::invalid(format!("{} url must be a {} repository url: {}", kind, GITHUB, url))
            })?;
            (caps[1].to_string(), caps[2].to_string(), capture(&caps, 3))
        }
        None => (
            required(&params.owner, "owner", kind)?.to_string(),
            required(&params.repo, "repo", kind)?
                .trim_end_matches(".git")
                .to_string(),
            None,
        ),
    };

    let branch = url_branch.or_else(|| {
        params
            .branch
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .map(String::from)
    });

    Ok(Resource::Repo {
        url: format!("{}/{}/{}.git", GITHUB, owner, repo),
        owner,
        repo,
        branch,
    })
}

fn resolve_release(params: &Params) -> CacheResult<Resource> {
    let kind = ResourceKind::GithubRelease;

    let (owner, repo, release_tag) = if let Some(url) = &params.url {
        let caps = RELEASE_RE.captures(url).ok_or_else(|| {
            CacheError::invalid(format!(
                "{} url must end in /releases/tag/<tag> or /releases/latest: {}",
                kind, url
            ))
        })?;
        (
            caps[1].to_string(),
            caps[2].to_string(),
            capture(&caps, 3).unwrap_or_else(|| LATEST.to_string()),
        )
    } else {
        let tag = params
            .release_tag
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(LATEST);
        (
            required(&params.owner, "owner", kind)?.to_string(),
            required(&params.repo, "repo", kind)?.to_string(),
            tag.to_string(),
        )
    };

    let url = if release_tag == LATEST {
        format!("{}/{}/{}/releases/latest", GITHUB, owner, repo)
    } else {
        format!("{}/{}/{}/releases/tag/{}", GITHUB, owner, repo, release_tag)
    };

    let mut assets = params.assets.clone();
    assets.extend(params.asset.clone());
    assets.sort();
    assets.dedup();

    Ok(Resource::Release {
        owner,
        repo,
        release_tag,
        url,
        assets,
    })
}

fn resolve_web(params: &Params) -> CacheResult<Resource> {
    let url = required(&params.url, "url", ResourceKind::WebTarget)?;
    Ok(Resource::Web {
        url: url.to_string(),
    })
}

fn resolve_local(params: &Params) -> CacheResult<Resource> {
    let raw = required(&params.path, "path", ResourceKind::LocalTarget)?;
    let path = expand_home(raw);

    if !path.exists() {
        return Err(CacheError::not_found(format!("local path {}", raw)));
    }

    let canonical = path
        .canonicalize()
        .map_err(|e| CacheError::io(format!("Failed to canonicalize {}", raw), e))?;

    Ok(Resource::Local {
        path: normalize_path(&canonical),
    })
}

fn expand_home(raw: &str) -> PathBuf {
    match (raw.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => Path::new(raw).to_path_buf(),
    }
}
