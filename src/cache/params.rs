//! Partial resource references as supplied by callers

use serde::{Deserialize, Serialize};

use crate::core::error::{CacheError, CacheResult};

/// Keys accepted in `key=value` arguments
pub const PARAM_KEYS: &[&str] = &[
    "url",
    "owner",
    "repo",
    "branch",
    "path",
    "id",
    "releaseTag",
    "asset",
    "assets",
];

/// A loosely specified reference; the resolver turns it into a `Resource`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Params {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assets: Vec<String>,
}

impl Params {
    #[cfg(test)]
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    #[cfg(test)]
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    /// Parse command-line style arguments.
    ///
    /// The first bare argument is taken as the URL and must look like one
    /// (contain both `.` and `/`). Everything else must be `key=value` with
    /// a key from [`PARAM_KEYS`]; `assets` takes a comma-separated list.
    /// An `=` inside a URL's query string does not make it a pair.
    pub fn from_cli_args<S: AsRef<str>>(args: &[S]) -> CacheResult<Self> {
        let mut params = Params::default();

        for arg in args {
            let arg = arg.as_ref();
            match key_value(arg) {
                Some((key, value)) => params.set(key, value)?,
                None if params.url.is_none() => {
                    if !arg.contains('.') || !arg.contains('/') {
                        return Err(CacheError::invalid(format!(
                            "'{}' is neither key=value nor a URL",
                            arg
                        )));
                    }
                    params.url = Some(arg.to_string());
                }
                None => {
                    return Err(CacheError::invalid(format!(
                        "unexpected argument '{}' (url already given)",
                        arg
                    )));
                }
            }
        }

        Ok(params)
    }

    fn set(&mut self, key: &str, value: &str) -> CacheResult<()> {
        let value = value.to_string();
        match key {
            "url" => self.url = Some(value),
            "owner" => self.owner = Some(value),
            "repo" => self.repo = Some(value),
            "branch" => self.branch = Some(value),
            "path" => self.path = Some(value),
            "id" => self.id = Some(value),
            "releaseTag" => self.release_tag = Some(value),
            "asset" => self.asset = Some(value),
            "assets" => self.assets.extend(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from),
            ),
            _ => {
                return Err(CacheError::invalid(format!(
                    "invalid key: {} (expected one of {})",
                    key,
                    PARAM_KEYS.join(", ")
                )))
            }
        }
        Ok(())
    }
}

/// Split `key=value`, unless the text before `=` is part of a URL
fn key_value(arg: &str) -> Option<(&str, &str)> {
    let (key, value) = arg.split_once('=')?;
    if PARAM_KEYS.contains(&key) || !key.contains(|c: char| c == ':' || c == '/') {
        Some((key, value))
    } else {
        None
    }
}
