//! Blocking HTTP client shared by the network drivers

use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::core::error::{FetchError, FetchResult};

const USER_AGENT: &str = concat!("cacher/", env!("CARGO_PKG_VERSION"));

/// Thin wrapper over `reqwest::blocking::Client` with a per-request timeout
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> FetchResult<Self> {
        Self::build(timeout, true)
    }

    /// Client that ignores proxy settings from the environment
    #[cfg(test)]
    pub fn direct(timeout: Duration) -> FetchResult<Self> {
        Self::build(timeout, false)
    }

    fn build(timeout: Duration, use_env_proxy: bool) -> FetchResult<Self> {
        let mut builder = Client::builder().user_agent(USER_AGENT).timeout(timeout);
        if !use_env_proxy {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|e| FetchError::http("<client>", e))?;
        Ok(Self { client })
    }

    /// GET `url`, failing on any non-success status
    pub fn get(&self, url: &str) -> FetchResult<Response> {
        debug!(%url, "HTTP GET");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::http(url, e))?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(response)
    }

    /// GET a JSON document from the GitHub REST API
    pub fn get_json<T: DeserializeOwned>(&self, url: &str) -> FetchResult<T> {
        debug!(%url, "HTTP GET (json)");
        let response = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .send()
            .map_err(|e| FetchError::http(url, e))?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response.text().map_err(|e| FetchError::http(url, e))?;
        serde_json::from_str(&body).map_err(|e| FetchError::Json {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// Stream the body of `url` into `dest`, replacing it. Returns bytes written.
    pub fn download_to(&self, url: &str, dest: &Path) -> FetchResult<u64> {
        let mut response = self.get(url)?;
        let file = File::create(dest)
            .map_err(|e| FetchError::io(format!("Failed to create {}", dest.display()), e))?;
        let mut writer = BufWriter::new(file);
        let written = response
            .copy_to(&mut writer)
            .map_err(|e| FetchError::http(url, e))?;
        writer
            .flush()
            .map_err(|e| FetchError::io(format!("Failed to write {}", dest.display()), e))?;
        debug!(%url, dest = %dest.display(), bytes = written, "Downloaded");
        Ok(written)
    }
}
