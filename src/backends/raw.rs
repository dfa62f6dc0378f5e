//! Raw file driver - downloads a single file from the raw content host

use std::path::Path;

use crate::backends::{replace_dir, safe_file_name, FetchContext, Fetcher};
use crate::cache::kind::ResourceKind;
use crate::cache::resource::Resource;
use crate::core::error::{FetchError, FetchResult};

pub struct RawFileFetcher;

impl Fetcher for RawFileFetcher {
    fn kind(&self) -> ResourceKind {
        ResourceKind::GithubRawFile
    }

    fn fetch(&self, ctx: &FetchContext, resource: &Resource, dest: &Path) -> FetchResult<()> {
        let Resource::RawFile { path, url, .. } = resource else {
            return Err(FetchError::Mismatch(self.kind()));
        };

        let name = safe_file_name(path).unwrap_or_else(|| crate::backends::file_name_from_url(url));
        replace_dir(dest, |dir| ctx.http.download_to(url, &dir.join(&name)).map(|_| ()))
    }
}
