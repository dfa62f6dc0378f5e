//! Web target driver - streams a URL's response body to disk

use std::path::Path;
use tracing::info;

use crate::backends::{file_name_from_url, replace_dir, FetchContext, Fetcher};
use crate::cache::kind::ResourceKind;
use crate::cache::resource::Resource;
use crate::core::error::{FetchError, FetchResult};

pub struct WebFetcher;

impl Fetcher for WebFetcher {
    fn kind(&self) -> ResourceKind {
        ResourceKind::WebTarget
    }

    fn fetch(&self, ctx: &FetchContext, resource: &Resource, dest: &Path) -> FetchResult<()> {
        let Resource::Web { url } = resource else {
            return Err(FetchError::Mismatch(self.kind()));
        };

        let name = file_name_from_url(url);
        replace_dir(dest, |dir| {
            let bytes = ctx.http.download_to(url, &dir.join(&name))?;
            info!(%url, file = %name, bytes, "Fetched web target");
            Ok(())
        })
    }
}
