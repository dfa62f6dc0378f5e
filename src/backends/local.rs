//! Local target driver - copies a file or directory tree into the item

use std::fs;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

use crate::backends::{replace_dir, FetchContext, Fetcher};
use crate::cache::kind::ResourceKind;
use crate::cache::resource::Resource;
use crate::core::error::{FetchError, FetchResult};

pub struct LocalFetcher;

impl Fetcher for LocalFetcher {
    fn kind(&self) -> ResourceKind {
        ResourceKind::LocalTarget
    }

    /// A file lands as `dest/<file name>`; a directory's contents are
    /// copied directly into `dest`.
    fn fetch(&self, _ctx: &FetchContext, resource: &Resource, dest: &Path) -> FetchResult<()> {
        let Resource::Local { path } = resource else {
            return Err(FetchError::Mismatch(self.kind()));
        };
        let source = Path::new(path);
        // the cache root may sit inside the source tree
        let cache_root = dest.parent().and_then(|p| p.canonicalize().ok());

        replace_dir(dest, |dir| {
            if source.is_dir() {
                copy_tree(source, dir, cache_root.as_deref())
            } else {
                let name = source.file_name().ok_or_else(|| {
                    FetchError::io(
                        format!("{} has no file name", path),
                        std::io::Error::from(std::io::ErrorKind::InvalidInput),
                    )
                })?;
                fs::copy(source, dir.join(name))
                    .map_err(|e| FetchError::io(format!("Failed to copy {}", path), e))?;
                Ok(())
            }
        })
    }
}

fn copy_tree(source: &Path, target: &Path, skip: Option<&Path>) -> FetchResult<()> {
    let walker = WalkDir::new(source)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| Some(entry.path()) != skip);
    for entry in walker {
        let entry = entry.map_err(|e| {
            let message = format!("Failed to walk {}", source.display());
            FetchError::io(message, e.into())
        })?;
        let relative = match entry.path().strip_prefix(source) {
            Ok(r) => r,
            Err(_) => continue,
        };
        let out = target.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&out)
                .map_err(|e| FetchError::io(format!("Failed to create {}", out.display()), e))?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = out.parent() {
                fs::create_dir_all(parent).map_err(|e| {
                    FetchError::io(format!("Failed to create {}", parent.display()), e)
                })?;
            }
            fs::copy(entry.path(), &out).map_err(|e| {
                FetchError::io(format!("Failed to copy {}", entry.path().display()), e)
            })?;
        }
    }
    debug!(source = %source.display(), "Copied directory tree");
    Ok(())
}
