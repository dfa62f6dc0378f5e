//! Path utilities and the on-disk layout of the cache home
//!
//! ```text
//! <home>/cache.json     store document
//! <home>/cache.lock     advisory lock taken while rewriting the store
//! <home>/cache/<id>/    content of one item
//! ```

use std::path::{Path, PathBuf};

/// Store document file name
pub const STORE_FILE: &str = "cache.json";

/// Lock file name (sibling of the store document)
pub const LOCK_FILE: &str = "cache.lock";

/// Directory holding one subdirectory per item
pub const CACHE_DIR: &str = "cache";

/// Normalize a path to use '/' as separator (for cross-platform consistency)
pub fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Default home directory: `~/.cacher`, or `./.cacher` without a home
pub fn default_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".cacher")
}

/// Resolved locations under a cache home
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLayout {
    home: PathBuf,
}

impl CacheLayout {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn store_file(&self) -> PathBuf {
        self.home.join(STORE_FILE)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.home.join(CACHE_DIR)
    }

    /// Content directory of one item
    pub fn item_dir(&self, id: &str) -> PathBuf {
        self.cache_dir().join(id)
    }
}

/// Whether `dir` is missing or has no entries
pub fn is_dir_empty(dir: &Path) -> bool {
    match std::fs::read_dir(dir) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) => true,
    }
}

/// Validate that a path is within the root directory (prevent path traversal)
pub fn is_within_root(path: &Path, root: &Path) -> bool {
    path.canonicalize()
        .ok()
        .and_then(|p| root.canonicalize().ok().map(|r| p.starts_with(r)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        let path = Path::new("src/main.rs");
        assert_eq!(normalize_path(path), "src/main.rs");
    }

    #[test]
    fn test_layout() {
        let layout = CacheLayout::new("/h");
        assert_eq!(layout.store_file(), PathBuf::from("/h/cache.json"));
        assert_eq!(layout.cache_dir(), PathBuf::from("/h/cache"));
        assert_eq!(layout.item_dir("abc"), PathBuf::from("/h/cache/abc"));
    }

    #[test]
    fn test_is_dir_empty() {
        let temp = tempfile::tempdir().unwrap();
        assert!(is_dir_empty(temp.path()));
        assert!(is_dir_empty(&temp.path().join("missing")));

        std::fs::write(temp.path().join("f"), "x").unwrap();
        assert!(!is_dir_empty(temp.path()));
    }

    #[test]
    fn test_is_within_root() {
        let temp = tempfile::tempdir().unwrap();
        let subdir = temp.path().join("subdir");
        std::fs::create_dir(&subdir).unwrap();
        let file = subdir.join("file.txt");
        std::fs::write(&file, "test").unwrap();

        assert!(is_within_root(&file, temp.path()));
    }

    #[test]
    fn test_is_within_root_outside() {
        let temp1 = tempfile::tempdir().unwrap();
        let temp2 = tempfile::tempdir().unwrap();
        let file = temp1.path().join("file.txt");
        std::fs::write(&file, "test").unwrap();

        assert!(!is_within_root(&file, temp2.path()));
    }
}
