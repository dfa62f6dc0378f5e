//! Doctor - dependency and cache home checks

use std::fs;
use std::path::Path;

use crate::cache::manager::orphan_entries;
use crate::cache::store::Store;
use crate::core::model::{ItemError, ResultItem, ResultSet};
use crate::core::paths::{normalize_path, CacheLayout};
use crate::core::util::command_exists;

/// Dependency status
#[derive(Debug, Clone)]
pub struct DependencyStatus {
    pub name: String,
    pub available: bool,
    pub command: Option<String>,
    pub required: bool,
    pub notes: Option<String>,
}

impl DependencyStatus {
    pub fn to_result_item(&self) -> ResultItem {
        let status = if self.available { "✓" } else { "✗" };
        let required = if self.required {
            "required"
        } else {
            "optional"
        };

        let mut message = format!(
            "{} {} ({}) - {}",
            status,
            self.name,
            required,
            self.command
                .as_ref()
                .map(|c| format!("found: {}", c))
                .unwrap_or_else(|| "not found".to_string())
        );
        if let Some(notes) = &self.notes {
            message.push_str(&format!(" - {}", notes));
        }

        let item = ResultItem::status(message);
        if !self.available && self.required {
            return item.with_error(ItemError::new(
                "MISSING_DEPENDENCY",
                format!("{} is required but not found", self.name),
            ));
        }
        item
    }
}

/// Check external tools
pub fn check_dependencies() -> Vec<DependencyStatus> {
    let git = command_exists("git");
    vec![DependencyStatus {
        name: "git".to_string(),
        available: git,
        command: git.then(|| "git".to_string()),
        required: false,
        notes: Some("needed for gitRepo items".to_string()),
    }]
}

/// Check the cache home, the store document and the cache root
pub fn check_home(layout: &CacheLayout) -> Vec<ResultItem> {
    let mut items = Vec::new();
    let home = layout.home();

    let home_item = ResultItem::status(if home.is_dir() {
        "✓ home directory exists"
    } else {
        "✓ home directory will be created on first use"
    })
    .with_path(normalize_path(home));
    items.push(if writable_ancestor(home) {
        home_item
    } else {
        home_item.with_error(ItemError::new(
            "HOME_NOT_WRITABLE",
            format!("{} is not writable", home.display()),
        ))
    });

    let store_path = layout.store_file();
    let root = layout.cache_dir();
    match Store::open(&store_path) {
        Ok(store) => {
            items.push(
                ResultItem::status(format!("✓ store holds {} item(s)", store.len()))
                    .with_path(normalize_path(&store_path)),
            );
            items.push(orphan_status(&root, &store));
        }
        Err(e) => items.push(
            ResultItem::status("✗ store document is unreadable")
                .with_error(ItemError::from(&e))
                .with_path(normalize_path(&store_path)),
        ),
    }

    items
}

fn orphan_status(root: &Path, store: &Store) -> ResultItem {
    let item = match orphan_entries(root, store) {
        Ok(orphans) if orphans.is_empty() => ResultItem::status("✓ no orphan entries"),
        Ok(orphans) => ResultItem::status(format!(
            "! {} orphan entr{} (run `cacher purge`)",
            orphans.len(),
            if orphans.len() == 1 { "y" } else { "ies" }
        )),
        Err(e) => ResultItem::status("✗ cache root is unreadable").with_error(ItemError::from(&e)),
    };
    item.with_path(normalize_path(root))
}

/// Whether the nearest existing ancestor of `path` accepts writes
fn writable_ancestor(path: &Path) -> bool {
    path.ancestors()
        .find(|p| p.exists())
        .and_then(|p| fs::metadata(p).ok())
        .map(|m| !m.permissions().readonly())
        .unwrap_or(false)
}

/// Full doctor report
pub fn doctor(layout: &CacheLayout) -> ResultSet {
    let mut result_set: ResultSet = check_dependencies()
        .iter()
        .map(DependencyStatus::to_result_item)
        .collect();
    result_set.extend(check_home(layout));
    result_set
}
