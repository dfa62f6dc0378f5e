//! Cache API - the operations behind each subcommand
//!
//! Each function maps a manager operation to a `ResultSet`; `cli::run`
//! renders it.

use std::path::Path;

use crate::cache::kind::ResourceKind;
use crate::cache::manager::{CacheManager, CacheOptions};
use crate::cache::params::Params;
use crate::cache::resolve::resolve;
use crate::core::error::{CacheError, CacheResult};
use crate::core::model::{ResultItem, ResultSet};
use crate::core::paths::{is_within_root, normalize_path};

/// How a command names the item it acts on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// An id, short id or query string
    Id(String),
    /// A kind plus raw parameters, resolved to a canonical resource
    Resource { kind: ResourceKind, params: Params },
}

impl Target {
    /// Build from `--id` / `-c KIND -a ARG...`; arguments win over an id
    pub fn from_cli(id: Option<String>, kind: Option<ResourceKind>, args: &[String]) -> CacheResult<Self> {
        if !args.is_empty() {
            let kind = kind.ok_or_else(|| CacheError::invalid("a resource kind (-c) is required with -a"))?;
            return Ok(Target::Resource {
                kind,
                params: Params::from_cli_args(args)?,
            });
        }
        match id {
            Some(id) => Ok(Target::Id(id)),
            None => Err(CacheError::invalid("either --id or -c KIND -a ARG is required")),
        }
    }
}

/// Id of an existing item named by `query` (exact id first, then `query`)
pub fn locate(manager: &CacheManager<'_>, query: &str) -> CacheResult<String> {
    if manager.get(query).is_some() {
        return Ok(query.to_string());
    }
    manager
        .query(query)
        .map(|(id, _)| id.to_string())
        .ok_or_else(|| CacheError::not_found(format!("no item matches {:?}", query)))
}

/// Id for `target`. A resource target is cached first when `create` is set.
fn select(manager: &mut CacheManager<'_>, target: &Target, create: Option<CacheOptions>) -> CacheResult<String> {
    match target {
        Target::Id(query) => locate(manager, query),
        Target::Resource { kind, params } => match create {
            Some(options) => manager.cache_or_get(*kind, params, options),
            None => {
                let resource = resolve(*kind, params)?;
                manager.find(&resource).map(String::from).ok_or_else(|| {
                    CacheError::not_found(format!("no cached {} item for {}", kind, resource.signature()))
                })
            }
        },
    }
}

fn item_result(manager: &CacheManager<'_>, id: &str) -> CacheResult<ResultItem> {
    let item = manager
        .get(id)
        .ok_or_else(|| CacheError::not_found(format!("item {}", id)))?;
    let path = manager.path_of(id)?;
    Ok(ResultItem::item(id, item).with_path(normalize_path(&path)))
}

/// Cache (or look up) a resource and report the item
pub fn cache_resource(
    manager: &mut CacheManager<'_>,
    kind: ResourceKind,
    params: &Params,
    options: CacheOptions,
) -> CacheResult<ResultSet> {
    let id = manager.cache_or_get(kind, params, options)?;
    Ok(ResultSet::from_iter([item_result(manager, &id)?]))
}

/// Canonical form of a resource, without touching the store
pub fn resolve_resource(kind: ResourceKind, params: &Params) -> CacheResult<ResultSet> {
    let resource = resolve(kind, params)?;
    Ok(ResultSet::from_iter([ResultItem::resolved(&resource)]))
}

/// Run a (possibly forced) check on one item
pub fn check_item(
    manager: &mut CacheManager<'_>,
    target: &Target,
    force: bool,
    options: CacheOptions,
) -> CacheResult<ResultSet> {
    let id = select(
        manager,
        target,
        Some(CacheOptions {
            check_on_hit: false,
            ..options
        }),
    )?;
    let refreshed = manager.check(&id, force)?;
    let message = if refreshed {
        "refreshed"
    } else {
        "not due for checking"
    };
    Ok(ResultSet::from_iter([item_result(manager, &id)?.with_message(message)]))
}

/// Every item, optionally of one kind, in insertion order
pub fn list_items(manager: &CacheManager<'_>, kind: Option<ResourceKind>) -> ResultSet {
    manager
        .iter(kind)
        .map(|(id, item)| {
            ResultItem::item(id, item).with_path(normalize_path(&manager.layout().item_dir(id)))
        })
        .collect()
}

pub fn remove_item(manager: &mut CacheManager<'_>, target: &Target) -> CacheResult<ResultSet> {
    let id = select(manager, target, None)?;
    let item = manager.remove(&id)?;
    Ok(ResultSet::from_iter([ResultItem::item(&id, &item).with_message("removed")]))
}

/// Wipe every item and the whole cache root
pub fn purge_all(manager: &mut CacheManager<'_>) -> CacheResult<ResultSet> {
    manager.purge()?;
    Ok(ResultSet::from_iter([ResultItem::status("cache purged")]))
}

/// Entries under the cache root that no item refers to
pub fn list_orphans(manager: &CacheManager<'_>) -> CacheResult<ResultSet> {
    let root = manager.layout().cache_dir();
    Ok(manager
        .orphans()?
        .into_iter()
        .map(|name| {
            let path = normalize_path(&root.join(&name));
            ResultItem::orphan(name, path)
        })
        .collect())
}

pub fn remove_orphans(manager: &CacheManager<'_>, names: &[String]) -> CacheResult<ResultSet> {
    let removed = manager.remove_orphans(names)?;
    Ok(ResultSet::from_iter([ResultItem::status(format!(
        "removed {} orphan entr{}",
        removed,
        if removed == 1 { "y" } else { "ies" }
    ))]))
}

pub fn query_items(manager: &CacheManager<'_>, query: &str) -> CacheResult<ResultSet> {
    let (id, _) = manager
        .query(query)
        .ok_or_else(|| CacheError::not_found(format!("no item matches {:?}", query)))?;
    let id = id.to_string();
    Ok(ResultSet::from_iter([item_result(manager, &id)?]))
}

/// Content path of an item, or of `subpath` inside it. A resource target
/// is cached (and checked) first.
pub fn item_path(
    manager: &mut CacheManager<'_>,
    target: &Target,
    subpath: Option<&Path>,
    options: CacheOptions,
) -> CacheResult<ResultSet> {
    let id = select(manager, target, Some(options))?;
    let dir = manager.path_of(&id)?;

    let path = match subpath {
        None => dir,
        Some(sub) => {
            let joined = dir.join(sub);
            if !joined.exists() {
                return Err(CacheError::not_found(format!(
                    "{} in item {}",
                    sub.display(),
                    id
                )));
            }
            if !is_within_root(&joined, &dir) {
                return Err(CacheError::invalid(format!(
                    "{} escapes the item directory",
                    sub.display()
                )));
            }
            joined
        }
    };

    Ok(ResultSet::from_iter([item_result(manager, &id)?.with_path(normalize_path(&path))]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::FetchContext;
    use crate::cache::store::Store;
    use crate::core::model::Kind;
    use crate::core::paths::CacheLayout;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    struct Fixture {
        temp: TempDir,
        layout: CacheLayout,
        store: Store,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = tempdir().unwrap();
            let layout = CacheLayout::new(temp.path().join("home"));
            let store = Store::open(layout.store_file()).unwrap();
            fs::create_dir_all(temp.path().join("src")).unwrap();
            fs::write(temp.path().join("src").join("a.txt"), "alpha").unwrap();
            fs::write(temp.path().join("b.txt"), "beta").unwrap();
            Self {
                temp,
                layout,
                store,
            }
        }

        fn manager(&mut self) -> CacheManager<'_> {
            CacheManager::new(
                &mut self.store,
                self.layout.clone(),
                FetchContext::direct("http://unused"),
            )
        }

        fn local(&self, rel: &str) -> Params {
            Params::path(self.temp.path().join(rel).to_string_lossy())
        }
    }

    #[test]
    fn test_target_from_cli() {
        let args = vec!["path=/tmp".to_string()];
        let target = Target::from_cli(None, Some(ResourceKind::LocalTarget), &args).unwrap();
        assert!(matches!(target, Target::Resource { kind: ResourceKind::LocalTarget, .. }));

        assert_eq!(
            Target::from_cli(Some("abc".into()), None, &[]).unwrap(),
            Target::Id("abc".into())
        );
        assert!(Target::from_cli(None, None, &args).is_err());
        assert!(Target::from_cli(None, None, &[]).is_err());
    }

    #[test]
    fn test_cache_resource_reports_item_with_path() {
        let mut fx = Fixture::new();
        let params = fx.local("src");
        let mut manager = fx.manager();
        let set = cache_resource(&mut manager, ResourceKind::LocalTarget, &params, CacheOptions::default())
            .unwrap();

        assert_eq!(set.len(), 1);
        let item = &set.items[0];
        assert_eq!(item.kind, Kind::Item);
        let path = item.path.as_deref().unwrap();
        assert!(Path::new(path).join("a.txt").exists());
    }

    #[test]
    fn test_resolve_resource_does_not_touch_store() {
        let mut fx = Fixture::new();
        let params = Params::url("https://github.com/o/r/blob/main/x.txt");
        let set = resolve_resource(ResourceKind::GithubRawFile, &params).unwrap();
        assert_eq!(set.items[0].kind, Kind::Resolved);
        assert_eq!(
            set.items[0].signature.as_deref(),
            Some("https://raw.githubusercontent.com/o/r/main/x.txt")
        );
        assert_eq!(fx.manager().iter(None).count(), 0);
    }

    #[test]
    fn test_check_item_by_resource_and_id() {
        let mut fx = Fixture::new();
        let params = fx.local("b.txt");
        let mut manager = fx.manager();
        let target = Target::Resource {
            kind: ResourceKind::LocalTarget,
            params,
        };

        let first = check_item(&mut manager, &target, false, CacheOptions::default()).unwrap();
        assert_eq!(first.items[0].message.as_deref(), Some("not due for checking"));

        let id = first.items[0].id.clone().unwrap();
        let forced = check_item(&mut manager, &Target::Id(id), true, CacheOptions::default()).unwrap();
        assert_eq!(forced.items[0].message.as_deref(), Some("refreshed"));
    }

    #[test]
    fn test_remove_by_resource_requires_existing_item() {
        let mut fx = Fixture::new();
        let params = fx.local("b.txt");
        let mut manager = fx.manager();
        let target = Target::Resource {
            kind: ResourceKind::LocalTarget,
            params: params.clone(),
        };

        assert!(matches!(remove_item(&mut manager, &target), Err(CacheError::NotFound(_))));

        manager
            .cache_or_get(ResourceKind::LocalTarget, &params, CacheOptions::default())
            .unwrap();
        let removed = remove_item(&mut manager, &target).unwrap();
        assert_eq!(removed.items[0].message.as_deref(), Some("removed"));
        assert_eq!(list_items(&manager, None).len(), 0);
    }

    #[test]
    fn test_list_items_filters_by_kind() {
        let mut fx = Fixture::new();
        let a = fx.local("b.txt");
        let mut manager = fx.manager();
        manager
            .cache_or_get(ResourceKind::LocalTarget, &a, CacheOptions::default())
            .unwrap();

        assert_eq!(list_items(&manager, None).len(), 1);
        assert_eq!(list_items(&manager, Some(ResourceKind::LocalTarget)).len(), 1);
        assert!(list_items(&manager, Some(ResourceKind::WebTarget)).is_empty());
    }

    #[test]
    fn test_orphans_listed_and_removed() {
        let mut fx = Fixture::new();
        fs::create_dir_all(fx.layout.cache_dir().join("stray")).unwrap();
        let manager = fx.manager();

        let orphans = list_orphans(&manager).unwrap();
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans.items[0].kind, Kind::Orphan);
        assert_eq!(orphans.items[0].id.as_deref(), Some("stray"));

        let names = vec!["stray".to_string()];
        let result = remove_orphans(&manager, &names).unwrap();
        assert_eq!(result.items[0].message.as_deref(), Some("removed 1 orphan entry"));
        assert!(list_orphans(&manager).unwrap().is_empty());
    }

    #[test]
    fn test_query_items_not_found() {
        let mut fx = Fixture::new();
        let manager = fx.manager();
        assert!(matches!(query_items(&manager, "nothing"), Err(CacheError::NotFound(_))));
    }

    #[test]
    fn test_item_path_with_subpath() {
        let mut fx = Fixture::new();
        let params = fx.local("src");
        let mut manager = fx.manager();
        let target = Target::Resource {
            kind: ResourceKind::LocalTarget,
            params,
        };

        let set = item_path(&mut manager, &target, Some(Path::new("a.txt")), CacheOptions::default())
            .unwrap();
        let path = set.items[0].path.clone().unwrap();
        assert!(path.ends_with("/a.txt"));
        assert_eq!(fs::read_to_string(path).unwrap(), "alpha");

        let missing = item_path(&mut manager, &target, Some(Path::new("nope")), CacheOptions::default());
        assert!(matches!(missing, Err(CacheError::NotFound(_))));

        let escape = item_path(&mut manager, &target, Some(Path::new("..")), CacheOptions::default());
        assert!(matches!(escape, Err(CacheError::InvalidReference(_))));
    }

    #[test]
    fn test_purge_all() {
        let mut fx = Fixture::new();
        let params = fx.local("b.txt");
        let mut manager = fx.manager();
        manager
            .cache_or_get(ResourceKind::LocalTarget, &params, CacheOptions::default())
            .unwrap();
        let set = purge_all(&mut manager).unwrap();
        assert_eq!(set.items[0].message.as_deref(), Some("cache purged"));
        assert!(list_items(&manager, None).is_empty());
    }
}
