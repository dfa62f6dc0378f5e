//! Unified Result Model
//!
//! Every command maps its outcome to `ResultItem`s before rendering.

use serde::{Deserialize, Serialize};

use crate::cache::item::CacheItem;
use crate::cache::kind::ResourceKind;
use crate::cache::resource::Resource;
use crate::core::error::CacheError;
use crate::core::util::format_time;

/// The kind of result item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// A cached item
    Item,
    /// A canonical resource that was not stored
    Resolved,
    /// A cache-root entry no record refers to
    Orphan,
    /// Informational outcome (refresh, removal, doctor check)
    Status,
    Error,
}

/// Error information for a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemError {
    pub code: String,
    pub message: String,
}

impl ItemError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&CacheError> for ItemError {
    fn from(err: &CacheError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

/// The unified result item that all commands produce
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultItem {
    pub kind: Kind,

    /// Item id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Resource kind
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<ResourceKind>,

    /// URL (or path, for local targets) identifying the resource
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,

    /// Filesystem path of the content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<String>,

    /// Structured payload, e.g. the canonical resource
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ItemError>,
}

impl ResultItem {
    fn empty(kind: Kind) -> Self {
        Self {
            kind,
            id: None,
            resource_type: None,
            signature: None,
            path: None,
            last_checked: None,
            data: None,
            message: None,
            errors: Vec::new(),
        }
    }

    /// A stored item
    pub fn item(id: impl Into<String>, item: &CacheItem) -> Self {
        Self {
            id: Some(id.into()),
            resource_type: Some(item.kind()),
            signature: Some(item.resource.signature().to_string()),
            last_checked: Some(format_time(item.last_checked)),
            ..Self::empty(Kind::Item)
        }
    }

    /// A canonical resource, with its fields as the data payload
    pub fn resolved(resource: &Resource) -> Self {
        Self {
            resource_type: Some(resource.kind()),
            signature: Some(resource.signature().to_string()),
            data: serde_json::to_value(resource).ok(),
            ..Self::empty(Kind::Resolved)
        }
    }

    pub fn orphan(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: Some(name.into()),
            path: Some(path.into()),
            ..Self::empty(Kind::Orphan)
        }
    }

    pub fn status(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::empty(Kind::Status)
        }
    }

    pub fn error(error: ItemError) -> Self {
        Self {
            errors: vec![error],
            ..Self::empty(Kind::Error)
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_error(mut self, error: ItemError) -> Self {
        self.errors.push(error);
        self
    }
}

/// Result set containing multiple result items
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultSet {
    pub items: Vec<ResultItem>,
}

impl ResultSet {
    #[cfg(test)]
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn push(&mut self, item: ResultItem) {
        self.items.push(item);
    }

    pub fn extend(&mut self, items: impl IntoIterator<Item = ResultItem>) {
        self.items.extend(items);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether any item carries an error
    pub fn has_errors(&self) -> bool {
        self.items
            .iter()
            .any(|item| item.kind == Kind::Error || !item.errors.is_empty())
    }
}

impl IntoIterator for ResultSet {
    type Item = ResultItem;
    type IntoIter = std::vec::IntoIter<ResultItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl FromIterator<ResultItem> for ResultSet {
    fn from_iter<T: IntoIterator<Item = ResultItem>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}
