//! Stored todo objects.
//!
//! Objects are keyed by `(Category, SubCategory)`. The single root object
//! lists every todo list by name; each list object holds its items.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Partition of a stored object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Root,
    List,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Root => "ROOT",
            Self::List => "LIST",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Index of all lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootObject {
    #[serde(rename = "Category")]
    pub category: Category,

    #[serde(rename = "SubCategory")]
    pub sub_category: String,

    pub lists: Vec<String>,
}

impl Default for RootObject {
    fn default() -> Self {
        Self {
            category: Category::Root,
            sub_category: Category::Root.as_str().to_string(),
            lists: Vec::new(),
        }
    }
}

/// One named list and its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListObject {
    #[serde(rename = "Category")]
    pub category: Category,

    #[serde(rename = "SubCategory")]
    pub sub_category: String,

    pub items: Vec<String>,
}

impl ListObject {
    /// Empty list called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            category: Category::List,
            sub_category: name.into(),
            items: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.sub_category
    }
}

/// Any stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TodoObject {
    Root(RootObject),
    List(ListObject),
}

impl TodoObject {
    /// Storage key.
    pub fn key(&self) -> (Category, String) {
        match self {
            Self::Root(root) => (root.category, root.sub_category.clone()),
            Self::List(list) => (list.category, list.sub_category.clone()),
        }
    }
}

impl From<RootObject> for TodoObject {
    fn from(root: RootObject) -> Self {
        Self::Root(root)
    }
}

impl From<ListObject> for TodoObject {
    fn from(list: ListObject) -> Self {
        Self::List(list)
    }
}
