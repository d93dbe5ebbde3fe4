//! Todo Persistence
//!
//! [`TodoStore`] is the key-value seam the controller persists through. The
//! bundled [`InMemoryStore`] keeps objects in process memory, which is what
//! the local runtime host and the tests use.

use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

use crate::objects::{Category, ListObject, RootObject, TodoObject};

/// Table name used when none is configured.
pub const DEFAULT_TABLE_NAME: &str = "todo-application-table";

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupt object under {category}/{name}")]
    Corrupt { category: Category, name: String },
}

/// Key-value persistence for todo objects.
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Fetch the root object, if one was stored.
    async fn get_root(&self) -> Result<Option<RootObject>, StoreError>;

    /// Fetch the list called `name`.
    async fn get_list(&self, name: &str) -> Result<Option<ListObject>, StoreError>;

    /// Insert or replace an object under its key.
    async fn put(&self, object: TodoObject) -> Result<(), StoreError>;
}

/// Process-local store.
#[derive(Debug)]
pub struct InMemoryStore {
    table_name: String,
    objects: RwLock<BTreeMap<(Category, String), TodoObject>>,
}

impl InMemoryStore {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            objects: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_TABLE_NAME)
    }
}

#[async_trait]
impl TodoStore for InMemoryStore {
    async fn get_root(&self) -> Result<Option<RootObject>, StoreError> {
        let key = (Category::Root, Category::Root.as_str().to_string());
        match self.objects.read().await.get(&key) {
            None => Ok(None),
            Some(TodoObject::Root(root)) => Ok(Some(root.clone())),
            Some(TodoObject::List(_)) => Err(StoreError::Corrupt {
                category: key.0,
                name: key.1,
            }),
        }
    }

    async fn get_list(&self, name: &str) -> Result<Option<ListObject>, StoreError> {
        let key = (Category::List, name.to_string());
        match self.objects.read().await.get(&key) {
            None => Ok(None),
            Some(TodoObject::List(list)) => Ok(Some(list.clone())),
            Some(TodoObject::Root(_)) => Err(StoreError::Corrupt {
                category: key.0,
                name: key.1,
            }),
        }
    }

    async fn put(&self, object: TodoObject) -> Result<(), StoreError> {
        let key = object.key();
        debug!(table = %self.table_name, category = %key.0, name = %key.1, "Putting object");
        self.objects.write().await.insert(key, object);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_store_has_no_root() {
        let store = InMemoryStore::default();
        assert!(store.get_root().await.unwrap().is_none());
        assert!(store.get_list("missing").await.unwrap().is_none());
        assert_eq!(store.table_name(), DEFAULT_TABLE_NAME);
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let store = InMemoryStore::new("test-table");
        let mut list = ListObject::new("groceries");
        list.items.push("milk".to_string());

        store.put(list.clone().into()).await.unwrap();
        store.put(RootObject::default().into()).await.unwrap();

        assert_eq!(store.get_list("groceries").await.unwrap(), Some(list));
        assert_eq!(store.get_root().await.unwrap(), Some(RootObject::default()));
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_put_replaces_existing_object() {
        let store = InMemoryStore::default();
        store.put(ListObject::new("chores").into()).await.unwrap();

        let mut updated = ListObject::new("chores");
        updated.items.push("dishes".to_string());
        store.put(updated.into()).await.unwrap();

        let list = store.get_list("chores").await.unwrap().unwrap();
        assert_eq!(list.items, vec!["dishes"]);
        assert_eq!(store.len().await, 1);
    }
}
