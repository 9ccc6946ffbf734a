//! In-process record store

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

use super::{RecordStore, StoreResult};
use crate::pattern;

/// Record store held in memory
///
/// Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<DashMap<String, Bytes>>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop a record, returning whether it existed
    pub fn remove(&self, name: &str) -> bool {
        self.records.remove(name).is_some()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn put(&self, name: &str, payload: Bytes) -> StoreResult<()> {
        self.records.insert(name.to_string(), payload);
        Ok(())
    }

    async fn get(&self, name: &str) -> StoreResult<Option<Bytes>> {
        Ok(self.records.get(name).map(|entry| entry.value().clone()))
    }

    async fn list(&self, pattern: &str) -> StoreResult<Vec<String>> {
        Ok(self
            .records
            .iter()
            .filter(|entry| pattern::matches(pattern, entry.key()))
            .map(|entry| entry.key().clone())
            .collect())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_shared_clones() {
        let store = MemoryStore::new();
        let view = store.clone();

        store.put("k_tensor", Bytes::from_static(b"abc")).await.unwrap();
        assert_eq!(view.get("k_tensor").await.unwrap().unwrap().as_ref(), b"abc");
        assert_eq!(view.len(), 1);

        assert!(view.remove("k_tensor"));
        assert!(store.is_empty());
        assert!(store.get("k_tensor").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_store_put_many_in_order() {
        let store = MemoryStore::new();
        store
            .put_many(vec![
                ("a_tensor".to_string(), Bytes::new()),
                ("a_shape".to_string(), Bytes::from_static(b"(0,)")),
            ])
            .await
            .unwrap();

        let mut names = store.list("a_*").await.unwrap();
        names.sort();
        assert_eq!(names, vec!["a_shape", "a_tensor"]);
    }
}
