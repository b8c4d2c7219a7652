//! In-memory knowledge store for testing purposes.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{CachedEntry, KnowledgeStore};

/// A [`KnowledgeStore`] backed by a plain map, for tests and examples.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, CachedEntry>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Seed an entry under `uri`.
    pub fn insert(&self, uri: impl Into<String>, content: Value) {
        let mut guard = self.entries.lock().unwrap();
        guard.insert(
            uri.into(),
            CachedEntry {
                content,
                metadata: Value::Null,
            },
        );
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KnowledgeStore for MemoryStore {
    async fn get_item_by_uri(&self, uri: &str) -> Option<CachedEntry> {
        let guard = self.entries.lock().unwrap();
        guard.get(uri).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let store = MemoryStore::new();
        store.insert("clinical_trials://format=json", json!({"studies": []}));

        let entry = store
            .get_item_by_uri("clinical_trials://format=json")
            .await
            .unwrap();
        assert_eq!(entry.content, json!({"studies": []}));

        assert!(store.get_item_by_uri("clinical_trials://other").await.is_none());
    }
}
