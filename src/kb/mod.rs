//! Knowledge-base collaborator seam and cache-key derivation.
//!
//! The connectors never own storage. They read through a [`KnowledgeStore`]
//! before fetching, and propose writes back to the caller as
//! [`KnowledgeItem`]s keyed by the same URI, so a later identical request
//! hits cache. Lifetime and eviction of entries belong entirely to the
//! store's owner.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An entry read back from the knowledge base.
///
/// Immutable once written; this crate only ever reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedEntry {
    /// The cached payload content.
    pub content: Value,

    /// Store-owned metadata attached at write time.
    #[serde(default)]
    pub metadata: Value,
}

/// A proposed knowledge-base write.
///
/// Connectors emit these alongside the response; persisting them is the
/// caller's decision and happens outside this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeItem {
    /// Item type tag, e.g. `CLINICAL_TRIALS_SEARCH_RESULTS`.
    pub item_type: String,

    /// The payload to persist.
    pub content: Value,

    /// URI equal to the derived cache key, so an identical later request
    /// resolves to this item.
    pub source_uri: String,

    /// Descriptive metadata for the store.
    pub metadata: Value,
}

/// Read-only contract the external knowledge base exposes to connectors.
#[async_trait]
pub trait KnowledgeStore: Send + Sync + std::fmt::Debug {
    /// Look up an item by its source URI. `None` means a cache miss.
    async fn get_item_by_uri(&self, uri: &str) -> Option<CachedEntry>;
}

/// Derive a deterministic cache key from normalized parameter pairs.
///
/// Pairs are formatted as `key=value`, sorted, and joined with `_`, so
/// semantically-equal requests produce identical keys regardless of the
/// order the parameters were assembled in.
pub fn derive_key(params: &[(String, String)]) -> String {
    let mut pairs: Vec<String> = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect();
    pairs.sort();
    pairs.join("_")
}
