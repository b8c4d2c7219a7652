//! # biomed-connect
//!
//! Connectors letting an automated agent query external biomedical
//! literature and clinical-trial registries (NCBI PubMed via E-utilities,
//! ClinicalTrials.gov REST API v2) and receive normalized, cacheable
//! results.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Typed requests, normalized records, and the response envelope
//! - [`connectors`]: The connector pipelines (query builder, cache gate,
//!   fetcher, parser/normalizer, result assembler)
//! - [`kb`]: Knowledge-base collaborator seam and cache-key derivation
//! - [`config`]: Validated configuration with documented defaults
//! - [`utils`]: HTTP client and tolerant tree-walk combinators
//!
//! Each connector derives a deterministic cache key from its normalized
//! provider parameters, consults the injected [`kb::KnowledgeStore`] before
//! fetching, and proposes cache writes back to the caller; it never
//! persists anything itself.

pub mod config;
pub mod connectors;
pub mod kb;
pub mod models;
pub mod utils;

// Re-export commonly used types
#[cfg(feature = "clinical-trials")]
pub use connectors::ClinicalTrialsConnector;
#[cfg(feature = "pubmed")]
pub use connectors::{PubMedFetchConnector, PubMedSearchConnector};
pub use connectors::{Connector, ConnectorError};
pub use kb::{CachedEntry, KnowledgeItem, KnowledgeStore};
pub use models::ToolResponse;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
