//! Registry connectors with a shared pipeline shape.
//!
//! Each connector runs the same stages: build a provider query from a typed
//! request, consult the knowledge base through the cache gate, fetch with a
//! bounded timeout, normalize the response defensively record by record, and
//! assemble a [`ToolResponse`] carrying proposed cache writes.
//!
//! # Feature Flags
//!
//! Individual connectors can be disabled at compile time using Cargo
//! features:
//!
//! - `clinical-trials` - Enable the ClinicalTrials.gov connector (default: enabled)
//! - `pubmed` - Enable the PubMed search and fetch connectors (default: enabled)

#[cfg(feature = "clinical-trials")]
mod clinical_trials;
#[cfg(feature = "pubmed")]
mod pubmed_fetch;
#[cfg(feature = "pubmed")]
mod pubmed_search;
#[cfg(feature = "pubmed")]
mod pubmed_xml;

#[cfg(feature = "clinical-trials")]
pub use clinical_trials::ClinicalTrialsConnector;
#[cfg(feature = "pubmed")]
pub use pubmed_fetch::PubMedFetchConnector;
#[cfg(feature = "pubmed")]
pub use pubmed_search::PubMedSearchConnector;

use async_trait::async_trait;

use crate::kb::KnowledgeStore;
use crate::models::ToolResponse;

/// The interface every registry connector implements.
///
/// A connector is stateless per invocation; concurrent calls need no
/// coordination. The knowledge store is optional; without one the cache
/// gate is a no-op and every call fetches.
#[async_trait]
pub trait Connector: Send + Sync + std::fmt::Debug {
    /// Typed, validated request parameters for this connector
    type Request: Send + Sync;

    /// Unique identifier (e.g. "clinical_trials")
    fn id(&self) -> &str;

    /// Human-readable name
    fn name(&self) -> &str;

    /// Run the full pipeline. Never returns `Err`: every failure folds into
    /// a `status = "error"` response.
    async fn execute(
        &self,
        request: &Self::Request,
        kb: Option<&dyn KnowledgeStore>,
    ) -> ToolResponse;
}

/// Errors that can occur inside a connector pipeline
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    /// Request failed validation; no network call was made
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Upstream answered HTTP 429. Distinct from other upstream failures so
    /// callers can back off; not retried here.
    #[error("{provider} rate limit exceeded. Please wait before making more requests.")]
    RateLimited { provider: String },

    /// Upstream answered a non-200 status
    #[error("{provider} API returned status {status}: {body}")]
    UpstreamStatus {
        provider: String,
        status: u16,
        body: String,
    },

    /// Transport failure, including the per-call timeout
    #[error("Network error: {0}")]
    Network(String),

    /// Response body could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ConnectorError {
    /// Stable failure-kind tag for classification.
    pub fn kind(&self) -> &'static str {
        match self {
            ConnectorError::InvalidRequest(_) => "invalid_request",
            ConnectorError::RateLimited { .. } => "rate_limited",
            ConnectorError::UpstreamStatus { .. } => "upstream_status",
            ConnectorError::Network(_) => "network",
            ConnectorError::Parse(_) => "parse",
        }
    }
}

impl From<reqwest::Error> for ConnectorError {
    fn from(err: reqwest::Error) -> Self {
        ConnectorError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ConnectorError {
    fn from(err: serde_json::Error) -> Self {
        ConnectorError::Parse(format!("JSON: {}", err))
    }
}

impl From<quick_xml::DeError> for ConnectorError {
    fn from(err: quick_xml::DeError) -> Self {
        ConnectorError::Parse(format!("XML: {}", err))
    }
}
