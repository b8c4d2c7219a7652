//! Stable response envelope shared by all connectors.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::connectors::ConnectorError;
use crate::kb::KnowledgeItem;

/// Outcome tag of a connector invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// The envelope every connector returns.
///
/// `status` is always present; a success carries `payload`, an error
/// carries `error_message`. Proposed knowledge-base writes travel alongside
/// under `_knowledge_items_to_add`; persisting them is the caller's
/// decision. No failure path panics or escapes as `Err`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResponse {
    pub status: ResponseStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    #[serde(
        rename = "_knowledge_items_to_add",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub knowledge_items: Vec<KnowledgeItem>,
}

impl ToolResponse {
    /// Create a success response with the given payload.
    pub fn success(payload: Value) -> Self {
        Self {
            status: ResponseStatus::Success,
            payload: Some(payload),
            error_message: None,
            knowledge_items: Vec::new(),
        }
    }

    /// Create an error response with the given message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            payload: None,
            error_message: Some(message.into()),
            knowledge_items: Vec::new(),
        }
    }

    /// Attach proposed knowledge-base writes.
    pub fn with_knowledge_items(mut self, items: Vec<KnowledgeItem>) -> Self {
        self.knowledge_items = items;
        self
    }

    /// Whether the invocation succeeded.
    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}

impl From<ConnectorError> for ToolResponse {
    fn from(err: ConnectorError) -> Self {
        Self::error(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_shape() {
        let response = ToolResponse::success(json!({"total_results": 0}));
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["status"], "success");
        assert_eq!(value["payload"]["total_results"], 0);
        assert!(value.get("error_message").is_none());
        assert!(value.get("_knowledge_items_to_add").is_none());
    }

    #[test]
    fn test_error_shape() {
        let response = ToolResponse::error("Search query cannot be empty");
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["status"], "error");
        assert_eq!(value["error_message"], "Search query cannot be empty");
        assert!(value.get("payload").is_none());
    }

    #[test]
    fn test_knowledge_items_serialized_under_private_key() {
        let item = KnowledgeItem {
            item_type: "PUBMED_SEARCH_RESULTS".to_string(),
            content: json!({}),
            source_uri: "ncbi_search://term=x".to_string(),
            metadata: json!({"result_count": 1}),
        };
        let response = ToolResponse::success(json!({})).with_knowledge_items(vec![item]);
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(
            value["_knowledge_items_to_add"][0]["source_uri"],
            "ncbi_search://term=x"
        );
    }
}
