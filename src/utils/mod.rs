//! Utility modules supporting the connectors.
//!
//! - [`HttpClient`]: HTTP client with per-request timeouts and status-based
//!   failure classification
//! - [`json`]: tolerant lookup combinators for semi-structured JSON trees
//! - [`text`]: text clipping with an ellipsis marker

mod http;
pub mod json;
pub mod text;

pub use http::{encode_query, HttpClient};
