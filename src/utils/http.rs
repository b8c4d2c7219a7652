//! HTTP client utilities.

use std::time::Duration;

use reqwest::Client;

use crate::connectors::ConnectorError;

/// Shared HTTP client with sensible defaults.
///
/// One client per connector; each request carries its own total timeout
/// because search and batched-detail calls run on different budgets.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client with the default user agent.
    pub fn new(connect_timeout: Duration) -> Result<Self, ConnectorError> {
        Self::with_user_agent(
            concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")),
            connect_timeout,
        )
    }

    /// Create a new HTTP client with a custom user agent.
    pub fn with_user_agent(
        user_agent: &str,
        connect_timeout: Duration,
    ) -> Result<Self, ConnectorError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .connect_timeout(connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| ConnectorError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Execute a GET and return the response body, classifying failures.
    ///
    /// HTTP 429 maps to [`ConnectorError::RateLimited`], any other non-200
    /// status to [`ConnectorError::UpstreamStatus`] carrying the status and
    /// body, and transport errors (including the timeout) to
    /// [`ConnectorError::Network`]. Failures are terminal; there is no retry.
    pub async fn get_text(
        &self,
        url: &str,
        timeout: Duration,
        provider: &str,
    ) -> Result<String, ConnectorError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| ConnectorError::Network(format!("request to {} failed: {}", provider, e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ConnectorError::RateLimited {
                provider: provider.to_string(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConnectorError::UpstreamStatus {
                provider: provider.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        response
            .text()
            .await
            .map_err(|e| ConnectorError::Network(format!("failed to read response: {}", e)))
    }
}

/// Percent-encode parameter pairs into a query string.
pub fn encode_query(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_query() {
        let params = vec![
            ("db".to_string(), "pubmed".to_string()),
            ("term".to_string(), "machine learning".to_string()),
        ];
        assert_eq!(encode_query(&params), "db=pubmed&term=machine%20learning");
    }
}
