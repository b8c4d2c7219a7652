//! Configuration management.
//!
//! All connector tunables live in one explicit structure with documented
//! defaults, validated once at the boundary. Values can come from a config
//! file plus `BIOMED_CONNECT_*` environment overrides.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Provider maximum for a ClinicalTrials.gov page.
pub const CTGOV_MAX_PAGE_SIZE: usize = 1000;

/// Provider maximum for an esearch result list.
pub const PUBMED_MAX_SEARCH_RESULTS: usize = 100;

/// Provider maximum for one batched efetch call.
pub const PUBMED_MAX_BATCH_PMIDS: usize = 50;

/// Connector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Per-call timeout budgets
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Result caps, clamped to provider maxima
    #[serde(default)]
    pub limits: LimitConfig,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            timeouts: TimeoutConfig::default(),
            limits: LimitConfig::default(),
        }
    }
}

impl ConnectorConfig {
    /// Validate the configuration once at the boundary.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "http.connect_timeout_secs must be positive".to_string(),
            ));
        }
        for (name, value) in [
            ("timeouts.search_secs", self.timeouts.search_secs),
            ("timeouts.fetch_secs", self.timeouts.fetch_secs),
            ("timeouts.detail_fetch_secs", self.timeouts.detail_fetch_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{} must be positive", name)));
            }
        }
        for (name, value, cap) in [
            (
                "limits.max_trial_results",
                self.limits.max_trial_results,
                CTGOV_MAX_PAGE_SIZE,
            ),
            (
                "limits.max_article_results",
                self.limits.max_article_results,
                PUBMED_MAX_SEARCH_RESULTS,
            ),
            (
                "limits.max_batch_pmids",
                self.limits.max_batch_pmids,
                PUBMED_MAX_BATCH_PMIDS,
            ),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{} must be positive", name)));
            }
            if value > cap {
                return Err(ConfigError::Invalid(format!(
                    "{} exceeds the provider maximum of {}",
                    name, cap
                )));
            }
        }
        Ok(())
    }
}

/// HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Custom user agent; defaults to `<pkg>/<version>`
    #[serde(default)]
    pub user_agent: Option<String>,

    /// TCP connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: None,
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl HttpConfig {
    /// Connect timeout as a [`Duration`].
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn default_connect_timeout() -> u64 {
    10
}

/// Per-call timeout budgets in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Simple search calls (CT.gov studies, esearch)
    #[serde(default = "default_search_timeout")]
    pub search_secs: u64,

    /// Batched detail call on the search path (efetch)
    #[serde(default = "default_fetch_timeout")]
    pub fetch_secs: u64,

    /// Batched detail call on the fetch-by-id path (efetch, rettype=full)
    #[serde(default = "default_detail_fetch_timeout")]
    pub detail_fetch_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            search_secs: default_search_timeout(),
            fetch_secs: default_fetch_timeout(),
            detail_fetch_secs: default_detail_fetch_timeout(),
        }
    }
}

impl TimeoutConfig {
    /// Search timeout as a [`Duration`].
    pub fn search(&self) -> Duration {
        Duration::from_secs(self.search_secs)
    }

    /// Search-path batch fetch timeout as a [`Duration`].
    pub fn fetch(&self) -> Duration {
        Duration::from_secs(self.fetch_secs)
    }

    /// Detail-path batch fetch timeout as a [`Duration`].
    pub fn detail_fetch(&self) -> Duration {
        Duration::from_secs(self.detail_fetch_secs)
    }
}

fn default_search_timeout() -> u64 {
    30
}

fn default_fetch_timeout() -> u64 {
    60
}

fn default_detail_fetch_timeout() -> u64 {
    90
}

/// Result caps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitConfig {
    /// Maximum studies per CT.gov search (provider cap 1000)
    #[serde(default = "default_max_trial_results")]
    pub max_trial_results: usize,

    /// Maximum articles per PubMed search (provider cap 100)
    #[serde(default = "default_max_article_results")]
    pub max_article_results: usize,

    /// Maximum PMIDs per batched detail fetch (provider cap 50)
    #[serde(default = "default_max_batch_pmids")]
    pub max_batch_pmids: usize,
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            max_trial_results: default_max_trial_results(),
            max_article_results: default_max_article_results(),
            max_batch_pmids: default_max_batch_pmids(),
        }
    }
}

fn default_max_trial_results() -> usize {
    CTGOV_MAX_PAGE_SIZE
}

fn default_max_article_results() -> usize {
    PUBMED_MAX_SEARCH_RESULTS
}

fn default_max_batch_pmids() -> usize {
    PUBMED_MAX_BATCH_PMIDS
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A value failed boundary validation
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// The file/env source could not be read or deserialized
    #[error(transparent)]
    Load(#[from] config::ConfigError),
}

/// Load configuration from a file, with `BIOMED_CONNECT_*` environment
/// overrides, and validate it.
pub fn load_config(path: &PathBuf) -> Result<ConnectorConfig, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path.as_path()))
        .add_source(config::Environment::with_prefix("BIOMED_CONNECT").separator("__"))
        .build()?;

    let loaded: ConnectorConfig = settings.try_deserialize().map_err(ConfigError::Load)?;
    loaded.validate()?;
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ConnectorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeouts.search(), Duration::from_secs(30));
        assert_eq!(config.timeouts.fetch(), Duration::from_secs(60));
        assert_eq!(config.timeouts.detail_fetch(), Duration::from_secs(90));
        assert_eq!(config.limits.max_trial_results, 1000);
        assert_eq!(config.limits.max_article_results, 100);
        assert_eq!(config.limits.max_batch_pmids, 50);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = ConnectorConfig::default();
        config.timeouts.search_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_limit_over_provider_cap_rejected() {
        let mut config = ConnectorConfig::default();
        config.limits.max_article_results = 500;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("provider maximum"));
    }

    #[test]
    fn test_zero_limit_rejected() {
        let mut config = ConnectorConfig::default();
        config.limits.max_batch_pmids = 0;
        assert!(config.validate().is_err());
    }
}
