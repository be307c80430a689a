//! Client configuration. Every field has a default, so a config file only
//! needs the keys it wants to change.

use std::path::{Path, PathBuf};
use std::time::Duration;

use riskmap_core::SubmitPolicy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Root of the classifier service; endpoints live under `/api`.
    pub base_url: String,
    /// Per-request timeout, seconds.
    pub timeout_secs: u64,
    pub submit_policy: SubmitPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout_secs: 30,
            submit_policy: SubmitPolicy::Reject,
        }
    }
}

impl ClientConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Full URL of an endpoint under `/api`.
    pub fn endpoint(&self, name: &str) -> String {
        format!("{}/api/{}", self.base_url.trim_end_matches('/'), name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg = ClientConfig::from_json(r#"{ "submit_policy": "supersede" }"#).unwrap();
        assert_eq!(cfg.submit_policy, SubmitPolicy::Supersede);
        assert_eq!(cfg.base_url, "http://127.0.0.1:8000");
        assert_eq!(cfg.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn endpoint_joins_cleanly() {
        let cfg = ClientConfig { base_url: "http://risk.local:9000/".into(), ..Default::default() };
        assert_eq!(cfg.endpoint("predict"), "http://risk.local:9000/api/predict");
        assert_eq!(
            ClientConfig::default().endpoint("risk-data"),
            "http://127.0.0.1:8000/api/risk-data"
        );
    }

    #[test]
    fn bad_policy_is_a_parse_error() {
        assert!(matches!(
            ClientConfig::from_json(r#"{ "submit_policy": "queue" }"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = ClientConfig::from_file("/nonexistent/riskmap.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/riskmap.json"));
    }
}
