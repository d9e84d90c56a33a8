//! Configuration model.
//!
//! Loaded from `config.toml` by the infrastructure layer; every field has a
//! default so a partial (or missing) file is valid.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::analysis::FailurePolicy;
use crate::error::{ModeratorError, Result};

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ModeratorConfig {
    pub server: ServerConfig,
    pub replay: ReplayConfig,
    pub classifier: ClassifierConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ReplayConfig {
    /// JSON array of `{username, message, timestamp?}`
    pub history_path: PathBuf,
    /// Delay between two replayed messages at speed 1.0
    pub base_delay_ms: u64,
    pub initial_speed: f64,
    /// Capacity of each subscriber's outbound queue
    pub subscriber_queue: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            history_path: PathBuf::from("data/chat_history.json"),
            base_delay_ms: 1500,
            initial_speed: 1.0,
            subscriber_queue: 256,
        }
    }
}

impl ReplayConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ClassifierConfig {
    pub base_url: String,
    pub api_name: String,
    pub safety_margin: f64,
    /// No client-side timeout when absent.
    pub timeout_secs: Option<u64>,
    /// Bearer token for the hosted service; falls back to `HF_TOKEN`.
    pub api_token: Option<String>,
    pub failure_policy: FailurePolicy,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            base_url: "https://duchaba-friendly-text-moderation.hf.space".to_string(),
            api_name: "fetch_toxicity_level".to_string(),
            safety_margin: 0.02,
            timeout_secs: None,
            api_token: None,
            failure_policy: FailurePolicy::Open,
        }
    }
}

impl ModeratorConfig {
    /// Checks the numeric invariants the engine relies on.
    pub fn validate(&self) -> Result<()> {
        if self.replay.base_delay_ms == 0 {
            return Err(ModeratorError::config("replay.base_delay_ms must be > 0"));
        }
        if !(self.replay.initial_speed.is_finite() && self.replay.initial_speed > 0.0) {
            return Err(ModeratorError::config(
                "replay.initial_speed must be a positive number",
            ));
        }
        if self.replay.subscriber_queue == 0 {
            return Err(ModeratorError::config("replay.subscriber_queue must be > 0"));
        }
        if !(self.classifier.safety_margin.is_finite() && self.classifier.safety_margin >= 0.0) {
            return Err(ModeratorError::config(
                "classifier.safety_margin must be a non-negative number",
            ));
        }
        if self.classifier.base_url.trim().is_empty() {
            return Err(ModeratorError::config("classifier.base_url is empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ModeratorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.replay.base_delay(), Duration::from_millis(1500));
        assert_eq!(config.classifier.safety_margin, 0.02);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: ModeratorConfig = toml::from_str(
            r#"
            [replay]
            initial_speed = 2.0

            [classifier]
            failure_policy = "closed"
            timeout_secs = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.replay.initial_speed, 2.0);
        assert_eq!(config.replay.base_delay_ms, 1500);
        assert_eq!(config.classifier.failure_policy, FailurePolicy::Closed);
        assert_eq!(config.classifier.timeout_secs, Some(10));
        assert_eq!(config.server.bind, "127.0.0.1:5000");
    }

    #[test]
    fn test_validate_rejects_bad_numbers() {
        let mut config = ModeratorConfig::default();
        config.replay.initial_speed = 0.0;
        assert!(config.validate().unwrap_err().is_config());

        let mut config = ModeratorConfig::default();
        config.replay.base_delay_ms = 0;
        assert!(config.validate().is_err());

        let mut config = ModeratorConfig::default();
        config.classifier.safety_margin = f64::NAN;
        assert!(config.validate().is_err());
    }
}
