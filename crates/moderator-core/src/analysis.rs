//! Classifier output and the scoring-service seam.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::Result;

/// Output of one classification call.
///
/// `max_value` is the highest score across all categories and is what the
/// severity bucketing uses. `error` is set when the scoring service failed
/// and the value was substituted according to the [`FailurePolicy`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub max_value: f64,
    #[serde(default)]
    pub categories: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResult {
    pub fn new(max_value: f64, categories: BTreeMap<String, f64>) -> Self {
        Self {
            max_value,
            categories,
            error: None,
        }
    }

    /// Substitute result for a failed classification.
    pub fn failed(policy: FailurePolicy, error: impl Into<String>) -> Self {
        Self {
            max_value: policy.fallback_score(),
            categories: BTreeMap::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// What a failed classification degrades to.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FailurePolicy {
    /// Treat the message as safe (score 0, allowed).
    #[default]
    Open,
    /// Treat the message as unsafe (score 1, blocked).
    Closed,
}

impl FailurePolicy {
    pub fn fallback_score(self) -> f64 {
        match self {
            FailurePolicy::Open => 0.0,
            FailurePolicy::Closed => 1.0,
        }
    }
}

/// The external text-scoring oracle.
///
/// Implementations perform the network round trip and report transport or
/// protocol failures as errors; the classifier client decides what a
/// failure degrades to.
#[async_trait]
pub trait ScoringClient: Send + Sync {
    /// Scores `text`. `safety_margin` is passed through to the service.
    async fn score(&self, text: &str, safety_margin: f64) -> Result<AnalysisResult>;
}
