//! Message domain model.

use serde::{Deserialize, Serialize};

use super::severity::{ModerationAction, SeverityLevel};
use crate::analysis::AnalysisResult;

/// One entry of the replayed chat log.
///
/// The sequence position is implicit: it is the entry's index in the
/// loaded history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalMessage {
    pub username: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl HistoricalMessage {
    pub fn new(username: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            message: message.into(),
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Timestamp label used during replay: the recorded one, or a
    /// synthetic `00:{index}:00` derived from the sequence position.
    pub fn timestamp_or_position(&self, index: usize) -> String {
        self.timestamp
            .clone()
            .unwrap_or_else(|| format!("00:{index:02}:00"))
    }
}

/// The outcome of moderating a single message.
///
/// Created once per processed message and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResult {
    pub username: String,
    pub message: String,
    pub timestamp: String,
    pub severity_level: SeverityLevel,
    /// Classifier score rounded to 3 decimals.
    pub severity_score: f64,
    pub action: ModerationAction,
    pub is_historical: bool,
    pub analysis: AnalysisResult,
}

/// Rounds a score to 3 decimal places for display.
pub fn round_score(score: f64) -> f64 {
    (score * 1000.0).round() / 1000.0
}
