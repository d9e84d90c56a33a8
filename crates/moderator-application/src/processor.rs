//! Message processor.
//!
//! Turns a chat message into a [`MessageResult`] and folds it into the
//! session's [`AggregateStats`].

use moderator_core::analysis::AnalysisResult;
use moderator_core::message::{MessageResult, SeverityLevel, round_score};
use moderator_core::stats::AggregateStats;
use moderator_interaction::ClassifierClient;

/// Combines classifier output with the severity policy.
///
/// Classification ([`MessageProcessor::analyze`]) and bookkeeping
/// ([`MessageProcessor::record`]) are separate steps so the engine can run
/// the network call outside its state lock and apply the result atomically.
#[derive(Clone)]
pub struct MessageProcessor {
    classifier: ClassifierClient,
}

impl MessageProcessor {
    pub fn new(classifier: ClassifierClient) -> Self {
        Self { classifier }
    }

    /// Classifies `message`. Never fails; see [`ClassifierClient::classify`].
    pub async fn analyze(&self, message: &str) -> AnalysisResult {
        self.classifier.classify(message).await
    }

    /// Derives severity and action from `analysis`, updates `stats`, and
    /// assembles the result. A missing `timestamp` becomes the current
    /// local time as `HH:MM:SS`.
    pub fn record(
        &self,
        stats: &mut AggregateStats,
        username: &str,
        message: &str,
        timestamp: Option<String>,
        is_historical: bool,
        analysis: AnalysisResult,
    ) -> MessageResult {
        let timestamp = timestamp.unwrap_or_else(current_time_label);
        let score = analysis.max_value;
        let severity_level = SeverityLevel::from_score(score);
        let action = severity_level.action();

        stats.record(username, action, timestamp.clone(), score);

        MessageResult {
            username: username.to_string(),
            message: message.to_string(),
            timestamp,
            severity_level,
            severity_score: round_score(score),
            action,
            is_historical,
            analysis,
        }
    }

    /// Classifies and records in one step, for callers that own `stats`
    /// exclusively.
    pub async fn process(
        &self,
        stats: &mut AggregateStats,
        username: &str,
        message: &str,
        timestamp: Option<String>,
        is_historical: bool,
    ) -> MessageResult {
        let analysis = self.analyze(message).await;
        self.record(stats, username, message, timestamp, is_historical, analysis)
    }
}

fn current_time_label() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}
