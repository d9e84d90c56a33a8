//! Classifier client.
//!
//! Wraps a [`ScoringClient`] and turns every call into an
//! [`AnalysisResult`]: a scoring failure is logged and replaced by the
//! configured [`FailurePolicy`] substitute, never returned to the caller.

use std::sync::Arc;

use moderator_core::analysis::{AnalysisResult, FailurePolicy, ScoringClient};
use moderator_core::config::ClassifierConfig;
use moderator_core::error::ModeratorError;

/// Number of characters of the input shown in diagnostic logs.
const PREVIEW_CHARS: usize = 30;

#[derive(Clone)]
pub struct ClassifierClient {
    scorer: Arc<dyn ScoringClient>,
    safety_margin: f64,
    failure_policy: FailurePolicy,
}

impl ClassifierClient {
    pub fn new(scorer: Arc<dyn ScoringClient>, safety_margin: f64) -> Self {
        Self {
            scorer,
            safety_margin,
            failure_policy: FailurePolicy::default(),
        }
    }

    pub fn from_config(scorer: Arc<dyn ScoringClient>, config: &ClassifierConfig) -> Self {
        Self::new(scorer, config.safety_margin).with_failure_policy(config.failure_policy)
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    /// Scores `text`. Blocks the caller for the whole round trip.
    pub async fn classify(&self, text: &str) -> AnalysisResult {
        let preview = preview(text);

        let outcome = self
            .scorer
            .score(text, self.safety_margin)
            .await
            .and_then(checked);

        match outcome {
            Ok(analysis) => {
                tracing::info!(
                    "[Classifier] '{}...' -> max_value: {:.3}",
                    preview,
                    analysis.max_value
                );
                analysis
            }
            Err(err) => {
                tracing::warn!(
                    policy = %self.failure_policy,
                    "[Classifier] '{}...': {}",
                    preview,
                    err
                );
                AnalysisResult::failed(self.failure_policy, err.to_string())
            }
        }
    }
}

/// Rejects scores the bucketing cannot interpret and clamps into `[0, 1]`.
fn checked(mut analysis: AnalysisResult) -> Result<AnalysisResult, ModeratorError> {
    if !analysis.max_value.is_finite() {
        return Err(ModeratorError::classification(format!(
            "Non-finite max_value: {}",
            analysis.max_value
        )));
    }
    analysis.max_value = analysis.max_value.clamp(0.0, 1.0);
    Ok(analysis)
}

fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}
