//! Severity buckets and the moderation action attached to each.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Scores strictly above this value are `High`.
pub const HIGH_THRESHOLD: f64 = 0.7;
/// Scores strictly above this value (and not above `HIGH_THRESHOLD`) are `Medium`.
pub const MEDIUM_THRESHOLD: f64 = 0.4;

/// Discrete severity bucket derived from a continuous classifier score.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SeverityLevel {
    Low,
    Medium,
    High,
}

impl SeverityLevel {
    /// Buckets a score. The boundaries are exclusive, so exactly `0.4`
    /// is `Low` and exactly `0.7` is `Medium`.
    pub fn from_score(score: f64) -> Self {
        if score > HIGH_THRESHOLD {
            SeverityLevel::High
        } else if score > MEDIUM_THRESHOLD {
            SeverityLevel::Medium
        } else {
            SeverityLevel::Low
        }
    }

    /// The moderation decision for this bucket.
    pub fn action(self) -> ModerationAction {
        match self {
            SeverityLevel::High => ModerationAction::Blocked,
            SeverityLevel::Medium => ModerationAction::Flagged,
            SeverityLevel::Low => ModerationAction::Allowed,
        }
    }
}

/// The moderation decision recorded for a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ModerationAction {
    Allowed,
    Flagged,
    Blocked,
}
