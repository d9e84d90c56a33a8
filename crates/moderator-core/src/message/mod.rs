//! Chat messages and their moderation outcome.

pub mod model;
pub mod severity;

pub use model::{HistoricalMessage, MessageResult, round_score};
pub use severity::{HIGH_THRESHOLD, MEDIUM_THRESHOLD, ModerationAction, SeverityLevel};
