//! Replay of historical chat.

pub mod repository;
pub mod state;

pub use repository::HistorySource;
pub use state::{ReplayPhase, ReplaySession, ReplayStatus, StartOutcome, validate_speed};
