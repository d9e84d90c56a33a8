//! Events pushed to observers.

use serde::{Deserialize, Serialize};

use crate::message::MessageResult;
use crate::stats::StatsSnapshot;

/// An event delivered to subscribers.
///
/// Serialized as `{"event": "<name>", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum BroadcastEvent {
    /// A message went through moderation
    NewMessage(MessageResult),
    /// Current aggregate statistics
    StatsUpdate(StatsSnapshot),
    /// Replay began or resumed
    ReplayStarted { total_messages: usize },
    ReplayPaused {},
    ReplayReset {},
    /// The cursor reached the end of the history
    ReplayEnded {},
    SpeedChanged { speed: f64 },
    /// A command from this connection failed; never broadcast
    Error { command: String, message: String },
}

impl BroadcastEvent {
    pub fn name(&self) -> &'static str {
        match self {
            BroadcastEvent::NewMessage(_) => "new_message",
            BroadcastEvent::StatsUpdate(_) => "stats_update",
            BroadcastEvent::ReplayStarted { .. } => "replay_started",
            BroadcastEvent::ReplayPaused {} => "replay_paused",
            BroadcastEvent::ReplayReset {} => "replay_reset",
            BroadcastEvent::ReplayEnded {} => "replay_ended",
            BroadcastEvent::SpeedChanged { .. } => "speed_changed",
            BroadcastEvent::Error { .. } => "error",
        }
    }
}
