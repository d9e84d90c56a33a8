//! Control commands accepted from observers.

use serde::{Deserialize, Serialize};

use crate::error::{ModeratorError, Result};

/// Username used for live messages that do not carry one.
pub const DEFAULT_LIVE_USERNAME: &str = "You";

fn default_live_username() -> String {
    DEFAULT_LIVE_USERNAME.to_string()
}

/// A command sent by a connected client.
///
/// Wire form: `{"command": "set_speed", "speed": 2.0}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ControlCommand {
    StartReplay,
    PauseReplay,
    ResetReplay,
    SetSpeed {
        speed: f64,
    },
    UserMessage {
        #[serde(default = "default_live_username")]
        username: String,
        #[serde(default)]
        message: String,
    },
}

impl ControlCommand {
    /// Parses a JSON command frame.
    ///
    /// Unknown commands and malformed payloads (e.g. a non-numeric speed)
    /// are rejected as `InvalidInput` rather than coerced.
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| ModeratorError::invalid_input("command", e.to_string()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            ControlCommand::StartReplay => "start_replay",
            ControlCommand::PauseReplay => "pause_replay",
            ControlCommand::ResetReplay => "reset_replay",
            ControlCommand::SetSpeed { .. } => "set_speed",
            ControlCommand::UserMessage { .. } => "user_message",
        }
    }
}
