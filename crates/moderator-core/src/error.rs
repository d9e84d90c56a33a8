//! Error types for the stream moderator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the whole moderator workspace.
///
/// Each variant maps to one failure class of the engine: only
/// `HistoryLoad` is fatal to a command, `Classification` never leaves the
/// classifier client, and `InvalidInput` marks a caller contract violation.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModeratorError {
    /// The historical message sequence could not be loaded
    #[error("Failed to load chat history from {source_name}: {message}")]
    HistoryLoad {
        source_name: String,
        message: String,
    },

    /// A control command carried an invalid argument
    #[error("Invalid input for {field}: {message}")]
    InvalidInput {
        field: String,
        message: String,
    },

    /// The external scoring service failed (transport or protocol)
    #[error("Classification failed: {0}")]
    Classification(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ModeratorError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a HistoryLoad error
    pub fn history_load(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HistoryLoad {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Creates an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a Classification error
    pub fn classification(message: impl Into<String>) -> Self {
        Self::Classification(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a history load failure
    pub fn is_history_load(&self) -> bool {
        matches!(self, Self::HistoryLoad { .. })
    }

    /// Check if this is a caller contract violation
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }

    /// Check if this is a classification failure
    pub fn is_classification(&self) -> bool {
        matches!(self, Self::Classification(_))
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Check if a file could not be read
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Check if a file was read but did not decode
    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for ModeratorError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<toml::de::Error> for ModeratorError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, ModeratorError>`.
pub type Result<T> = std::result::Result<T, ModeratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_load_display_names_source() {
        let err = ModeratorError::history_load("data/chat_history.json", "file not found");
        assert!(err.is_history_load());
        assert_eq!(
            err.to_string(),
            "Failed to load chat history from data/chat_history.json: file not found"
        );
    }

    #[test]
    fn test_io_error_conversion_keeps_kind() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ModeratorError = io.into();
        match err {
            ModeratorError::Io { message } => assert!(message.contains("NotFound")),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_toml_error_conversion_names_format() {
        let toml_err = toml::from_str::<toml::Table>("[broken").unwrap_err();
        let err: ModeratorError = toml_err.into();
        assert!(err.is_serialization());
        assert!(err.to_string().starts_with("Serialization error: TOML - "));
    }

    #[test]
    fn test_invalid_input_predicate() {
        let err = ModeratorError::invalid_input("speed", "must be positive");
        assert!(err.is_invalid_input());
        assert!(!err.is_classification());
    }
}
