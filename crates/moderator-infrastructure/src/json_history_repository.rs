//! JSON file-based history source.
//!
//! Reads the replay log from a JSON array of
//! `{"username": ..., "message": ..., "timestamp": ...}` objects
//! (`timestamp` optional).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use moderator_core::error::{ModeratorError, Result};
use moderator_core::message::HistoricalMessage;
use moderator_core::replay::HistorySource;

#[derive(Debug, Clone)]
pub struct JsonHistoryRepository {
    path: PathBuf,
}

impl JsonHistoryRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl HistorySource for JsonHistoryRepository {
    async fn load(&self) -> Result<Vec<HistoricalMessage>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| ModeratorError::history_load(self.describe(), e.to_string()))?;

        let messages: Vec<HistoricalMessage> = serde_json::from_str(&content)
            .map_err(|e| ModeratorError::history_load(self.describe(), e.to_string()))?;

        tracing::info!(
            "[History] Loaded {} messages from {}",
            messages.len(),
            self.path.display()
        );
        Ok(messages)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
