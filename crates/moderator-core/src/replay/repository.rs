//! History source trait.
//!
//! Defines where the replayed chat log comes from.

use async_trait::async_trait;

use crate::error::Result;
use crate::message::HistoricalMessage;

/// A one-shot reader of persisted chat history.
///
/// The engine calls [`HistorySource::load`] at most once per process (on the
/// first successful `start`) and caches the result.
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Reads the whole ordered history.
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<HistoricalMessage>)`: History in replay order (may be empty)
    /// - `Err(ModeratorError::HistoryLoad)`: The source is missing or malformed
    async fn load(&self) -> Result<Vec<HistoricalMessage>>;

    /// Human-readable name of the source, used in logs.
    fn describe(&self) -> String;
}
