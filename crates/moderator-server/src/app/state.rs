use std::sync::Arc;

use moderator_application::ModerationEngine;
use moderator_core::config::ModeratorConfig;
use tokio_util::sync::CancellationToken;

/// State shared by every route handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: ModerationEngine,
    pub config: Arc<ModeratorConfig>,
    /// Cancelled once on Ctrl+C; open WebSocket connections close on it.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(engine: ModerationEngine, config: ModeratorConfig) -> Self {
        Self {
            engine,
            config: Arc::new(config),
            shutdown: CancellationToken::new(),
        }
    }
}
