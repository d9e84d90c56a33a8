//! Fixtures shared by the route tests.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use moderator_core::analysis::{AnalysisResult, ScoringClient};
use moderator_core::config::ModeratorConfig;
use moderator_core::error::Result;

use crate::app::{AppState, bootstrap::build_state};
use crate::routes;

/// Scores every message 0.5 (medium, flagged).
pub struct FixedScorer;

#[async_trait]
impl ScoringClient for FixedScorer {
    async fn score(&self, _text: &str, _safety_margin: f64) -> Result<AnalysisResult> {
        Ok(AnalysisResult::new(0.5, BTreeMap::new()))
    }
}

/// Engine over a two-message history written into `dir`.
pub fn test_state(dir: &Path) -> AppState {
    let history_path = dir.join("chat_history.json");
    std::fs::write(
        &history_path,
        r#"[
            {"username": "alice", "message": "you are great", "timestamp": "18:00:01"},
            {"username": "bob", "message": "I will destroy you", "timestamp": "18:00:04"}
        ]"#,
    )
    .unwrap();

    let mut config = ModeratorConfig::default();
    config.replay.history_path = history_path;
    config.replay.base_delay_ms = 10;

    build_state(config, Arc::new(FixedScorer)).unwrap()
}

/// Serves the router on an ephemeral port and returns its base URL.
pub async fn serve(state: AppState) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, routes::router(state)).await.unwrap();
    });
    format!("http://{addr}")
}
