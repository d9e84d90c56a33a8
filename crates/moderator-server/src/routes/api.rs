use axum::Json;
use axum::extract::State;
use moderator_core::replay::ReplayStatus;
use moderator_core::stats::StatsSnapshot;
use serde::{Deserialize, Serialize};

use crate::app::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub replay: ReplayStatus,
    pub subscribers: usize,
    pub classifier_url: String,
}

/// Current aggregate statistics, same shape as the `stats_update` payload.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsSnapshot> {
    Json(state.engine.snapshot().await)
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        replay: state.engine.status().await,
        subscribers: state.engine.subscriber_count(),
        classifier_url: state.config.classifier.base_url.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{serve, test_state};
    use moderator_core::replay::ReplayPhase;

    #[tokio::test]
    async fn test_stats_endpoint_reflects_engine() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state = test_state(temp_dir.path());
        let engine = state.engine.clone();
        let base = serve(state).await;

        let stats: StatsSnapshot = reqwest::get(format!("{base}/api/stats"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(stats, StatsSnapshot::default());

        engine.submit_live_message("carol", "hello").await;

        let stats: StatsSnapshot = reqwest::get(format!("{base}/api/stats"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.flagged, 1);
    }

    #[tokio::test]
    async fn test_health_reports_replay_status() {
        let temp_dir = tempfile::tempdir().unwrap();
        let base = serve(test_state(temp_dir.path())).await;

        let health: HealthResponse = reqwest::get(format!("{base}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(health.status, "ok");
        assert_eq!(health.replay.phase, ReplayPhase::Stopped);
        assert_eq!(health.replay.total, 0);
        assert_eq!(health.replay.speed, 1.0);
        assert_eq!(health.subscribers, 0);
    }
}
