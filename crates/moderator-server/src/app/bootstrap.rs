use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use moderator_application::{EngineSettings, MessageProcessor, ModerationEngine};
use moderator_core::analysis::ScoringClient;
use moderator_core::config::ModeratorConfig;
use moderator_core::replay::HistorySource;
use moderator_infrastructure::{ConfigService, JsonHistoryRepository};
use moderator_interaction::{ClassifierClient, GradioScoringClient};

use crate::app::AppState;

/// Command-line values that take precedence over `config.toml`.
#[derive(Debug, Clone, Default)]
pub struct StartupOverrides {
    pub config_path: Option<PathBuf>,
    pub bind: Option<String>,
    pub history_path: Option<PathBuf>,
}

impl StartupOverrides {
    fn apply(&self, config: &mut ModeratorConfig) {
        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
        }
        if let Some(history_path) = &self.history_path {
            config.replay.history_path = history_path.clone();
        }
    }
}

pub struct AppBootstrap {
    pub app_state: AppState,
    pub bind: String,
}

pub fn bootstrap(overrides: &StartupOverrides) -> Result<AppBootstrap> {
    let config_service = match &overrides.config_path {
        Some(path) => ConfigService::new(path),
        None => ConfigService::from_default_location()
            .map_err(|e| anyhow!("Failed to locate config directory: {}", e))?,
    };
    let mut config = config_service.get_config().map_err(|e| {
        anyhow!(
            "Failed to load configuration from {}: {}",
            config_service.path().display(),
            e
        )
    })?;
    overrides.apply(&mut config);

    tracing::info!(
        "[Bootstrap] Config: {}, history: {}, classifier: {} ({:?} on failure)",
        config_service.path().display(),
        config.replay.history_path.display(),
        config.classifier.base_url,
        config.classifier.failure_policy
    );

    let scorer: Arc<dyn ScoringClient> = Arc::new(
        GradioScoringClient::from_config(&config.classifier)
            .map_err(|e| anyhow!("Failed to initialize classifier client: {}", e))?,
    );

    let bind = config.server.bind.clone();
    let app_state = build_state(config, scorer)?;

    Ok(AppBootstrap { app_state, bind })
}

/// Composition root: wires the engine from `config` around `scorer`.
pub fn build_state(config: ModeratorConfig, scorer: Arc<dyn ScoringClient>) -> Result<AppState> {
    let classifier = ClassifierClient::from_config(scorer, &config.classifier);
    let processor = MessageProcessor::new(classifier);
    let history: Arc<dyn HistorySource> =
        Arc::new(JsonHistoryRepository::new(&config.replay.history_path));

    let engine = ModerationEngine::new(processor, history, EngineSettings::from(&config.replay))
        .map_err(|e| anyhow!("Failed to initialize moderation engine: {}", e))?;

    Ok(AppState::new(engine, config))
}
