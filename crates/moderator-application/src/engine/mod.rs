//! Moderation engine.
//!
//! Owns the replay session, the aggregate statistics and the subscriber
//! registry, and exposes the control surface used by the transport layer.
//!
//! All mutable state lives behind one async mutex. Classification runs
//! outside of it; applying a result, snapshotting the statistics and
//! publishing `new_message` + `stats_update` happen in a single critical
//! section, so every observer sees a snapshot consistent with the messages
//! it has already received.

mod pacing;

use std::sync::Arc;
use std::time::Duration;

use moderator_core::command::ControlCommand;
use moderator_core::config::ReplayConfig;
use moderator_core::error::Result;
use moderator_core::event::BroadcastEvent;
use moderator_core::message::{HistoricalMessage, MessageResult};
use moderator_core::replay::{HistorySource, ReplaySession, ReplayStatus, StartOutcome, validate_speed};
use moderator_core::stats::{AggregateStats, StatsSnapshot};
use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::broadcast::{BroadcastGateway, SubscriberId, Subscription};
use crate::processor::MessageProcessor;

/// Tunables taken from `[replay]` in the configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Gap between two replayed messages at speed 1.0.
    pub base_delay: Duration,
    pub initial_speed: f64,
    pub subscriber_queue: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&ReplayConfig::default())
    }
}

impl From<&ReplayConfig> for EngineSettings {
    fn from(config: &ReplayConfig) -> Self {
        Self {
            base_delay: config.base_delay(),
            initial_speed: config.initial_speed,
            subscriber_queue: config.subscriber_queue,
        }
    }
}

struct SessionState {
    replay: ReplaySession,
    stats: AggregateStats,
    /// Loaded on the first successful start, then kept for the process lifetime.
    history: Option<Arc<Vec<HistoricalMessage>>>,
}

impl SessionState {
    fn history_len(&self) -> usize {
        self.history.as_ref().map_or(0, |h| h.len())
    }
}

struct EngineInner {
    state: Mutex<SessionState>,
    processor: MessageProcessor,
    gateway: BroadcastGateway,
    history_source: Arc<dyn HistorySource>,
    base_delay: Duration,
    /// Wakes the pacing task after pause, reset or a speed change.
    wake: Notify,
    shutdown: CancellationToken,
}

/// Handle to the moderation engine. Cheap to clone.
#[derive(Clone)]
pub struct ModerationEngine {
    inner: Arc<EngineInner>,
}

impl ModerationEngine {
    /// # Errors
    ///
    /// Returns `InvalidInput` if `settings.initial_speed` is not a positive
    /// finite number.
    pub fn new(
        processor: MessageProcessor,
        history_source: Arc<dyn HistorySource>,
        settings: EngineSettings,
    ) -> Result<Self> {
        let replay = ReplaySession::new(settings.initial_speed)?;

        Ok(Self {
            inner: Arc::new(EngineInner {
                state: Mutex::new(SessionState {
                    replay,
                    stats: AggregateStats::new(),
                    history: None,
                }),
                processor,
                gateway: BroadcastGateway::new(settings.subscriber_queue),
                history_source,
                base_delay: settings.base_delay,
                wake: Notify::new(),
                shutdown: CancellationToken::new(),
            }),
        })
    }

    /// Registers a new observer. Its first event is a `stats_update` with
    /// the current totals.
    pub async fn connect(&self) -> Subscription {
        let state = self.inner.state.lock().await;
        let subscription = self.inner.gateway.subscribe();
        self.inner.gateway.send_to(
            subscription.id(),
            BroadcastEvent::StatsUpdate(state.stats.snapshot()),
        );
        drop(state);

        info!(
            "[Broadcast] Client connected: {} ({} connected)",
            subscription.id(),
            self.inner.gateway.subscriber_count()
        );
        subscription
    }

    pub fn disconnect(&self, id: SubscriberId) {
        if self.inner.gateway.unsubscribe(id) {
            info!("[Broadcast] Client disconnected: {}", id);
        }
    }

    /// Starts or resumes the replay. No-op while already playing.
    ///
    /// The history is loaded on the first start only.
    ///
    /// # Errors
    ///
    /// Returns `HistoryLoad` if the history cannot be read; the replay then
    /// stays stopped and a later start retries the load.
    pub async fn start_replay(&self) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        if state.replay.is_playing() {
            debug!("[Replay] Start ignored, already playing");
            return Ok(());
        }

        if state.history.is_none() {
            let history = self.inner.history_source.load().await.map_err(|e| {
                warn!("[Replay] Failed to load history: {}", e);
                e
            })?;
            info!(
                "[Replay] Loaded {} messages from {}",
                history.len(),
                self.inner.history_source.describe()
            );
            state.history = Some(Arc::new(history));
        }

        let total_messages = state.history_len();
        match state.replay.start() {
            StartOutcome::AlreadyPlaying => return Ok(()),
            StartOutcome::Resumed => {
                info!("[Replay] Resumed at message {}", state.replay.cursor());
            }
            StartOutcome::SpawnPacing { generation } => {
                info!(
                    "[Replay] Starting at message {} of {}",
                    state.replay.cursor(),
                    total_messages
                );
                tokio::spawn(self.clone().run_pacing(generation));
            }
        }

        self.inner
            .gateway
            .publish(BroadcastEvent::ReplayStarted { total_messages });
        Ok(())
    }

    /// Stops emitting after the message in flight, if any. The cursor is kept.
    pub async fn pause_replay(&self) {
        let mut state = self.inner.state.lock().await;
        state.replay.pause();
        info!("[Replay] Paused at message {}", state.replay.cursor());
        self.inner.gateway.publish(BroadcastEvent::ReplayPaused {});
        self.inner.wake.notify_waiters();
    }

    /// Stops the replay, rewinds to the first message and clears statistics.
    ///
    /// A classification still in flight is discarded.
    pub async fn reset_replay(&self) {
        let mut state = self.inner.state.lock().await;
        state.replay.reset();
        state.stats.clear();
        info!("[Replay] Reset");
        self.inner.gateway.publish(BroadcastEvent::ReplayReset {});
        self.inner
            .gateway
            .publish(BroadcastEvent::StatsUpdate(state.stats.snapshot()));
        self.inner.wake.notify_waiters();
    }

    /// Changes the pacing multiplier. Takes effect for the pending delay.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` unless `speed` is a positive finite number;
    /// the current speed is then left unchanged.
    pub async fn set_speed(&self, speed: f64) -> Result<()> {
        let speed = validate_speed(speed)?;
        let mut state = self.inner.state.lock().await;
        state.replay.set_speed(speed)?;
        info!("[Replay] Speed set to {}x", speed);
        self.inner
            .gateway
            .publish(BroadcastEvent::SpeedChanged { speed });
        self.inner.wake.notify_waiters();
        Ok(())
    }

    /// Moderates a message typed by a live user.
    ///
    /// Empty or whitespace-only messages are ignored and yield `None`.
    pub async fn submit_live_message(&self, username: &str, message: &str) -> Option<MessageResult> {
        if message.trim().is_empty() {
            debug!("[Replay] Ignoring empty live message from {}", username);
            return None;
        }

        let analysis = self.inner.processor.analyze(message).await;

        let mut state = self.inner.state.lock().await;
        let result = self.inner.processor.record(
            &mut state.stats,
            username,
            message,
            None,
            false,
            analysis,
        );
        self.publish_result(&state.stats, result.clone());
        Some(result)
    }

    /// Applies a command received from `subscriber`. A failure is reported
    /// to that subscriber only, as an `error` event, and also returned.
    pub async fn handle(&self, subscriber: SubscriberId, command: ControlCommand) -> Result<()> {
        let name = command.name();
        let outcome = match command {
            ControlCommand::StartReplay => self.start_replay().await,
            ControlCommand::PauseReplay => {
                self.pause_replay().await;
                Ok(())
            }
            ControlCommand::ResetReplay => {
                self.reset_replay().await;
                Ok(())
            }
            ControlCommand::SetSpeed { speed } => self.set_speed(speed).await,
            ControlCommand::UserMessage { username, message } => {
                self.submit_live_message(&username, &message).await;
                Ok(())
            }
        };

        if let Err(e) = &outcome {
            self.report_error(subscriber, name, e.to_string());
        }
        outcome
    }

    /// Sends an `error` event to `subscriber` alone.
    pub fn report_error(&self, subscriber: SubscriberId, command: &str, message: String) {
        warn!("[Replay] Command {} from {} failed: {}", command, subscriber, message);
        self.inner.gateway.send_to(
            subscriber,
            BroadcastEvent::Error {
                command: command.to_string(),
                message,
            },
        );
    }

    pub async fn snapshot(&self) -> StatsSnapshot {
        self.inner.state.lock().await.stats.snapshot()
    }

    pub async fn status(&self) -> ReplayStatus {
        let state = self.inner.state.lock().await;
        state.replay.status(state.history_len())
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.gateway.subscriber_count()
    }

    /// Stops the pacing task. Subscribers are left registered.
    pub fn shutdown(&self) {
        info!("[Replay] Shutting down");
        self.inner.shutdown.cancel();
    }

    /// Publishes `new_message` followed by the snapshot that includes it.
    /// Callers hold the state lock.
    fn publish_result(&self, stats: &AggregateStats, result: MessageResult) {
        self.inner
            .gateway
            .publish(BroadcastEvent::NewMessage(result));
        self.inner
            .gateway
            .publish(BroadcastEvent::StatsUpdate(stats.snapshot()));
    }
}
