//! Replay pacing task.
//!
//! One task per replay generation walks the history, classifies each entry
//! and waits `base_delay / speed` between emissions. It exits when the
//! replay is paused, reset, finished, or the engine shuts down.

use std::time::Duration;

use moderator_core::analysis::AnalysisResult;
use moderator_core::event::BroadcastEvent;
use moderator_core::message::HistoricalMessage;
use tokio::time::Instant;
use tracing::{debug, info};

use super::ModerationEngine;

/// Upper bound on a single pacing delay, reached only at extreme low speeds.
const MAX_PACING_DELAY: Duration = Duration::from_secs(24 * 60 * 60);

impl ModerationEngine {
    pub(super) async fn run_pacing(self, generation: u64) {
        debug!("[Replay] Pacing task started (generation {})", generation);

        loop {
            let Some((index, entry)) = self.next_entry(generation).await else {
                break;
            };

            let analysis = tokio::select! {
                analysis = self.inner.processor.analyze(&entry.message) => analysis,
                _ = self.inner.shutdown.cancelled() => break,
            };

            let Some(emitted_at) = self.emit(generation, index, &entry, analysis).await else {
                break;
            };

            if !self.wait_for_slot(generation, emitted_at).await {
                break;
            }
        }

        debug!("[Replay] Pacing task finished (generation {})", generation);
    }

    /// Picks the entry under the cursor, or settles the session and returns
    /// `None` if the task should stop.
    async fn next_entry(&self, generation: u64) -> Option<(usize, HistoricalMessage)> {
        let mut state = self.inner.state.lock().await;
        if !state.replay.is_current(generation) {
            return None;
        }
        if !state.replay.is_playing() {
            state.replay.pacing_exited();
            return None;
        }

        let cursor = state.replay.cursor();
        let entry = state
            .history
            .as_ref()
            .and_then(|history| history.get(cursor).cloned());

        match entry {
            Some(entry) => Some((cursor, entry)),
            None => {
                state.replay.finish();
                info!("[Replay] Reached end of history at message {}", cursor);
                self.inner.gateway.publish(BroadcastEvent::ReplayEnded {});
                None
            }
        }
    }

    /// Applies a finished classification. Discarded if a reset happened
    /// while it was in flight.
    async fn emit(
        &self,
        generation: u64,
        index: usize,
        entry: &HistoricalMessage,
        analysis: AnalysisResult,
    ) -> Option<Instant> {
        let mut state = self.inner.state.lock().await;
        if !state.replay.is_current(generation) {
            debug!(
                "[Replay] Discarding result for message {} after reset",
                index
            );
            return None;
        }

        let state = &mut *state;
        let result = self.inner.processor.record(
            &mut state.stats,
            &entry.username,
            &entry.message,
            Some(entry.timestamp_or_position(index)),
            true,
            analysis,
        );
        self.publish_result(&state.stats, result);
        state.replay.advance();

        Some(Instant::now())
    }

    /// Sleeps until the next emission slot. The deadline is recomputed after
    /// every wake-up, so a speed change applies to the pending delay.
    ///
    /// Returns `false` on shutdown.
    async fn wait_for_slot(&self, generation: u64, emitted_at: Instant) -> bool {
        loop {
            let notified = self.inner.wake.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let deadline = {
                let state = self.inner.state.lock().await;
                if !state.replay.is_current(generation) || !state.replay.is_playing() {
                    return true;
                }
                emitted_at + pacing_delay(self.inner.base_delay, state.replay.speed())
            };

            if Instant::now() >= deadline {
                return true;
            }

            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => return true,
                _ = &mut notified => {}
                _ = self.inner.shutdown.cancelled() => return false,
            }
        }
    }
}

fn pacing_delay(base_delay: Duration, speed: f64) -> Duration {
    Duration::try_from_secs_f64(base_delay.as_secs_f64() / speed)
        .map_or(MAX_PACING_DELAY, |delay| delay.min(MAX_PACING_DELAY))
}
