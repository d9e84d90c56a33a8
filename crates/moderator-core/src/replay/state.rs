//! Replay session state machine.
//!
//! Pure bookkeeping: the engine owns one `ReplaySession` behind its state
//! lock and drives the pacing task from the outcomes returned here.

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::error::{ModeratorError, Result};

/// Lifecycle phase of the replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReplayPhase {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// What a `start` request resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// Already playing; nothing changed.
    AlreadyPlaying,
    /// Playing again, and the pacing task of this generation is still alive.
    Resumed,
    /// Playing, and a new pacing task must be spawned for `generation`.
    SpawnPacing { generation: u64 },
}

/// Cursor, phase and pacing speed of the replay.
///
/// `generation` changes on every reset; a pacing task compares the
/// generation it was spawned for with the current one before touching
/// state, so a reset orphans any task still running.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaySession {
    phase: ReplayPhase,
    speed: f64,
    cursor: usize,
    generation: u64,
    pacing_active: bool,
}

impl ReplaySession {
    /// Creates a stopped session at position 0.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `speed` is not a positive finite number.
    pub fn new(speed: f64) -> Result<Self> {
        Ok(Self {
            phase: ReplayPhase::Stopped,
            speed: validate_speed(speed)?,
            cursor: 0,
            generation: 0,
            pacing_active: false,
        })
    }

    pub fn phase(&self) -> ReplayPhase {
        self.phase
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_playing(&self) -> bool {
        self.phase == ReplayPhase::Playing
    }

    /// Whether a pacing task spawned for `generation` may still act.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    pub fn start(&mut self) -> StartOutcome {
        if self.phase == ReplayPhase::Playing {
            return StartOutcome::AlreadyPlaying;
        }

        self.phase = ReplayPhase::Playing;
        if self.pacing_active {
            StartOutcome::Resumed
        } else {
            self.pacing_active = true;
            StartOutcome::SpawnPacing {
                generation: self.generation,
            }
        }
    }

    /// Idempotent. Pausing a stopped replay leaves it stopped.
    pub fn pause(&mut self) {
        if self.phase == ReplayPhase::Playing {
            self.phase = ReplayPhase::Paused;
        }
    }

    /// Back to position 0, stopped, under a new generation.
    pub fn reset(&mut self) {
        self.phase = ReplayPhase::Stopped;
        self.cursor = 0;
        self.generation += 1;
        self.pacing_active = false;
    }

    pub fn set_speed(&mut self, speed: f64) -> Result<()> {
        self.speed = validate_speed(speed)?;
        Ok(())
    }

    /// Moves past the message just emitted.
    pub fn advance(&mut self) {
        self.cursor += 1;
    }

    /// The cursor reached the end of the history.
    pub fn finish(&mut self) {
        self.phase = ReplayPhase::Stopped;
        self.pacing_active = false;
    }

    /// The pacing task observed a non-playing phase and exited.
    pub fn pacing_exited(&mut self) {
        self.pacing_active = false;
    }

    pub fn status(&self, total: usize) -> ReplayStatus {
        ReplayStatus {
            phase: self.phase,
            cursor: self.cursor,
            total,
            speed: self.speed,
        }
    }
}

/// Diagnostic view of the replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayStatus {
    pub phase: ReplayPhase,
    pub cursor: usize,
    /// Length of the loaded history, 0 before the first start.
    pub total: usize,
    pub speed: f64,
}

/// Checks a speed multiplier: it must be finite and strictly positive.
pub fn validate_speed(speed: f64) -> Result<f64> {
    if speed.is_finite() && speed > 0.0 {
        Ok(speed)
    } else {
        Err(ModeratorError::invalid_input(
            "speed",
            format!("expected a positive number, got {speed}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_spawns_once() {
        let mut session = ReplaySession::new(1.0).unwrap();
        assert_eq!(
            session.start(),
            StartOutcome::SpawnPacing { generation: 0 }
        );
        assert_eq!(session.start(), StartOutcome::AlreadyPlaying);
        assert!(session.is_playing());
    }

    #[test]
    fn test_pause_then_start_reuses_live_task() {
        let mut session = ReplaySession::new(1.0).unwrap();
        session.start();
        session.advance();
        session.pause();
        assert_eq!(session.phase(), ReplayPhase::Paused);

        // The task has not observed the pause yet.
        assert_eq!(session.start(), StartOutcome::Resumed);
        assert_eq!(session.cursor(), 1);
    }

    #[test]
    fn test_pause_then_start_after_task_exit_spawns() {
        let mut session = ReplaySession::new(1.0).unwrap();
        session.start();
        session.advance();
        session.pause();
        session.pacing_exited();

        assert_eq!(
            session.start(),
            StartOutcome::SpawnPacing { generation: 0 }
        );
        assert_eq!(session.cursor(), 1);
    }

    #[test]
    fn test_pause_is_idempotent_and_ignores_stopped() {
        let mut session = ReplaySession::new(1.0).unwrap();
        session.pause();
        assert_eq!(session.phase(), ReplayPhase::Stopped);

        session.start();
        session.pause();
        session.pause();
        assert_eq!(session.phase(), ReplayPhase::Paused);
    }

    #[test]
    fn test_reset_rewinds_and_orphans_task() {
        let mut session = ReplaySession::new(1.0).unwrap();
        session.start();
        session.advance();
        session.advance();
        session.reset();

        assert_eq!(session.phase(), ReplayPhase::Stopped);
        assert_eq!(session.cursor(), 0);
        assert!(!session.is_current(0));
        assert_eq!(
            session.start(),
            StartOutcome::SpawnPacing { generation: 1 }
        );
    }

    #[test]
    fn test_speed_validation() {
        let mut session = ReplaySession::new(1.0).unwrap();
        assert!(session.set_speed(2.5).is_ok());
        assert_eq!(session.speed(), 2.5);

        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = session.set_speed(bad).unwrap_err();
            assert!(err.is_invalid_input(), "speed {bad}");
        }
        assert_eq!(session.speed(), 2.5);
        assert!(ReplaySession::new(0.0).is_err());
    }

    #[test]
    fn test_finish_stops_playing() {
        let mut session = ReplaySession::new(1.0).unwrap();
        session.start();
        session.finish();
        assert_eq!(session.phase(), ReplayPhase::Stopped);
        assert_eq!(
            session.start(),
            StartOutcome::SpawnPacing { generation: 0 }
        );
    }
}
