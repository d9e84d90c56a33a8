//! Running moderation statistics.

use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::message::ModerationAction;

/// Maximum number of entries kept in the score timeline.
pub const TIMELINE_CAPACITY: usize = 50;

/// One point of the score timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub time: String,
    pub score: f64,
}

/// Aggregate counters for one moderation session.
///
/// `total_messages` always equals `flagged_count + blocked_count` plus the
/// number of allowed messages, and the timeline never holds more than
/// [`TIMELINE_CAPACITY`] points (oldest evicted first).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateStats {
    total_messages: u64,
    flagged_count: u64,
    blocked_count: u64,
    allowed_count: u64,
    warned_users: BTreeSet<String>,
    timeline: VecDeque<TimelinePoint>,
}

impl AggregateStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one processed message.
    pub fn record(&mut self, username: &str, action: ModerationAction, time: String, score: f64) {
        self.total_messages += 1;
        match action {
            ModerationAction::Blocked => {
                self.blocked_count += 1;
                self.warned_users.insert(username.to_string());
            }
            ModerationAction::Flagged => self.flagged_count += 1,
            ModerationAction::Allowed => self.allowed_count += 1,
        }

        self.timeline.push_back(TimelinePoint { time, score });
        while self.timeline.len() > TIMELINE_CAPACITY {
            self.timeline.pop_front();
        }
    }

    /// Back to the zero state.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn total_messages(&self) -> u64 {
        self.total_messages
    }

    pub fn flagged_count(&self) -> u64 {
        self.flagged_count
    }

    pub fn blocked_count(&self) -> u64 {
        self.blocked_count
    }

    pub fn allowed_count(&self) -> u64 {
        self.allowed_count
    }

    pub fn warned_users(&self) -> &BTreeSet<String> {
        &self.warned_users
    }

    pub fn timeline(&self) -> &VecDeque<TimelinePoint> {
        &self.timeline
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total: self.total_messages,
            flagged: self.flagged_count,
            blocked: self.blocked_count,
            warned_users: self.warned_users.len(),
            timeline: self.timeline.iter().cloned().collect(),
        }
    }
}

/// Wire form of [`AggregateStats`], sent as the `stats_update` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total: u64,
    pub flagged: u64,
    pub blocked: u64,
    /// Number of distinct users with at least one blocked message.
    pub warned_users: usize,
    pub timeline: Vec<TimelinePoint>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_follow_actions() {
        let mut stats = AggregateStats::new();
        stats.record("alice", ModerationAction::Allowed, "00:00:00".into(), 0.1);
        stats.record("bob", ModerationAction::Blocked, "00:01:00".into(), 0.85);
        stats.record("bob", ModerationAction::Blocked, "00:02:00".into(), 0.9);
        stats.record("carol", ModerationAction::Flagged, "00:03:00".into(), 0.5);

        assert_eq!(stats.total_messages(), 4);
        assert_eq!(stats.blocked_count(), 2);
        assert_eq!(stats.flagged_count(), 1);
        assert_eq!(stats.allowed_count(), 1);
        assert_eq!(
            stats.total_messages(),
            stats.flagged_count() + stats.blocked_count() + stats.allowed_count()
        );
        assert_eq!(stats.warned_users().len(), 1);
        assert!(stats.warned_users().contains("bob"));
    }

    #[test]
    fn test_timeline_evicts_oldest_first() {
        let mut stats = AggregateStats::new();
        for i in 0..=TIMELINE_CAPACITY {
            stats.record("u", ModerationAction::Allowed, format!("t{i}"), 0.0);
        }

        assert_eq!(stats.timeline().len(), TIMELINE_CAPACITY);
        assert_eq!(stats.timeline().front().unwrap().time, "t1");
        assert_eq!(
            stats.timeline().back().unwrap().time,
            format!("t{TIMELINE_CAPACITY}")
        );
        assert!(stats.timeline().iter().all(|p| p.time != "t0"));
    }

    #[test]
    fn test_clear_returns_to_zero_state() {
        let mut stats = AggregateStats::new();
        stats.record("bob", ModerationAction::Blocked, "00:00:00".into(), 0.9);
        stats.clear();

        assert_eq!(stats, AggregateStats::default());
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn test_snapshot_wire_keys() {
        let mut stats = AggregateStats::new();
        stats.record("bob", ModerationAction::Blocked, "00:00:00".into(), 0.9);
        let json = serde_json::to_value(stats.snapshot()).unwrap();

        assert_eq!(json["total"], 1);
        assert_eq!(json["flagged"], 0);
        assert_eq!(json["blocked"], 1);
        assert_eq!(json["warned_users"], 1);
        assert_eq!(json["timeline"][0]["time"], "00:00:00");
    }
}
