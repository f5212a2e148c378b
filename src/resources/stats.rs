//! Aggregate level statistics.
//!
//! Counters are written by the lifecycle systems when a transition is
//! accepted; per-variant live counts and the win flag are refreshed each
//! tick by [`update_stats_system`](crate::systems::stats::update_stats_system).
//! Win evaluation only reads these numbers and never touches bubbles.
use bevy_ecs::prelude::Resource;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::components::lifecycle::PopCause;
use crate::resources::gamerules::WinCondition;

/// Seconds to wait before a win can be declared, so an empty world at
/// startup does not count as "few bubbles left".
pub const WIN_WARMUP_SECONDS: f32 = 0.5;

#[derive(Resource, Debug, Clone, Default, Serialize)]
pub struct LevelStats {
    pub bubbles_popped: u32,
    pub popped_by_click: u32,
    pub merges: u32,
    pub splits_spawned: u32,
    /// Clicks on any bubble, popping or not.
    pub clicks: u32,
    pub per_variant_live: FxHashMap<usize, usize>,
    pub live_total: usize,
    pub elapsed: f32,
    pub has_won: bool,
    pub final_time: Option<f32>,
    pub final_clicks: Option<u32>,
}

impl LevelStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_pop(&mut self, cause: PopCause) {
        self.bubbles_popped += 1;
        if cause == PopCause::Click {
            self.popped_by_click += 1;
        }
    }

    pub fn record_merge(&mut self) {
        self.merges += 1;
    }

    pub fn live_of(&self, variant: usize) -> usize {
        self.per_variant_live.get(&variant).copied().unwrap_or(0)
    }

    /// Whether the counters satisfy `condition` against `target`.
    pub fn meets(&self, condition: WinCondition, target: usize) -> bool {
        if self.elapsed < WIN_WARMUP_SECONDS {
            return false;
        }
        match condition {
            WinCondition::None => false,
            WinCondition::BubblesPopped => self.bubbles_popped as usize >= target,
            WinCondition::MinBubblesLeft => self.live_total >= target,
            WinCondition::MaxBubblesLeft => self.live_total <= target,
        }
    }

    /// Latch the win once; later calls change nothing.
    pub fn declare_win(&mut self) -> bool {
        if self.has_won {
            return false;
        }
        self.has_won = true;
        self.final_time = Some(self.elapsed);
        self.final_clicks = Some(self.popped_by_click);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_pop_counts_clicks_separately() {
        let mut stats = LevelStats::new();
        stats.record_pop(PopCause::Contact);
        stats.record_pop(PopCause::Click);
        assert_eq!(stats.bubbles_popped, 2);
        assert_eq!(stats.popped_by_click, 1);
    }

    #[test]
    fn test_meets_waits_for_warmup() {
        let mut stats = LevelStats::new();
        stats.live_total = 0;
        assert!(!stats.meets(WinCondition::MaxBubblesLeft, 3));
        stats.elapsed = 1.0;
        assert!(stats.meets(WinCondition::MaxBubblesLeft, 3));
        assert!(!stats.meets(WinCondition::None, 0));
    }

    #[test]
    fn test_meets_bubbles_popped() {
        let mut stats = LevelStats {
            elapsed: 2.0,
            ..Default::default()
        };
        for _ in 0..4 {
            stats.record_pop(PopCause::Chain);
        }
        assert!(!stats.meets(WinCondition::BubblesPopped, 5));
        stats.record_pop(PopCause::Growth);
        assert!(stats.meets(WinCondition::BubblesPopped, 5));
    }

    #[test]
    fn test_declare_win_latches() {
        let mut stats = LevelStats {
            elapsed: 3.0,
            clicks: 7,
            ..Default::default()
        };
        stats.record_pop(PopCause::Click);
        stats.record_pop(PopCause::Click);
        stats.record_pop(PopCause::Contact);
        assert!(stats.declare_win());
        stats.elapsed = 9.0;
        stats.record_pop(PopCause::Click);
        assert!(!stats.declare_win());
        assert_eq!(stats.final_time, Some(3.0));
        // Only clicks that popped something count toward the score.
        assert_eq!(stats.final_clicks, Some(2));
    }
}
