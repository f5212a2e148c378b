//! Level statistics refresh and win evaluation.
use bevy_ecs::prelude::*;
use log::info;

use crate::resources::gamerules::GameRules;
use crate::resources::registry::BubbleRegistry;
use crate::resources::stats::LevelStats;
use crate::resources::worldtime::WorldTime;

/// Copy live counts out of the registry and latch the win once it is met.
pub fn update_stats_system(
    time: Res<WorldTime>,
    rules: Res<GameRules>,
    registry: Res<BubbleRegistry>,
    mut stats: ResMut<LevelStats>,
) {
    // The level clock stops at the win.
    if !stats.has_won {
        stats.elapsed = time.elapsed;
    }
    stats.per_variant_live = registry.live_counts_by_variant();
    stats.live_total = registry.count();

    if !stats.has_won
        && stats.meets(rules.win_condition, rules.target_bubble_count)
        && stats.declare_win()
    {
        info!(
            "Level won ({:?}) after {:.2}s, {} popped, {} by click",
            rules.win_condition, stats.elapsed, stats.bubbles_popped, stats.popped_by_click
        );
    }
}
