//! Bubble growth and size-triggered pops.
//!
//! Each tick an active bubble gains
//!
//! ```text
//! Δvolume = click_growth·clicked + hold_growth_rate·Δt·held
//!         + hover_growth_rate·Δt·hovered + passive_growth_rate·Δt
//! ```
//!
//! never dropping below the area of a `min_bubble_size` disc. A bubble whose
//! new size crosses `pop_at_size` or `pop_below_size` gets a pop request.
use bevy_ecs::prelude::*;

use crate::components::bubble::Bubble;
use crate::components::lifecycle::{Lifecycle, PopCause};
use crate::components::pointer::PointerState;
use crate::events::lifecycle::LifecycleRequest;
use crate::resources::gamerules::GameRules;
use crate::resources::variants::{VariantRule, VariantRuleSet};
use crate::resources::worldtime::WorldTime;

/// Volume added this tick for the given pointer flags.
pub fn growth_delta(rule: &VariantRule, pointer: &PointerState, dt: f32) -> f32 {
    let mut delta = rule.passive_growth_rate * dt;
    if pointer.clicked {
        delta += rule.click_growth;
    }
    if pointer.held {
        delta += rule.hold_growth_rate * dt;
    }
    if pointer.hovered {
        delta += rule.hover_growth_rate * dt;
    }
    delta
}

pub fn growth_system(
    time: Res<WorldTime>,
    rules: Res<GameRules>,
    variants: Res<VariantRuleSet>,
    mut bubbles: Query<(Entity, &mut Bubble, &Lifecycle, Option<&mut PointerState>)>,
    mut requests: MessageWriter<LifecycleRequest>,
) {
    for (entity, mut bubble, lifecycle, pointer) in bubbles.iter_mut() {
        let flags = match pointer {
            Some(mut pointer) => {
                let flags = *pointer;
                pointer.clicked = false;
                flags
            }
            None => PointerState::default(),
        };
        if !lifecycle.is_active() {
            continue;
        }

        let rule = variants.rule_for(bubble.variant);
        let delta = growth_delta(rule, &flags, time.delta);
        if delta != 0.0 {
            bubble.grow(delta, rules.min_bubble_size);
        }

        if !bubble.invulnerable && rule.should_auto_pop(bubble.size()) {
            requests.write(LifecycleRequest::Pop {
                entity,
                cause: PopCause::Growth,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growth_delta_sums_sources() {
        let rule = VariantRule {
            click_growth: 1.0,
            hold_growth_rate: 2.0,
            hover_growth_rate: 4.0,
            passive_growth_rate: 8.0,
            ..VariantRule::default()
        };
        let pointer = PointerState {
            hovered: true,
            held: true,
            clicked: true,
            hover_fraction: 0.0,
        };
        assert!((growth_delta(&rule, &pointer, 0.5) - 8.0).abs() < 1e-6);
        assert!((growth_delta(&rule, &PointerState::default(), 0.5) - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_growth_delta_negative_rate_shrinks() {
        let rule = VariantRule {
            passive_growth_rate: -1.0,
            ..VariantRule::default()
        };
        assert!(growth_delta(&rule, &PointerState::default(), 0.1) < 0.0);
    }
}
