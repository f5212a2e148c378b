//! Pointer interaction: hover tracking, click and hold.
//!
//! The bubble under the pointer is the registry's nearest bubble when the
//! pointer lies inside its disc. Hover enter/exit is reported as
//! [`BubbleEvent`]s and each bubble's hover fraction eases toward its new
//! target. A click on a bubble whose variant has `pop_on_click` submits a
//! pop; any other click only flags the bubble for the growth bonus.
use bevy_ecs::prelude::*;
use log::debug;

use crate::components::bubble::{Bubble, BubbleId};
use crate::components::lifecycle::{Lifecycle, PopCause};
use crate::components::pointer::PointerState;
use crate::events::lifecycle::{BubbleEvent, LifecycleRequest};
use crate::resources::gamerules::GameRules;
use crate::resources::input::PointerInput;
use crate::resources::registry::BubbleRegistry;
use crate::resources::stats::LevelStats;
use crate::resources::variants::VariantRuleSet;
use crate::resources::worldtime::WorldTime;

#[allow(clippy::too_many_arguments)]
pub fn pointer_system(
    time: Res<WorldTime>,
    rules: Res<GameRules>,
    variants: Res<VariantRuleSet>,
    registry: Res<BubbleRegistry>,
    mut input: ResMut<PointerInput>,
    mut stats: ResMut<LevelStats>,
    mut bubbles: Query<(Entity, &BubbleId, &Bubble, &Lifecycle, &mut PointerState)>,
    mut requests: MessageWriter<LifecycleRequest>,
    mut events: MessageWriter<BubbleEvent>,
) {
    let hovered = input.position.and_then(|point| {
        registry
            .nearest_to(point)
            .filter(|b| b.normalized_distance(point) < 1.0)
            .map(|b| b.entity)
    });
    input.hovered = hovered;

    for (entity, id, bubble, lifecycle, mut pointer) in bubbles.iter_mut() {
        let is_hovered = hovered == Some(entity);
        if is_hovered != pointer.hovered {
            events.write(if is_hovered {
                BubbleEvent::HoverEntered { id: *id }
            } else {
                BubbleEvent::HoverExited { id: *id }
            });
        }
        pointer.hovered = is_hovered;
        pointer.held = is_hovered && input.held;

        if is_hovered && input.clicked {
            stats.clicks += 1;
            let rule = variants.rule_for(bubble.variant);
            if rule.pop_on_click && lifecycle.accepts_transition(bubble) {
                debug!("Click pops bubble {:?}", id);
                requests.write(LifecycleRequest::Pop {
                    entity,
                    cause: PopCause::Click,
                });
            } else {
                pointer.clicked = true;
            }
        }

        pointer.ease_hover(time.delta, rules.hover_transition_time);
    }

    input.end_tick();
}
