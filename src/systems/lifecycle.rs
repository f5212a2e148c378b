//! Lifecycle systems: applying requests and running pop/merge sequences.
//!
//! # Pop
//!
//! Once accepted, a pop inflates the bubble for `pop_delay` seconds. When
//! the animation ends:
//!
//! 1. every active bubble within `radius · pop_radius_ratio` of the
//!    inflated bubble gets an outward impulse of `pop_force` scaled by the
//!    overlap ratio with that blast circle;
//! 2. with `pop_matching_neighbors`, same-variant neighbours overlapping the
//!    *original* disc by at least `min_overlap_to_pop` get a [`PendingPop`]
//!    with a random delay from `neighbor_pop_delay`;
//! 3. with `pop_split_count > 0`, the original volume times
//!    `pop_split_volume_factor` is shared evenly between that many
//!    children, as far as the population cap allows;
//! 4. the bubble is destroyed and leaves the registry.
//!
//! # Merge
//!
//! Both halves shrink toward `merge_size_shrink` of their size over
//! `merge_delay` seconds. The leader (lower [`BubbleId`]) then replaces
//! the pair with one bubble holding
//! `(volume_a + volume_b) · merge_volume_factor` at the size-weighted
//! position, and pulls in neighbours within `new_size · merge_radius_ratio`
//! with `merge_force`. A half whose partner disappeared goes back to
//! `Active` at its original size.
use bevy_ecs::prelude::*;
use glam::Vec2;
use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::components::bubble::{Bubble, BubbleId, size_from_volume, volume_from_size};
use crate::components::lifecycle::{
    Lifecycle, LifecycleState, MergeLink, PendingPop, PopCause, merge_allowed,
};
use crate::components::mapposition::MapPosition;
use crate::components::rigidbody::RigidBody;
use crate::events::lifecycle::{BubbleEvent, LifecycleRequest};
use crate::resources::gamerules::GameRules;
use crate::resources::registry::BubbleRegistry;
use crate::resources::simrng::SimRng;
use crate::resources::stats::LevelStats;
use crate::resources::variants::VariantRuleSet;
use crate::resources::worldtime::WorldTime;
use crate::systems::spawn::{BubbleSpawn, random_impulse, spawn_bubble};

/// Overlap ratio between a circle of `radius` at `center` and a registered
/// bubble, plus the unit direction from `center` toward it.
fn radial_overlap(center: Vec2, radius: f32, other_center: Vec2, other_radius: f32) -> (Vec2, f32) {
    let offset = other_center - center;
    let distance = offset.length();
    let combined = radius + other_radius;
    let ratio = if combined > 0.0 {
        (combined - distance).max(0.0) / combined
    } else {
        0.0
    };
    (offset.try_normalize().unwrap_or(Vec2::X), ratio)
}

/// Apply queued pop and merge requests through the lifecycle guard.
///
/// Rejected requests (popped, merging, invulnerable or gone) are dropped
/// without a trace.
pub fn apply_lifecycle_requests(
    variants: Res<VariantRuleSet>,
    mut registry: ResMut<BubbleRegistry>,
    mut stats: ResMut<LevelStats>,
    mut reader: MessageReader<LifecycleRequest>,
    mut bubbles: Query<(&BubbleId, &Bubble, &mut Lifecycle)>,
    mut events: MessageWriter<BubbleEvent>,
) {
    for request in reader.read().copied() {
        match request {
            LifecycleRequest::Pop { entity, cause } => {
                let Ok((id, bubble, mut lifecycle)) = bubbles.get_mut(entity) else {
                    continue;
                };
                if lifecycle.begin_pop(bubble, variants.rule_for(bubble.variant)) {
                    registry.set_state(entity, lifecycle.state());
                    stats.record_pop(cause);
                    debug!("Bubble {:?} popping ({:?})", id, cause);
                    events.write(BubbleEvent::PopStarted {
                        id: *id,
                        variant: bubble.variant,
                        cause,
                    });
                }
            }
            LifecycleRequest::Merge { a, b } => {
                if a == b {
                    continue;
                }
                let (Ok((id_a, bubble_a, lc_a)), Ok((id_b, bubble_b, lc_b))) =
                    (bubbles.get(a), bubbles.get(b))
                else {
                    continue;
                };
                if !merge_allowed((lc_a, bubble_a), (lc_b, bubble_b)) {
                    continue;
                }
                let (id_a, id_b) = (*id_a, *id_b);
                let (bubble_a, bubble_b) = (*bubble_a, *bubble_b);
                let a_leads = id_a < id_b;

                if let Ok((_, _, mut lifecycle)) = bubbles.get_mut(a) {
                    lifecycle.begin_merge(&bubble_a, b, a_leads, variants.rule_for(bubble_a.variant));
                }
                if let Ok((_, _, mut lifecycle)) = bubbles.get_mut(b) {
                    lifecycle.begin_merge(&bubble_b, a, !a_leads, variants.rule_for(bubble_b.variant));
                }
                registry.set_state(a, LifecycleState::AnimatingMerge);
                registry.set_state(b, LifecycleState::AnimatingMerge);
                stats.record_merge();

                let (leader, follower) = if a_leads { (id_a, id_b) } else { (id_b, id_a) };
                debug!("Bubbles {:?} and {:?} merging", leader, follower);
                events.write(BubbleEvent::MergeStarted { leader, follower });
            }
        }
    }
}

/// Count chain-reaction delays down and request the pop when they expire.
pub fn chain_pop_system(
    mut commands: Commands,
    time: Res<WorldTime>,
    mut pending: Query<(Entity, &mut PendingPop, &Lifecycle)>,
    mut requests: MessageWriter<LifecycleRequest>,
) {
    for (entity, mut pending_pop, lifecycle) in pending.iter_mut() {
        if !lifecycle.is_active() {
            commands.entity(entity).try_remove::<PendingPop>();
            continue;
        }
        pending_pop.remaining -= time.delta;
        if pending_pop.remaining <= 0.0 {
            requests.write(LifecycleRequest::Pop {
                entity,
                cause: PopCause::Chain,
            });
            commands.entity(entity).try_remove::<PendingPop>();
        }
    }
}

/// A pop whose animation ended this tick.
#[derive(Debug, Clone, Copy)]
struct FinishedPop {
    entity: Entity,
    id: BubbleId,
    variant: usize,
    position: Vec2,
    /// Diameter at the moment the pop was accepted.
    initial_size: f32,
    /// Inflated diameter.
    size: f32,
}

#[allow(clippy::too_many_arguments)]
pub fn advance_pop_sequences(
    mut commands: Commands,
    time: Res<WorldTime>,
    rules: Res<GameRules>,
    variants: Res<VariantRuleSet>,
    mut registry: ResMut<BubbleRegistry>,
    mut rng: ResMut<SimRng>,
    mut stats: ResMut<LevelStats>,
    mut popping: Query<(Entity, &BubbleId, &mut Bubble, &mut Lifecycle, &MapPosition)>,
    mut bodies: Query<&mut RigidBody>,
    pending: Query<(), With<PendingPop>>,
    mut events: MessageWriter<BubbleEvent>,
) {
    let mut finished: Vec<FinishedPop> = Vec::new();
    for (entity, id, mut bubble, mut lifecycle, position) in popping.iter_mut() {
        if lifecycle.state() != LifecycleState::AnimatingPop {
            continue;
        }
        let step = lifecycle.advance(time.delta);
        if let Some(size) = step.size {
            bubble.set_size(size);
        }
        if step.finished {
            lifecycle.mark_destroyed();
            registry.set_state(entity, LifecycleState::Destroyed);
            finished.push(FinishedPop {
                entity,
                id: *id,
                variant: bubble.variant,
                position: position.pos,
                initial_size: lifecycle.initial_size(),
                size: bubble.size(),
            });
        }
    }
    finished.sort_by_key(|pop| pop.id);

    let mut scheduled: FxHashSet<Entity> = FxHashSet::default();
    for pop in finished {
        let rule = variants.rule_for(pop.variant);

        // Blast from the inflated disc.
        let blast_radius = pop.size * 0.5 * rule.pop_radius_ratio;
        let blast: SmallVec<[(Entity, Vec2, f32); 8]> = registry
            .within_radius(pop.position, blast_radius)
            .into_iter()
            .filter(|n| n.entity != pop.entity && n.is_active())
            .map(|n| (n.entity, n.center, n.radius))
            .collect();
        for (entity, center, radius) in blast {
            let (direction, ratio) = radial_overlap(pop.position, blast_radius, center, radius);
            if let Ok(mut body) = bodies.get_mut(entity) {
                body.apply_impulse(direction * rule.pop_force * ratio);
            }
        }

        // Chain reaction against the true disc.
        if rule.pop_matching_neighbors {
            let true_radius = pop.initial_size * 0.5;
            let (min_delay, max_delay) = rule.neighbor_pop_delay;
            let neighbours: SmallVec<[Entity; 8]> = registry
                .iter()
                .filter(|n| {
                    n.entity != pop.entity
                        && n.is_active()
                        && !n.invulnerable
                        && n.variant == pop.variant
                        && !scheduled.contains(&n.entity)
                        && !pending.contains(n.entity)
                })
                .filter(|n| {
                    radial_overlap(pop.position, true_radius, n.center, n.radius).1
                        >= rule.min_overlap_to_pop
                })
                .map(|n| n.entity)
                .collect();
            for entity in neighbours {
                let delay = rng.range_f32(min_delay, max_delay);
                commands.entity(entity).try_insert(PendingPop::new(delay));
                scheduled.insert(entity);
            }
        }

        // The parent's slot is free before the children take theirs.
        registry.remove(pop.entity);

        if rule.pop_split_count > 0 {
            let requested = rule.pop_split_count as usize;
            let count = requested.min(registry.remaining_capacity(rules.max_bubbles));
            if count < requested {
                debug!(
                    "Split of {:?} limited to {} of {} children by capacity",
                    pop.id, count, requested
                );
            }
            let child_variant =
                variants.resolve_variant(rule.pop_split_variant.unwrap_or(pop.variant));
            let child_rule = variants.rule_for(child_variant);
            let child_volume =
                volume_from_size(pop.initial_size) * rule.pop_split_volume_factor / requested as f32;
            let child_size = size_from_volume(child_volume);
            let true_radius = pop.initial_size * 0.5;

            for _ in 0..count {
                let direction = Vec2::from_angle(rng.angle());
                let offset = direction * rng.range_f32(0.0, true_radius);
                let impulse = direction * random_impulse(&mut rng, child_rule.initial_impulse).length();
                let (_, child) = spawn_bubble(
                    &mut commands,
                    &mut registry,
                    &variants,
                    &mut rng,
                    BubbleSpawn::new(pop.position + offset, child_size, child_variant)
                        .with_impulse(impulse),
                );
                stats.splits_spawned += 1;
                events.write(BubbleEvent::SplitSpawned {
                    parent: pop.id,
                    child,
                    variant: child_variant,
                });
            }
        }

        commands.entity(pop.entity).try_despawn();
        debug!("Bubble {:?} popped", pop.id);
        events.write(BubbleEvent::PopCompleted {
            id: pop.id,
            variant: pop.variant,
            position: pop.position,
            size: pop.size,
        });
    }
}

/// One half of a merge as seen this tick.
#[derive(Debug, Clone, Copy)]
struct MergeHalf {
    id: BubbleId,
    variant: usize,
    position: Vec2,
    initial_size: f32,
    link: MergeLink,
    finished: bool,
}

#[allow(clippy::too_many_arguments)]
pub fn advance_merge_sequences(
    mut commands: Commands,
    time: Res<WorldTime>,
    variants: Res<VariantRuleSet>,
    mut registry: ResMut<BubbleRegistry>,
    mut rng: ResMut<SimRng>,
    mut merging: Query<(Entity, &BubbleId, &mut Bubble, &mut Lifecycle, &MapPosition)>,
    mut bodies: Query<&mut RigidBody>,
    mut events: MessageWriter<BubbleEvent>,
) {
    let mut halves: FxHashMap<Entity, MergeHalf> = FxHashMap::default();
    for (entity, id, mut bubble, mut lifecycle, position) in merging.iter_mut() {
        if lifecycle.state() != LifecycleState::AnimatingMerge {
            continue;
        }
        let Some(link) = lifecycle.merge_link() else {
            continue;
        };
        let step = lifecycle.advance(time.delta);
        if let Some(size) = step.size {
            bubble.set_size(size);
        }
        halves.insert(
            entity,
            MergeHalf {
                id: *id,
                variant: bubble.variant,
                position: position.pos,
                initial_size: lifecycle.initial_size(),
                link,
                finished: step.finished,
            },
        );
    }

    let mut order: Vec<(BubbleId, Entity)> = halves.iter().map(|(e, h)| (h.id, *e)).collect();
    order.sort_unstable();

    for (_, entity) in order {
        let Some(half) = halves.get(&entity).copied() else {
            continue;
        };
        let partner = halves
            .get(&half.link.partner)
            .copied()
            .filter(|p| p.link.partner == entity);

        let Some(partner) = partner else {
            // The other half is gone: back to Active at the original size.
            if let Ok((_, _, mut bubble, mut lifecycle, _)) = merging.get_mut(entity) {
                let size = lifecycle.release();
                bubble.set_size(size);
                registry.set_state(entity, lifecycle.state());
                debug!("Merge partner of {:?} vanished, released", half.id);
            }
            continue;
        };
        if !half.link.leader || !half.finished || !partner.finished {
            continue;
        }
        let partner_entity = half.link.partner;

        let rule = variants.rule_for(half.variant);
        let volume =
            (volume_from_size(half.initial_size) + volume_from_size(partner.initial_size))
                * rule.merge_volume_factor;
        let new_size = size_from_volume(volume);
        let size_sum = half.initial_size + partner.initial_size;
        let weight = if size_sum > 0.0 {
            partner.initial_size / size_sum
        } else {
            0.5
        };
        let position = half.position.lerp(partner.position, weight);
        let variant = variants.resolve_variant(rule.merged_variant.unwrap_or(half.variant));

        let velocity_of = |e: Entity| bodies.get(e).map(|b| b.velocity).unwrap_or(Vec2::ZERO);
        let velocity = velocity_of(entity) * (1.0 - weight) + velocity_of(partner_entity) * weight;

        for source in [entity, partner_entity] {
            if let Ok((_, _, _, mut lifecycle, _)) = merging.get_mut(source) {
                lifecycle.mark_destroyed();
            }
            registry.remove(source);
            commands.entity(source).try_despawn();
            halves.remove(&source);
        }

        // Implosion around the merged bubble.
        let reach = new_size * rule.merge_radius_ratio;
        let pulled: SmallVec<[(Entity, Vec2, f32); 8]> = registry
            .within_radius(position, reach)
            .into_iter()
            .filter(|n| n.is_active())
            .map(|n| (n.entity, n.center, n.radius))
            .collect();
        for (neighbour, center, radius) in pulled {
            let (direction, ratio) = radial_overlap(position, reach, center, radius);
            if let Ok(mut body) = bodies.get_mut(neighbour) {
                body.apply_impulse(direction * rule.merge_force * ratio);
            }
        }

        let (_, merged) = spawn_bubble(
            &mut commands,
            &mut registry,
            &variants,
            &mut rng,
            BubbleSpawn::new(position, new_size, variant).with_velocity(velocity),
        );
        debug!(
            "Bubbles {:?} and {:?} merged into {:?} (size {:.2})",
            half.id, partner.id, merged, new_size
        );
        events.write(BubbleEvent::MergeCompleted {
            merged,
            variant,
            position,
            size: new_size,
        });
    }
}
