//! Population injection.
//!
//! - [`spawn_timer_system`] queues a random [`SpawnRequest`] every
//!   `spawn_interval` seconds.
//! - [`spawn_request_system`] enforces the population cap, picks variant,
//!   size and placement, and creates the bubble.
//! - [`spawn_bubble`] is the shared constructor also used by splits and
//!   merges.
//!
//! Capacity exhaustion and placement failure are not errors: the request is
//! dropped and the next interval tries again.
use bevy_ecs::prelude::*;
use glam::Vec2;
use log::debug;
use rustc_hash::FxHashSet;

use crate::components::boxcollider::{BoxCollider, Wall};
use crate::components::bubble::{Bubble, BubbleId, volume_from_size};
use crate::components::lifecycle::{Lifecycle, PopCause};
use crate::components::mapposition::MapPosition;
use crate::components::pointer::PointerState;
use crate::components::rigidbody::RigidBody;
use crate::events::lifecycle::LifecycleRequest;
use crate::events::spawn::SpawnRequest;
use crate::resources::gamerules::{GameRules, SPAWN_ATTEMPTS};
use crate::resources::registry::BubbleRegistry;
use crate::resources::simrng::SimRng;
use crate::resources::variants::VariantRuleSet;
use crate::resources::worldtime::WorldTime;

/// Everything needed to place one new bubble.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BubbleSpawn {
    pub position: Vec2,
    /// Diameter.
    pub size: f32,
    /// Must already be resolved against the rule set.
    pub variant: usize,
    pub velocity: Vec2,
    /// Applied on the first integration step.
    pub impulse: Vec2,
}

impl BubbleSpawn {
    pub fn new(position: Vec2, size: f32, variant: usize) -> Self {
        Self {
            position,
            size,
            variant,
            velocity: Vec2::ZERO,
            impulse: Vec2::ZERO,
        }
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_impulse(mut self, impulse: Vec2) -> Self {
        self.impulse = impulse;
        self
    }
}

/// Create a bubble entity and register it.
///
/// The body takes drag, speed clamp and gravity factor from the variant and
/// a density sampled from its `density_range`.
pub fn spawn_bubble(
    commands: &mut Commands,
    registry: &mut BubbleRegistry,
    variants: &VariantRuleSet,
    rng: &mut SimRng,
    spawn: BubbleSpawn,
) -> (Entity, BubbleId) {
    let rule = variants.rule_for(spawn.variant);
    let bubble = Bubble::new(spawn.size, spawn.variant);

    let density = rng.range_f32(rule.density_range.0, rule.density_range.1);
    let max_speed = (rule.max_speed > 0.0).then_some(rule.max_speed);
    let mut body = RigidBody::with_physics(rule.drag, max_speed)
        .with_gravity_factor(rule.gravity_factor)
        .with_density(density);
    body.update_mass(volume_from_size(bubble.size()));
    body.velocity = spawn.velocity;
    body.apply_impulse(spawn.impulse);

    let entity = commands
        .spawn((
            bubble,
            Lifecycle::new(),
            PointerState::default(),
            MapPosition::from_vec(spawn.position),
            body,
        ))
        .id();
    let id = registry.register(entity, spawn.position, bubble.size(), spawn.variant);
    commands.entity(entity).insert(id);
    (entity, id)
}

/// Random direction, magnitude uniform in `[impulse / 2, impulse]`.
pub fn random_impulse(rng: &mut SimRng, impulse: f32) -> Vec2 {
    let magnitude = rng.range_f32(impulse * 0.5, impulse);
    Vec2::from_angle(rng.angle()) * magnitude
}

/// Whether a disc at `center` touches any wall.
pub fn overlaps_wall<'a>(
    walls: impl IntoIterator<Item = (&'a MapPosition, &'a BoxCollider)>,
    center: Vec2,
    radius: f32,
) -> bool {
    walls
        .into_iter()
        .any(|(position, collider)| collider.overlaps_circle(position.pos, center, radius))
}

/// Queue one random spawn per elapsed `spawn_interval`, at most one per tick.
pub fn spawn_timer_system(
    time: Res<WorldTime>,
    rules: Res<GameRules>,
    mut elapsed: Local<f32>,
    mut writer: MessageWriter<SpawnRequest>,
) {
    if rules.spawn_interval <= 0.0 {
        return;
    }
    *elapsed += time.delta;
    if *elapsed >= rules.spawn_interval {
        *elapsed = 0.0;
        writer.write(SpawnRequest::random());
    }
}

#[allow(clippy::too_many_arguments)]
pub fn spawn_request_system(
    mut commands: Commands,
    rules: Res<GameRules>,
    variants: Res<VariantRuleSet>,
    mut registry: ResMut<BubbleRegistry>,
    mut rng: ResMut<SimRng>,
    mut reader: MessageReader<SpawnRequest>,
    walls: Query<(&MapPosition, &BoxCollider), With<Wall>>,
    bubbles: Query<(Entity, &BubbleId, &Bubble, &Lifecycle)>,
    mut requests: MessageWriter<LifecycleRequest>,
) {
    let mut evicted: FxHashSet<Entity> = FxHashSet::default();

    for request in reader.read().copied() {
        if registry.is_at_capacity(rules.max_bubbles) {
            if rules.pop_random_to_spawn {
                let mut candidates: Vec<(BubbleId, Entity)> = bubbles
                    .iter()
                    .filter(|(entity, _, bubble, lifecycle)| {
                        lifecycle.accepts_transition(bubble) && !evicted.contains(entity)
                    })
                    .map(|(entity, id, _, _)| (*id, entity))
                    .collect();
                candidates.sort_unstable();
                if !candidates.is_empty() {
                    let (id, victim) = candidates[rng.range_usize(0, candidates.len())];
                    debug!("World full, evicting bubble {:?}", id);
                    evicted.insert(victim);
                    requests.write(LifecycleRequest::Pop {
                        entity: victim,
                        cause: PopCause::Evict,
                    });
                }
            }
            // The evicted bubble still holds its slot until its pop completes.
            if registry.is_at_capacity(rules.max_bubbles) {
                debug!("World full ({} bubbles), spawn aborted", registry.count());
                continue;
            }
        }

        let variant = match request.variant {
            Some(v) => variants.resolve_variant(v),
            None => variants.resolve_variant(rng.range_usize(
                rules.min_variant_id,
                rules.variant_count.min(variants.len()),
            )),
        };
        let rule = variants.rule_for(variant);
        let size = rng.range_f32(rule.size_range.0, rule.size_range.1);
        let radius = size * 0.5;

        let position = match request.position {
            Some(point) => (!overlaps_wall(walls.iter(), point, radius)).then_some(point),
            None => {
                let half = rules.half_extents();
                (0..SPAWN_ATTEMPTS)
                    .map(|_| {
                        Vec2::new(
                            rng.range_f32(-half.x, half.x),
                            rng.range_f32(-half.y, half.y),
                        )
                    })
                    .find(|candidate| !overlaps_wall(walls.iter(), *candidate, radius))
            }
        };
        let Some(position) = position else {
            debug!("No free spot for a bubble of size {:.2}, spawn skipped", size);
            continue;
        };

        let impulse = random_impulse(&mut rng, rule.initial_impulse);
        let (_, id) = spawn_bubble(
            &mut commands,
            &mut registry,
            &variants,
            &mut rng,
            BubbleSpawn::new(position, size, variant).with_impulse(impulse),
        );
        debug!(
            "Spawned bubble {:?} variant {} size {:.2} at ({:.2}, {:.2})",
            id, variant, size, position.x, position.y
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_impulse_magnitude_range() {
        let mut rng = SimRng::with_seed(3);
        for _ in 0..50 {
            let len = random_impulse(&mut rng, 4.0).length();
            assert!((2.0 - 1e-4..=4.0 + 1e-4).contains(&len));
        }
    }

    #[test]
    fn test_overlaps_wall() {
        let wall = (MapPosition::new(5.0, 0.0), BoxCollider::centered(1.0, 10.0));
        let walls = [(&wall.0, &wall.1)];
        assert!(overlaps_wall(walls, Vec2::new(4.0, 0.0), 0.6));
        assert!(!overlaps_wall(walls, Vec2::new(0.0, 0.0), 0.6));
    }
}
