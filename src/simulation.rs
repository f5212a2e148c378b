//! One self-contained bubble simulation.
//!
//! A [`Simulation`] owns its `World` and `Schedule`; nothing is global, so
//! any number can run side by side. The host drives it with
//! [`Simulation::step`], feeds pointer input through
//! [`Simulation::pointer_mut`] and reads back
//! [`Simulation::snapshot`], [`Simulation::stats`] and
//! [`Simulation::drain_events`].
use bevy_ecs::prelude::*;
use bevy_ecs::world::CommandQueue;
use glam::Vec2;
use log::{debug, info};

use crate::components::boxcollider::{BoxCollider, Wall};
use crate::components::lifecycle::PopCause;
use crate::components::mapposition::MapPosition;
use crate::events::lifecycle::{BubbleEvent, LifecycleRequest};
use crate::events::spawn::SpawnRequest;
use crate::resources::gamerules::GameRules;
use crate::resources::input::PointerInput;
use crate::resources::registry::{BubbleRegistry, BubbleSnapshot};
use crate::resources::simrng::SimRng;
use crate::resources::stats::LevelStats;
use crate::resources::variants::VariantRuleSet;
use crate::resources::worldtime::WorldTime;
use crate::systems::growth::growth_system;
use crate::systems::interaction::interaction_system;
use crate::systems::lifecycle::{
    advance_merge_sequences, advance_pop_sequences, apply_lifecycle_requests, chain_pop_system,
};
use crate::systems::physics::{contact_detector, integrate_bodies};
use crate::systems::pointer::pointer_system;
use crate::systems::queues::{init_message_queues, update_message_queues};
use crate::systems::registry::sync_registry_system;
use crate::systems::spawn::{BubbleSpawn, spawn_bubble, spawn_request_system, spawn_timer_system};
use crate::systems::stats::update_stats_system;
use crate::systems::time::update_world_time;

/// Build the per-tick schedule.
///
/// With `builtin_physics` the reference contact detector and integrator
/// run inside the tick. Without it the host must write
/// [`ContactEvent`](crate::events::contact::ContactEvent)s before each step
/// and integrate the bodies itself.
pub fn build_schedule(builtin_physics: bool) -> Schedule {
    let mut schedule = Schedule::default();
    if builtin_physics {
        schedule.add_systems(
            (
                update_message_queues,
                sync_registry_system,
                update_stats_system,
                pointer_system,
                spawn_timer_system,
                spawn_request_system,
                growth_system,
                contact_detector,
                interaction_system,
                apply_lifecycle_requests,
                chain_pop_system,
                advance_pop_sequences,
                advance_merge_sequences,
                integrate_bodies,
            )
                .chain(),
        );
    } else {
        schedule.add_systems(
            (
                update_message_queues,
                sync_registry_system,
                update_stats_system,
                pointer_system,
                spawn_timer_system,
                spawn_request_system,
                growth_system,
                interaction_system,
                apply_lifecycle_requests,
                chain_pop_system,
                advance_pop_sequences,
                advance_merge_sequences,
            )
                .chain(),
        );
    }
    schedule
}

/// Four walls framing the world rectangle, centered on the origin.
pub fn spawn_walls(world: &mut World, rules: &GameRules) {
    let half = rules.half_extents();
    let t = rules.wall_thickness.max(f32::EPSILON);
    let full_width = rules.world_size.x + 2.0 * t;
    let full_height = rules.world_size.y + 2.0 * t;
    let walls = [
        (Vec2::new(0.0, half.y + t * 0.5), full_width, t),
        (Vec2::new(0.0, -half.y - t * 0.5), full_width, t),
        (Vec2::new(-half.x - t * 0.5, 0.0), t, full_height),
        (Vec2::new(half.x + t * 0.5, 0.0), t, full_height),
    ];
    for (center, width, height) in walls {
        world.spawn((
            Wall,
            MapPosition::from_vec(center),
            BoxCollider::centered(width, height),
        ));
    }
}

pub struct Simulation {
    world: World,
    schedule: Schedule,
}

impl Simulation {
    /// A simulation with the reference physics, walls and the initial spawn
    /// batch queued for the first tick.
    pub fn new(rules: GameRules, variants: VariantRuleSet, seed: u64) -> Self {
        Self::with_physics(rules, variants, seed, true)
    }

    pub fn with_physics(
        rules: GameRules,
        variants: VariantRuleSet,
        seed: u64,
        builtin_physics: bool,
    ) -> Self {
        let mut world = World::new();
        init_message_queues(&mut world);

        spawn_walls(&mut world, &rules);
        let initial = rules.initial_spawn_count;
        info!(
            "Simulation ready: {} variants, max {} bubbles, {} initial spawns",
            variants.len(),
            rules.max_bubbles,
            initial
        );

        world.insert_resource(WorldTime::default());
        world.insert_resource(rules);
        world.insert_resource(variants);
        world.insert_resource(BubbleRegistry::new());
        world.insert_resource(LevelStats::new());
        world.insert_resource(PointerInput::default());
        world.insert_resource(SimRng::with_seed(seed));

        let mut spawns = world.resource_mut::<Messages<SpawnRequest>>();
        for _ in 0..initial {
            spawns.write(SpawnRequest::random());
        }

        Self {
            world,
            schedule: build_schedule(builtin_physics),
        }
    }

    /// Advance one tick of `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        update_world_time(&mut self.world, dt);
        self.schedule.run(&mut self.world);
        self.world.clear_trackers();
    }

    /// Put a bubble at a fixed spot right away, bypassing the spawn policy.
    /// Used for hand-authored layouts. Returns `None` once the world holds
    /// `max_bubbles`.
    pub fn place_bubble(&mut self, position: Vec2, size: f32, variant: usize) -> Option<Entity> {
        let max = self.world.resource::<GameRules>().max_bubbles;
        if self.world.resource::<BubbleRegistry>().is_at_capacity(max) {
            debug!("World full ({} bubbles), placement at {:?} refused", max, position);
            return None;
        }
        let variant = self.world.resource::<VariantRuleSet>().resolve_variant(variant);
        let mut queue = CommandQueue::default();
        let entity = self
            .world
            .resource_scope(|world, mut registry: Mut<BubbleRegistry>| {
                world.resource_scope(|world, mut rng: Mut<SimRng>| {
                    let mut commands = Commands::new(&mut queue, world);
                    let variants = world.resource::<VariantRuleSet>();
                    let (entity, _) = spawn_bubble(
                        &mut commands,
                        &mut registry,
                        variants,
                        &mut rng,
                        BubbleSpawn::new(position, size, variant),
                    );
                    entity
                })
            });
        queue.apply(&mut self.world);
        Some(entity)
    }

    pub fn request_spawn(&mut self, request: SpawnRequest) {
        self.world
            .resource_mut::<Messages<SpawnRequest>>()
            .write(request);
    }

    /// Ask for a pop from outside the engine. The guard still applies.
    pub fn request_pop(&mut self, entity: Entity) {
        self.world
            .resource_mut::<Messages<LifecycleRequest>>()
            .write(LifecycleRequest::Pop {
                entity,
                cause: PopCause::External,
            });
    }

    pub fn pointer_mut(&mut self) -> Mut<'_, PointerInput> {
        self.world.resource_mut::<PointerInput>()
    }

    pub fn snapshot(&self) -> Vec<BubbleSnapshot> {
        self.registry()
            .snapshot(self.world.resource::<VariantRuleSet>())
    }

    pub fn registry(&self) -> &BubbleRegistry {
        self.world.resource::<BubbleRegistry>()
    }

    pub fn stats(&self) -> &LevelStats {
        self.world.resource::<LevelStats>()
    }

    pub fn rules(&self) -> &GameRules {
        self.world.resource::<GameRules>()
    }

    pub fn elapsed(&self) -> f32 {
        self.world.resource::<WorldTime>().elapsed
    }

    /// Take every lifecycle notification not yet drained.
    pub fn drain_events(&mut self) -> Vec<BubbleEvent> {
        self.world
            .resource_mut::<Messages<BubbleEvent>>()
            .drain()
            .collect()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}
