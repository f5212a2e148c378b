//! Reference physics stand-in.
//!
//! Enough rigid-body behaviour to run the engine headless:
//!
//! - [`contact_detector`] reports every overlapping bubble pair and every
//!   bubble touching a wall as a [`ContactEvent`]. It is a plain O(n²)
//!   scan over [`Query::iter_combinations`].
//! - [`integrate_bodies`] refreshes mass from the disc area, folds the
//!   accumulated forces and impulses into velocity and moves the bubble.
//!   A center that leaves the world rectangle is put back on its edge.
//!
//! An embedder with a real physics engine leaves both out of the schedule
//! (see [`build_schedule`](crate::simulation::build_schedule)) and writes
//! the contact messages itself.
use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::components::boxcollider::{BoxCollider, Wall};
use crate::components::bubble::Bubble;
use crate::components::lifecycle::Lifecycle;
use crate::components::mapposition::MapPosition;
use crate::components::rigidbody::RigidBody;
use crate::events::contact::ContactEvent;
use crate::resources::gamerules::GameRules;
use crate::resources::worldtime::WorldTime;

pub fn contact_detector(
    bubbles: Query<(Entity, &MapPosition, &Bubble, &Lifecycle)>,
    walls: Query<(Entity, &MapPosition, &BoxCollider), With<Wall>>,
    mut writer: MessageWriter<ContactEvent>,
) {
    for [(a, pos_a, bubble_a, lc_a), (b, pos_b, bubble_b, lc_b)] in bubbles.iter_combinations() {
        if lc_a.is_destroyed() || lc_b.is_destroyed() {
            continue;
        }
        let reach = bubble_a.radius() + bubble_b.radius();
        if pos_a.pos.distance_squared(pos_b.pos) < reach * reach {
            writer.write(ContactEvent::Pair { a, b });
        }
    }

    for (entity, position, bubble, lifecycle) in bubbles.iter() {
        if lifecycle.is_destroyed() {
            continue;
        }
        for (wall, wall_pos, collider) in walls.iter() {
            if collider.overlaps_circle(wall_pos.pos, position.pos, bubble.radius()) {
                writer.write(ContactEvent::Boundary {
                    bubble: entity,
                    wall,
                });
            }
        }
    }
}

pub fn integrate_bodies(
    time: Res<WorldTime>,
    rules: Res<GameRules>,
    mut query: Query<(&mut MapPosition, &mut RigidBody, &Bubble)>,
) {
    let half = rules.half_extents();
    for (mut position, mut body, bubble) in query.iter_mut() {
        if body.frozen {
            body.force = Vec2::ZERO;
            body.impulse = Vec2::ZERO;
            continue;
        }
        body.update_mass(bubble.volume());
        let delta = body.integrate(rules.gravity, time.delta);
        position.pos += delta;

        // Keep the center inside the world; the walls push back the rest.
        if position.pos.x.abs() > half.x {
            position.pos.x = position.pos.x.clamp(-half.x, half.x);
            body.velocity.x = 0.0;
        }
        if position.pos.y.abs() > half.y {
            position.pos.y = position.pos.y.clamp(-half.y, half.y);
            body.velocity.y = 0.0;
        }
    }
}
