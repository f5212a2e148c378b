//! Contact reports from the physics side.
//!
//! Whatever detects overlaps (the reference
//! [`contact_detector`](crate::systems::physics::contact_detector) or an
//! embedder's physics engine) writes one [`ContactEvent`] per overlapping
//! pair or bubble/wall touch each tick. Pairs may be reported in either
//! order and more than once; the interaction system canonicalises them.
use bevy_ecs::message::Message;
use bevy_ecs::prelude::Entity;

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactEvent {
    /// Two bubbles overlap.
    Pair { a: Entity, b: Entity },
    /// A bubble touches a static wall.
    Boundary { bubble: Entity, wall: Entity },
}
