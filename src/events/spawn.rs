//! Requests to add a bubble to the world.
//!
//! Queued by the spawn timer, by [`Simulation::new`](crate::simulation::Simulation::new)
//! for the initial batch, or by a host reacting to a click-to-spawn.
use bevy_ecs::message::Message;
use glam::Vec2;

#[derive(Message, Debug, Clone, Copy, PartialEq, Default)]
pub struct SpawnRequest {
    /// Variant to spawn; random within the configured range when `None`.
    pub variant: Option<usize>,
    /// Spawn point; random within the world when `None`.
    pub position: Option<Vec2>,
}

impl SpawnRequest {
    pub fn random() -> Self {
        Self::default()
    }

    pub fn at(position: Vec2, variant: usize) -> Self {
        Self {
            variant: Some(variant),
            position: Some(position),
        }
    }
}
