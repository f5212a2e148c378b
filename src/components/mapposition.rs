use bevy_ecs::prelude::Component;
use glam::Vec2;

/// World-space center of an entity.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct MapPosition {
    pub pos: Vec2,
}

impl MapPosition {
    pub fn new(x: f32, y: f32) -> Self {
        Self { pos: Vec2::new(x, y) }
    }

    pub fn from_vec(pos: Vec2) -> Self {
        Self { pos }
    }
}
