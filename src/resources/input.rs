//! Pointer input resource.
//!
//! The host (a renderer, a test, or the headless driver) writes the pointer
//! position in world units and the button state before each tick. The
//! engine resolves which bubble is under the pointer and records it in
//! `hovered`.
use bevy_ecs::prelude::{Entity, Resource};
use glam::Vec2;

#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct PointerInput {
    /// World position of the pointer, `None` when it is outside the view.
    pub position: Option<Vec2>,
    /// The button went down this tick.
    pub clicked: bool,
    /// The button is down.
    pub held: bool,
    /// Bubble under the pointer, resolved by the pointer system.
    pub hovered: Option<Entity>,
}

impl PointerInput {
    /// Pointer at `position` with the button up.
    pub fn at(position: Vec2) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    /// Press the button this tick. Also marks it held.
    pub fn press(&mut self) {
        self.clicked = true;
        self.held = true;
    }

    pub fn release(&mut self) {
        self.clicked = false;
        self.held = false;
    }

    /// Clear the one-shot click flag after it has been consumed.
    pub fn end_tick(&mut self) {
        self.clicked = false;
    }
}
