//! Per-bubble pointer interaction flags.
//!
//! Written by [`crate::systems::pointer::pointer_system`] from the resolved
//! [`PointerInput`](crate::resources::input::PointerInput) and consumed by
//! [`crate::systems::growth::growth_system`].

use bevy_ecs::prelude::Component;

#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerState {
    /// The pointer is over this bubble.
    pub hovered: bool,
    /// The pointer button is held over this bubble.
    pub held: bool,
    /// Clicked this tick; cleared once growth has consumed it.
    pub clicked: bool,
    /// Smoothed hover amount in `[0, 1]`, for renderers.
    pub hover_fraction: f32,
}

impl PointerState {
    /// Move `hover_fraction` toward 1 when hovered and 0 otherwise, covering
    /// the full range in `transition_time` seconds.
    pub fn ease_hover(&mut self, dt: f32, transition_time: f32) {
        let target = if self.hovered { 1.0 } else { 0.0 };
        if transition_time <= 0.0 {
            self.hover_fraction = target;
            return;
        }
        let step = dt.max(0.0) / transition_time;
        self.hover_fraction = if self.hover_fraction < target {
            (self.hover_fraction + step).min(target)
        } else {
            (self.hover_fraction - step).max(target)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ease_hover_toward_one() {
        let mut p = PointerState {
            hovered: true,
            ..Default::default()
        };
        p.ease_hover(0.25, 0.5);
        assert!((p.hover_fraction - 0.5).abs() < 1e-6);
        p.ease_hover(1.0, 0.5);
        assert_eq!(p.hover_fraction, 1.0);
    }

    #[test]
    fn test_ease_hover_toward_zero() {
        let mut p = PointerState {
            hover_fraction: 1.0,
            ..Default::default()
        };
        p.ease_hover(0.1, 0.5);
        assert!((p.hover_fraction - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_ease_hover_instant() {
        let mut p = PointerState {
            hovered: true,
            ..Default::default()
        };
        p.ease_hover(0.01, 0.0);
        assert_eq!(p.hover_fraction, 1.0);
    }
}
