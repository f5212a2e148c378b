//! Core bubble component and the 2D volume model.
//!
//! A bubble's `size` is its diameter. The conserved quantity across merges
//! and splits is the area of its disc, called "volume" throughout the
//! engine. [`volume_from_size`] and [`size_from_volume`] are exact inverses.

use bevy_ecs::prelude::Component;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Smallest diameter a bubble can ever have.
pub const MIN_DIAMETER: f32 = 1e-3;

/// Area of a disc with the given diameter.
pub fn volume_from_size(size: f32) -> f32 {
    let radius = size * 0.5;
    PI * radius * radius
}

/// Diameter of a disc with the given area. Non-positive volumes give 0.
pub fn size_from_volume(volume: f32) -> f32 {
    if volume <= 0.0 {
        return 0.0;
    }
    2.0 * (volume / PI).sqrt()
}

/// Stable identity handed out by the [`BubbleRegistry`](crate::resources::registry::BubbleRegistry).
///
/// Entity ids can be recycled by the ECS; this one never is, and it orders
/// bubbles by creation which keeps pairwise processing deterministic.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BubbleId(pub u64);

/// Simulation state of one bubble.
///
/// Position and velocity live in [`MapPosition`](super::mapposition::MapPosition)
/// and [`RigidBody`](super::rigidbody::RigidBody); lifecycle state lives in
/// [`Lifecycle`](super::lifecycle::Lifecycle).
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Bubble {
    size: f32,
    /// Index into the [`VariantRuleSet`](crate::resources::variants::VariantRuleSet).
    pub variant: usize,
    /// Invulnerable bubbles reject every pop and merge.
    pub invulnerable: bool,
}

impl Bubble {
    pub fn new(size: f32, variant: usize) -> Self {
        Self {
            size: size.max(MIN_DIAMETER),
            variant,
            invulnerable: false,
        }
    }

    pub fn with_invulnerable(mut self, invulnerable: bool) -> Self {
        self.invulnerable = invulnerable;
        self
    }

    /// Diameter.
    pub fn size(&self) -> f32 {
        self.size
    }

    /// Set the diameter, never going below [`MIN_DIAMETER`].
    pub fn set_size(&mut self, size: f32) {
        self.size = if size.is_finite() {
            size.max(MIN_DIAMETER)
        } else {
            MIN_DIAMETER
        };
    }

    pub fn radius(&self) -> f32 {
        self.size * 0.5
    }

    pub fn volume(&self) -> f32 {
        volume_from_size(self.size)
    }

    /// Add `delta_volume` to the disc area, keeping at least the area of a
    /// disc of diameter `min_size`. Returns the new diameter.
    pub fn grow(&mut self, delta_volume: f32, min_size: f32) -> f32 {
        let floor = volume_from_size(min_size.max(MIN_DIAMETER));
        let volume = (self.volume() + delta_volume).max(floor);
        self.set_size(size_from_volume(volume));
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_volume_and_size_are_inverse() {
        for size in [0.3, 1.0, 2.5, 7.0] {
            assert!(approx_eq(size_from_volume(volume_from_size(size)), size));
        }
    }

    #[test]
    fn test_volume_of_unit_radius() {
        assert!(approx_eq(volume_from_size(2.0), PI));
    }

    #[test]
    fn test_size_from_non_positive_volume() {
        assert_eq!(size_from_volume(0.0), 0.0);
        assert_eq!(size_from_volume(-3.0), 0.0);
    }

    #[test]
    fn test_new_clamps_size() {
        let b = Bubble::new(0.0, 0);
        assert!(b.size() > 0.0);
        let b = Bubble::new(-4.0, 1);
        assert!(b.size() > 0.0);
    }

    #[test]
    fn test_set_size_rejects_nan() {
        let mut b = Bubble::new(1.0, 0);
        b.set_size(f32::NAN);
        assert!(b.size() > 0.0);
    }

    #[test]
    fn test_grow_adds_volume() {
        let mut b = Bubble::new(2.0, 0);
        let before = b.volume();
        b.grow(1.5, 0.3);
        assert!(approx_eq(b.volume(), before + 1.5));
    }

    #[test]
    fn test_grow_respects_floor() {
        let mut b = Bubble::new(1.0, 0);
        let size = b.grow(-100.0, 0.3);
        assert!(approx_eq(size, 0.3));
    }

    #[test]
    fn test_grow_with_zero_floor_stays_positive() {
        let mut b = Bubble::new(1.0, 0);
        let size = b.grow(-100.0, 0.0);
        assert!(size > 0.0);
    }

    #[test]
    fn test_radius_is_half_size() {
        let b = Bubble::new(3.0, 0);
        assert!(approx_eq(b.radius(), 1.5));
    }
}
