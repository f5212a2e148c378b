//! Axis-aligned box collider used for static walls.
//!
//! Bubbles are circles and derive their collision shape from
//! [`Bubble::size`](super::bubble::Bubble::size); only the static boundary
//! regions carry a `BoxCollider`. The circle queries here feed the
//! boundary-contact response and the spawn placement check.

use bevy_ecs::prelude::Component;
use glam::Vec2;

/// Marker for static boundary entities. They never move and never receive
/// forces.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Wall;

#[derive(Debug, Clone, Copy, PartialEq, Component)]
pub struct BoxCollider {
    pub size: Vec2,
    pub offset: Vec2,
}

/// Penetration of a circle into a box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CirclePenetration {
    /// Unit vector pushing the circle out of the box.
    pub normal: Vec2,
    /// How far the circle reaches into the box along `normal`.
    pub depth: f32,
}

impl BoxCollider {
    /// Create a BoxCollider with given size.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Vec2::new(width, height),
            offset: Vec2::ZERO,
        }
    }

    /// Box of the given size centered on the entity position.
    pub fn centered(width: f32, height: f32) -> Self {
        Self::new(width, height).with_offset(Vec2::new(-width * 0.5, -height * 0.5))
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    /// Returns (min, max) of the collider AABB for a given entity position.
    /// Handles negative size by normalizing to proper min/max.
    pub fn aabb(&self, position: Vec2) -> (Vec2, Vec2) {
        let p0 = position + self.offset;
        let p1 = p0 + self.size;
        (p0.min(p1), p0.max(p1))
    }

    /// Point containment in world space.
    pub fn contains_point(&self, position: Vec2, point: Vec2) -> bool {
        let (min, max) = self.aabb(position);
        point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
    }

    /// Nearest point of the box (surface or interior) to `point`.
    pub fn closest_point(&self, position: Vec2, point: Vec2) -> Vec2 {
        let (min, max) = self.aabb(position);
        point.clamp(min, max)
    }

    /// How a circle penetrates the box, if at all.
    ///
    /// Outside the box the push direction runs from the nearest surface
    /// point to the center. A center inside the box is pushed out through
    /// the closest face.
    pub fn circle_penetration(
        &self,
        position: Vec2,
        center: Vec2,
        radius: f32,
    ) -> Option<CirclePenetration> {
        let (min, max) = self.aabb(position);
        let closest = center.clamp(min, max);
        let delta = center - closest;
        let distance = delta.length();

        if distance > f32::EPSILON {
            if distance >= radius {
                return None;
            }
            return Some(CirclePenetration {
                normal: delta / distance,
                depth: radius - distance,
            });
        }

        // Center inside: leave through the nearest face.
        let faces = [
            (center.x - min.x, Vec2::NEG_X),
            (max.x - center.x, Vec2::X),
            (center.y - min.y, Vec2::NEG_Y),
            (max.y - center.y, Vec2::Y),
        ];
        let (inside, normal) = faces
            .iter()
            .copied()
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .unwrap_or((0.0, Vec2::Y));
        Some(CirclePenetration {
            normal,
            depth: radius + inside,
        })
    }

    pub fn overlaps_circle(&self, position: Vec2, center: Vec2, radius: f32) -> bool {
        self.circle_penetration(position, center, radius).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_aabb_normalizes_negative_size() {
        let c = BoxCollider::new(-2.0, -4.0);
        let (min, max) = c.aabb(Vec2::ZERO);
        assert_eq!(min, Vec2::new(-2.0, -4.0));
        assert_eq!(max, Vec2::ZERO);
    }

    #[test]
    fn test_centered_box() {
        let c = BoxCollider::centered(4.0, 2.0);
        let (min, max) = c.aabb(Vec2::new(10.0, 10.0));
        assert_eq!(min, Vec2::new(8.0, 9.0));
        assert_eq!(max, Vec2::new(12.0, 11.0));
        assert!(c.contains_point(Vec2::new(10.0, 10.0), Vec2::new(11.0, 10.5)));
    }

    #[test]
    fn test_circle_outside_no_penetration() {
        let c = BoxCollider::centered(2.0, 2.0);
        assert!(c.circle_penetration(Vec2::ZERO, Vec2::new(3.0, 0.0), 1.0).is_none());
    }

    #[test]
    fn test_circle_touching_face() {
        let c = BoxCollider::centered(2.0, 2.0);
        let p = c
            .circle_penetration(Vec2::ZERO, Vec2::new(1.5, 0.0), 1.0)
            .unwrap();
        assert!(approx_eq(p.depth, 0.5));
        assert!(approx_eq(p.normal.x, 1.0));
        assert!(approx_eq(p.normal.y, 0.0));
    }

    #[test]
    fn test_circle_center_inside() {
        let c = BoxCollider::centered(2.0, 2.0);
        let p = c
            .circle_penetration(Vec2::ZERO, Vec2::new(0.0, 0.8), 0.5)
            .unwrap();
        assert_eq!(p.normal, Vec2::Y);
        assert!(approx_eq(p.depth, 0.7));
    }

    #[test]
    fn test_closest_point() {
        let c = BoxCollider::centered(2.0, 2.0);
        let p = c.closest_point(Vec2::ZERO, Vec2::new(5.0, 0.5));
        assert_eq!(p, Vec2::new(1.0, 0.5));
    }
}
