//! Registry of live bubbles.
//!
//! The [`BubbleRegistry`] is the single source of truth for which bubbles
//! exist and may still interact. Membership changes only when the spawn or
//! lifecycle systems create or destroy a bubble; the cached geometry is
//! refreshed from components at the start of every tick by
//! [`sync_registry_system`](crate::systems::registry::sync_registry_system).
//!
//! Spatial queries are linear scans. Population is capped at a few hundred
//! bubbles, so there is no spatial index.

use bevy_ecs::prelude::{Entity, Resource};
use glam::Vec2;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::components::bubble::BubbleId;
use crate::components::lifecycle::LifecycleState;
use crate::resources::variants::VariantRuleSet;

/// Cached view of one registered bubble.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegisteredBubble {
    pub entity: Entity,
    pub id: BubbleId,
    pub center: Vec2,
    pub radius: f32,
    pub variant: usize,
    pub state: LifecycleState,
    pub invulnerable: bool,
    pub hover_fraction: f32,
}

impl RegisteredBubble {
    /// Distance from `point` to the center in units of this bubble's radius.
    /// Values below 1 are inside the bubble.
    pub fn normalized_distance(&self, point: Vec2) -> f32 {
        let distance = point.distance(self.center);
        if self.radius <= f32::EPSILON {
            return if distance <= f32::EPSILON { 0.0 } else { f32::INFINITY };
        }
        distance / self.radius
    }

    pub fn is_active(&self) -> bool {
        self.state == LifecycleState::Active
    }
}

/// Read-only per-frame view handed to renderers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BubbleSnapshot {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub variant: usize,
    pub hue: f32,
    pub hover_fraction: f32,
}

/// Authoritative list of live bubbles, in registration order.
#[derive(Resource, Debug, Clone, Default)]
pub struct BubbleRegistry {
    entries: Vec<RegisteredBubble>,
    index: FxHashMap<Entity, usize>,
    next_id: u64,
}

impl BubbleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a bubble and hand out its stable id. Registering an entity twice
    /// returns the id it already has.
    pub fn register(&mut self, entity: Entity, center: Vec2, size: f32, variant: usize) -> BubbleId {
        if let Some(&i) = self.index.get(&entity) {
            return self.entries[i].id;
        }
        let id = BubbleId(self.next_id);
        self.next_id += 1;
        self.index.insert(entity, self.entries.len());
        self.entries.push(RegisteredBubble {
            entity,
            id,
            center,
            radius: size * 0.5,
            variant,
            state: LifecycleState::Active,
            invulnerable: false,
            hover_fraction: 0.0,
        });
        id
    }

    /// Remove a bubble. Returns `false` if it was not registered.
    pub fn remove(&mut self, entity: Entity) -> bool {
        let Some(i) = self.index.remove(&entity) else {
            return false;
        };
        // Order-preserving so iteration order stays registration order.
        self.entries.remove(i);
        for entry in &self.entries[i..] {
            if let Some(slot) = self.index.get_mut(&entry.entity) {
                *slot -= 1;
            }
        }
        true
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.index.contains_key(&entity)
    }

    pub fn get(&self, entity: Entity) -> Option<&RegisteredBubble> {
        self.index.get(&entity).map(|&i| &self.entries[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredBubble> {
        self.entries.iter()
    }

    /// Slots left before `max` is reached.
    pub fn remaining_capacity(&self, max: usize) -> usize {
        max.saturating_sub(self.entries.len())
    }

    pub fn is_at_capacity(&self, max: usize) -> bool {
        self.entries.len() >= max
    }

    /// Update cached geometry and state.
    pub fn refresh(&mut self, entity: Entity, center: Vec2, size: f32, update: RegistryUpdate) {
        if let Some(&i) = self.index.get(&entity) {
            let entry = &mut self.entries[i];
            entry.center = center;
            entry.radius = size * 0.5;
            entry.variant = update.variant;
            entry.state = update.state;
            entry.invulnerable = update.invulnerable;
            entry.hover_fraction = update.hover_fraction;
        }
    }

    /// Update only the lifecycle state, used when a transition is accepted
    /// mid-tick.
    pub fn set_state(&mut self, entity: Entity, state: LifecycleState) {
        if let Some(&i) = self.index.get(&entity) {
            self.entries[i].state = state;
        }
    }

    /// Drop every entry whose entity fails `keep`. Returns how many went.
    pub fn retain(&mut self, mut keep: impl FnMut(Entity) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| keep(e.entity));
        if self.entries.len() != before {
            self.index = self
                .entries
                .iter()
                .enumerate()
                .map(|(i, e)| (e.entity, i))
                .collect();
        }
        before - self.entries.len()
    }

    /// The bubble whose center is closest to `point` relative to its own
    /// radius, so a point near the rim of a large bubble and near the rim of
    /// a small one compare equally.
    pub fn nearest_to(&self, point: Vec2) -> Option<&RegisteredBubble> {
        self.entries
            .iter()
            .filter(|e| e.state != LifecycleState::Destroyed)
            .min_by(|a, b| {
                a.normalized_distance(point)
                    .total_cmp(&b.normalized_distance(point))
            })
    }

    /// Bubbles whose disc overlaps the circle of radius `r` around `point`.
    pub fn within_radius(&self, point: Vec2, r: f32) -> Vec<&RegisteredBubble> {
        self.entries
            .iter()
            .filter(|e| e.state != LifecycleState::Destroyed)
            .filter(|e| e.center.distance(point) < r + e.radius)
            .collect()
    }

    /// Live bubbles per variant.
    pub fn live_counts_by_variant(&self) -> FxHashMap<usize, usize> {
        let mut counts = FxHashMap::default();
        for entry in &self.entries {
            *counts.entry(entry.variant).or_insert(0) += 1;
        }
        counts
    }

    pub fn snapshot(&self, variants: &VariantRuleSet) -> Vec<BubbleSnapshot> {
        self.entries
            .iter()
            .map(|e| BubbleSnapshot {
                id: e.id.0,
                x: e.center.x,
                y: e.center.y,
                radius: e.radius,
                variant: e.variant,
                hue: variants.get(e.variant).map(|r| r.hue).unwrap_or(0.0),
                hover_fraction: e.hover_fraction,
            })
            .collect()
    }
}

/// Non-geometric fields refreshed by [`BubbleRegistry::refresh`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegistryUpdate {
    pub variant: usize,
    pub state: LifecycleState,
    pub invulnerable: bool,
    pub hover_fraction: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::world::World;

    fn entities(n: usize) -> Vec<Entity> {
        let mut world = World::new();
        (0..n).map(|_| world.spawn_empty().id()).collect()
    }

    #[test]
    fn test_register_assigns_increasing_ids() {
        let e = entities(2);
        let mut reg = BubbleRegistry::new();
        let a = reg.register(e[0], Vec2::ZERO, 1.0, 0);
        let b = reg.register(e[1], Vec2::ZERO, 1.0, 0);
        assert!(a < b);
        assert_eq!(reg.count(), 2);
    }

    #[test]
    fn test_register_twice_is_idempotent() {
        let e = entities(1);
        let mut reg = BubbleRegistry::new();
        let a = reg.register(e[0], Vec2::ZERO, 1.0, 0);
        let b = reg.register(e[0], Vec2::ONE, 2.0, 1);
        assert_eq!(a, b);
        assert_eq!(reg.count(), 1);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let e = entities(3);
        let mut reg = BubbleRegistry::new();
        for (i, entity) in e.iter().enumerate() {
            reg.register(*entity, Vec2::new(i as f32, 0.0), 1.0, 0);
        }
        assert!(reg.remove(e[1]));
        assert!(!reg.remove(e[1]));
        assert_eq!(reg.count(), 2);
        assert_eq!(reg.get(e[2]).unwrap().center, Vec2::new(2.0, 0.0));
        let order: Vec<Entity> = reg.iter().map(|b| b.entity).collect();
        assert_eq!(order, vec![e[0], e[2]]);
    }

    #[test]
    fn test_nearest_to_uses_normalized_distance() {
        let e = entities(2);
        let mut reg = BubbleRegistry::new();
        // Small bubble: point is 0.9 away, radius 0.5 -> 1.8 radii.
        reg.register(e[0], Vec2::new(0.9, 0.0), 1.0, 0);
        // Large bubble: point is 2.0 away, radius 4.0 -> 0.5 radii.
        reg.register(e[1], Vec2::new(-2.0, 0.0), 8.0, 0);
        let nearest = reg.nearest_to(Vec2::ZERO).unwrap();
        assert_eq!(nearest.entity, e[1]);
        assert!((nearest.normalized_distance(Vec2::ZERO) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_nearest_to_empty() {
        let reg = BubbleRegistry::new();
        assert!(reg.nearest_to(Vec2::ZERO).is_none());
    }

    #[test]
    fn test_within_radius_counts_overlap() {
        let e = entities(3);
        let mut reg = BubbleRegistry::new();
        reg.register(e[0], Vec2::new(1.0, 0.0), 1.0, 0);
        reg.register(e[1], Vec2::new(2.4, 0.0), 1.0, 0);
        reg.register(e[2], Vec2::new(5.0, 0.0), 1.0, 0);
        let hits: Vec<Entity> = reg
            .within_radius(Vec2::ZERO, 2.0)
            .iter()
            .map(|b| b.entity)
            .collect();
        assert_eq!(hits, vec![e[0], e[1]]);
    }

    #[test]
    fn test_capacity() {
        let e = entities(2);
        let mut reg = BubbleRegistry::new();
        reg.register(e[0], Vec2::ZERO, 1.0, 0);
        assert_eq!(reg.remaining_capacity(3), 2);
        assert!(!reg.is_at_capacity(2));
        reg.register(e[1], Vec2::ZERO, 1.0, 0);
        assert!(reg.is_at_capacity(2));
        assert_eq!(reg.remaining_capacity(1), 0);
    }

    #[test]
    fn test_retain_rebuilds_index() {
        let e = entities(3);
        let mut reg = BubbleRegistry::new();
        for entity in &e {
            reg.register(*entity, Vec2::ZERO, 1.0, 0);
        }
        let removed = reg.retain(|entity| entity != e[0]);
        assert_eq!(removed, 1);
        assert!(reg.get(e[2]).is_some());
        assert!(reg.remove(e[2]));
        assert_eq!(reg.count(), 1);
    }

    #[test]
    fn test_snapshot_carries_hue() {
        let e = entities(1);
        let variants = VariantRuleSet::builtin(4);
        let mut reg = BubbleRegistry::new();
        reg.register(e[0], Vec2::new(1.0, 2.0), 3.0, 2);
        let snap = reg.snapshot(&variants);
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].hue, 0.5);
        assert_eq!(snap[0].radius, 1.5);
    }

    #[test]
    fn test_live_counts_by_variant() {
        let e = entities(3);
        let mut reg = BubbleRegistry::new();
        reg.register(e[0], Vec2::ZERO, 1.0, 1);
        reg.register(e[1], Vec2::ZERO, 1.0, 1);
        reg.register(e[2], Vec2::ZERO, 1.0, 3);
        let counts = reg.live_counts_by_variant();
        assert_eq!(counts.get(&1), Some(&2));
        assert_eq!(counts.get(&3), Some(&1));
    }
}
