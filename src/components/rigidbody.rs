//! Dynamic body component: the engine's side of the physics boundary.
//!
//! The lifecycle and interaction systems never set velocity directly. They
//! accumulate continuous forces with [`RigidBody::apply_force`] and
//! instantaneous impulses with [`RigidBody::apply_impulse`]; whatever
//! integrates the body (the reference
//! [`integrate_bodies`](crate::systems::physics::integrate_bodies) system or
//! an external physics engine) consumes and clears them each tick.
//!
//! Mass is not configured directly. It is derived from the bubble's area as
//! `density * area^0.8`, so larger bubbles are disproportionately heavier.

use bevy_ecs::prelude::Component;
use glam::Vec2;

/// Exponent applied to the disc area when deriving mass.
pub const MASS_AREA_EXPONENT: f32 = 0.8;

/// Mass of a disc of the given area.
pub fn mass_from_area(density: f32, area: f32) -> f32 {
    density * area.max(0.0).powf(MASS_AREA_EXPONENT)
}

/// Kinematic state plus pending force/impulse requests.
///
/// # Fields
/// - `velocity` - Current velocity in world units per second
/// - `force` - Continuous force accumulated this tick
/// - `impulse` - Instantaneous impulse accumulated this tick
/// - `drag` - Velocity damping factor, applied as `velocity *= 1 - drag * dt`
/// - `max_speed` - Optional speed clamp
/// - `gravity_factor` - Multiplier on world gravity
/// - `density` - Mass per unit area
/// - `mass` - Derived mass, refreshed every tick
/// - `frozen` - When true, integration skips this body
#[derive(Component, Clone, Debug, PartialEq)]
pub struct RigidBody {
    pub velocity: Vec2,
    pub force: Vec2,
    pub impulse: Vec2,
    pub drag: f32,
    pub max_speed: Option<f32>,
    pub gravity_factor: f32,
    pub density: f32,
    pub mass: f32,
    pub frozen: bool,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self::new()
    }
}

impl RigidBody {
    /// A body with unit density and mass at rest.
    pub fn new() -> Self {
        Self {
            velocity: Vec2::ZERO,
            force: Vec2::ZERO,
            impulse: Vec2::ZERO,
            drag: 0.0,
            max_speed: None,
            gravity_factor: 0.0,
            density: 1.0,
            mass: 1.0,
            frozen: false,
        }
    }

    /// Create a body with physics parameters configured.
    ///
    /// # Arguments
    /// * `drag` - Velocity damping (0.0 = none, ~1.0 = floaty, ~10.0 = heavy)
    /// * `max_speed` - Optional velocity magnitude limit
    pub fn with_physics(drag: f32, max_speed: Option<f32>) -> Self {
        Self {
            drag,
            max_speed,
            ..Self::new()
        }
    }

    pub fn with_gravity_factor(mut self, gravity_factor: f32) -> Self {
        self.gravity_factor = gravity_factor;
        self
    }

    pub fn with_density(mut self, density: f32) -> Self {
        self.density = density.max(f32::EPSILON);
        self
    }

    /// Accumulate a continuous force for this tick.
    pub fn apply_force(&mut self, force: Vec2) {
        self.force += force;
    }

    /// Accumulate an instantaneous impulse for this tick.
    pub fn apply_impulse(&mut self, impulse: Vec2) {
        self.impulse += impulse;
    }

    /// Recompute mass from the current disc area.
    pub fn update_mass(&mut self, area: f32) {
        self.mass = mass_from_area(self.density, area).max(f32::EPSILON);
    }

    /// Clamp velocity magnitude to `max_speed`, if set.
    pub fn clamp_speed(&mut self) {
        if let Some(max) = self.max_speed {
            self.velocity = self.velocity.clamp_length_max(max.max(0.0));
        }
    }

    /// Consume the accumulated force and impulse into velocity.
    ///
    /// Returns the resulting displacement for `dt`.
    pub fn integrate(&mut self, gravity: Vec2, dt: f32) -> Vec2 {
        let acceleration = self.force / self.mass + gravity * self.gravity_factor;
        self.velocity += self.impulse / self.mass + acceleration * dt;
        self.velocity *= (1.0 - self.drag * dt).max(0.0);
        self.clamp_speed();
        self.force = Vec2::ZERO;
        self.impulse = Vec2::ZERO;
        self.velocity * dt
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn unfreeze(&mut self) {
        self.frozen = false;
    }
}
