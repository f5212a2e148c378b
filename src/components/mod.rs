//! ECS components for entities.
//!
//! This module groups all component types that can be attached to entities in
//! the simulation. Bubbles carry a [`bubble::Bubble`], a
//! [`lifecycle::Lifecycle`], a [`pointer::PointerState`], a
//! [`mapposition::MapPosition`] and a [`rigidbody::RigidBody`]; walls carry a
//! [`boxcollider::BoxCollider`] and the [`boxcollider::Wall`] marker.
//!
//! Submodules overview:
//! - [`boxcollider`] – axis-aligned box collider and circle penetration queries
//! - [`bubble`] – bubble size, variant and the 2D volume model
//! - [`lifecycle`] – pop/merge state machine, size tweens and chain-pop countdown
//! - [`mapposition`] – world-space position of an entity
//! - [`pointer`] – hover, hold and click flags with the smoothed hover fraction
//! - [`rigidbody`] – velocity, accumulated forces and impulses, derived mass

pub mod boxcollider;
pub mod bubble;
pub mod lifecycle;
pub mod mapposition;
pub mod pointer;
pub mod rigidbody;
