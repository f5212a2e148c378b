//! Bubble engine library.
//!
//! This module exposes the engine's ECS components, resources, systems, and
//! messages for use in integration tests and as a reusable library. Most
//! hosts only need [`simulation::Simulation`].

pub mod components;
pub mod events;
pub mod resources;
pub mod simulation;
pub mod systems;
