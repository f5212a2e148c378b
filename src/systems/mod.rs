//! Engine systems.
//!
//! This module groups all ECS systems that advance the simulation. See
//! [`build_schedule`](crate::simulation::build_schedule) for the order they
//! run in.
//!
//! Submodules overview
//! - [`growth`] – volume growth from pointer flags and passive rate, auto-pop
//! - [`interaction`] – pairwise pop/merge/force decisions and wall pushback
//! - [`lifecycle`] – request application, pop/split and merge sequences, chain pops
//! - [`physics`] – reference contact detection and body integration
//! - [`pointer`] – hover tracking, click and hold
//! - [`queues`] – message double-buffer rotation
//! - [`registry`] – refresh the bubble registry from components
//! - [`spawn`] – timed and requested spawning under the population cap
//! - [`stats`] – live counts and win evaluation
//! - [`time`] – update simulation time and delta

pub mod growth;
pub mod interaction;
pub mod lifecycle;
pub mod physics;
pub mod pointer;
pub mod queues;
pub mod registry;
pub mod spawn;
pub mod stats;
pub mod time;
