//! ECS resources made available to systems.
//!
//! This module groups the long-lived data injected into the ECS world and
//! accessed by systems during execution. Each submodule documents the
//! semantics and intended usage of its resource(s).
//!
//! Overview
//! - `gamerules` – population cap, world size, spawn policy, win condition (INI)
//! - `input` – resolved pointer position and button state
//! - `registry` – authoritative list of live bubbles with spatial queries
//! - `simrng` – seeded random source
//! - `stats` – popped/merged counters, live counts and the win latch
//! - `variants` – per-variant behaviour rules (JSON)
//! - `worldtime` – simulation time and delta
pub mod gamerules;
pub mod input;
pub mod registry;
pub mod simrng;
pub mod stats;
pub mod variants;
pub mod worldtime;
