//! Simulation-wide rules resource.
//!
//! Population cap, world bounds, spawning policy and win condition, loaded
//! from an INI file. Per-variant behaviour lives in
//! [`VariantRuleSet`](crate::resources::variants::VariantRuleSet) instead.
//!
//! # Configuration File Format
//!
//! ```ini
//! [world]
//! max_bubbles = 100
//! width = 20
//! height = 12
//! gravity_y = 0
//! wall_thickness = 1
//!
//! [spawn]
//! interval = 0.1
//! initial_count = 5
//! min_variant = 0
//! variant_count = 5
//! pop_random_to_spawn = false
//!
//! [bubbles]
//! min_size = 0.3
//! hover_transition = 0.5
//! variants = ./assets/variants.json
//!
//! [win]
//! condition = bubbles_popped
//! target = 50
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use glam::Vec2;
use log::{info, warn};
use std::path::PathBuf;

/// Default safe values for startup
const DEFAULT_MAX_BUBBLES: usize = 100;
const DEFAULT_WORLD_WIDTH: f32 = 20.0;
const DEFAULT_WORLD_HEIGHT: f32 = 12.0;
const DEFAULT_WALL_THICKNESS: f32 = 1.0;
const DEFAULT_SPAWN_INTERVAL: f32 = 0.1;
const DEFAULT_INITIAL_SPAWN_COUNT: usize = 5;
const DEFAULT_VARIANT_COUNT: usize = 5;
const DEFAULT_MIN_BUBBLE_SIZE: f32 = 0.3;
const DEFAULT_HOVER_TRANSITION: f32 = 0.5;
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

/// Random positions tried per spawn before giving up for this cycle.
pub const SPAWN_ATTEMPTS: usize = 5;

/// What the level counts as a win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WinCondition {
    #[default]
    None,
    /// Total popped bubbles reaches the target.
    BubblesPopped,
    /// Live bubbles at or above the target.
    MinBubblesLeft,
    /// Live bubbles at or below the target.
    MaxBubblesLeft,
}

impl WinCondition {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "none" => Some(Self::None),
            "bubbles_popped" => Some(Self::BubblesPopped),
            "min_bubbles_left" => Some(Self::MinBubblesLeft),
            "max_bubbles_left" => Some(Self::MaxBubblesLeft),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::BubblesPopped => "bubbles_popped",
            Self::MinBubblesLeft => "min_bubbles_left",
            Self::MaxBubblesLeft => "max_bubbles_left",
        }
    }
}

/// Simulation rules resource.
#[derive(Resource, Debug, Clone)]
pub struct GameRules {
    /// Population cap enforced after every tick.
    pub max_bubbles: usize,
    /// World rectangle, centered on the origin.
    pub world_size: Vec2,
    /// Acceleration scaled by each variant's gravity factor.
    pub gravity: Vec2,
    /// Thickness of the walls placed around the world rectangle.
    pub wall_thickness: f32,
    /// Seconds between timed spawns; 0 disables timed spawning.
    pub spawn_interval: f32,
    pub initial_spawn_count: usize,
    /// Random spawns pick variants in `[min_variant_id, variant_count)`.
    pub min_variant_id: usize,
    pub variant_count: usize,
    /// Pop a random bubble when a spawn finds the world full.
    pub pop_random_to_spawn: bool,
    /// Growth never shrinks a bubble below this diameter.
    pub min_bubble_size: f32,
    /// Seconds for the hover fraction to go from 0 to 1.
    pub hover_transition_time: f32,
    pub win_condition: WinCondition,
    pub target_bubble_count: usize,
    /// Variant rules JSON, if any.
    pub variants_path: Option<PathBuf>,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for GameRules {
    fn default() -> Self {
        Self::new()
    }
}

impl GameRules {
    /// Create rules with safe default values.
    pub fn new() -> Self {
        Self {
            max_bubbles: DEFAULT_MAX_BUBBLES,
            world_size: Vec2::new(DEFAULT_WORLD_WIDTH, DEFAULT_WORLD_HEIGHT),
            gravity: Vec2::ZERO,
            wall_thickness: DEFAULT_WALL_THICKNESS,
            spawn_interval: DEFAULT_SPAWN_INTERVAL,
            initial_spawn_count: DEFAULT_INITIAL_SPAWN_COUNT,
            min_variant_id: 0,
            variant_count: DEFAULT_VARIANT_COUNT,
            pop_random_to_spawn: false,
            min_bubble_size: DEFAULT_MIN_BUBBLE_SIZE,
            hover_transition_time: DEFAULT_HOVER_TRANSITION,
            win_condition: WinCondition::None,
            target_bubble_count: 0,
            variants_path: None,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create rules bound to a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Half extents of the world rectangle.
    pub fn half_extents(&self) -> Vec2 {
        self.world_size * 0.5
    }

    /// Load rules from the INI file.
    ///
    /// Missing values retain their current (default) values.
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;

        // [world] section
        if let Some(max) = config.getuint("world", "max_bubbles").ok().flatten() {
            self.max_bubbles = max as usize;
        }
        if let Some(width) = config.getfloat("world", "width").ok().flatten() {
            self.world_size.x = width as f32;
        }
        if let Some(height) = config.getfloat("world", "height").ok().flatten() {
            self.world_size.y = height as f32;
        }
        if let Some(gx) = config.getfloat("world", "gravity_x").ok().flatten() {
            self.gravity.x = gx as f32;
        }
        if let Some(gy) = config.getfloat("world", "gravity_y").ok().flatten() {
            self.gravity.y = gy as f32;
        }
        if let Some(thickness) = config.getfloat("world", "wall_thickness").ok().flatten() {
            self.wall_thickness = thickness as f32;
        }

        // [spawn] section
        if let Some(interval) = config.getfloat("spawn", "interval").ok().flatten() {
            self.spawn_interval = interval as f32;
        }
        if let Some(count) = config.getuint("spawn", "initial_count").ok().flatten() {
            self.initial_spawn_count = count as usize;
        }
        if let Some(min) = config.getuint("spawn", "min_variant").ok().flatten() {
            self.min_variant_id = min as usize;
        }
        if let Some(count) = config.getuint("spawn", "variant_count").ok().flatten() {
            self.variant_count = count as usize;
        }
        if let Some(evict) = config.getbool("spawn", "pop_random_to_spawn").ok().flatten() {
            self.pop_random_to_spawn = evict;
        }

        // [bubbles] section
        if let Some(min_size) = config.getfloat("bubbles", "min_size").ok().flatten() {
            self.min_bubble_size = min_size as f32;
        }
        if let Some(hover) = config.getfloat("bubbles", "hover_transition").ok().flatten() {
            self.hover_transition_time = hover as f32;
        }
        if let Some(path) = config.get("bubbles", "variants") {
            self.variants_path = Some(PathBuf::from(path));
        }

        // [win] section
        if let Some(condition) = config.get("win", "condition") {
            match WinCondition::parse(&condition) {
                Some(c) => self.win_condition = c,
                None => warn!("Unknown win condition '{}', keeping {:?}", condition, self.win_condition),
            }
        }
        if let Some(target) = config.getuint("win", "target").ok().flatten() {
            self.target_bubble_count = target as usize;
        }

        info!(
            "Loaded rules: max_bubbles={}, world={}x{}, spawn_interval={}, initial={}, variants=[{}, {}), win={:?}/{}",
            self.max_bubbles,
            self.world_size.x,
            self.world_size.y,
            self.spawn_interval,
            self.initial_spawn_count,
            self.min_variant_id,
            self.variant_count,
            self.win_condition,
            self.target_bubble_count
        );

        Ok(())
    }

    /// Save rules to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        config.set("world", "max_bubbles", Some(self.max_bubbles.to_string()));
        config.set("world", "width", Some(self.world_size.x.to_string()));
        config.set("world", "height", Some(self.world_size.y.to_string()));
        config.set("world", "gravity_x", Some(self.gravity.x.to_string()));
        config.set("world", "gravity_y", Some(self.gravity.y.to_string()));
        config.set("world", "wall_thickness", Some(self.wall_thickness.to_string()));

        config.set("spawn", "interval", Some(self.spawn_interval.to_string()));
        config.set("spawn", "initial_count", Some(self.initial_spawn_count.to_string()));
        config.set("spawn", "min_variant", Some(self.min_variant_id.to_string()));
        config.set("spawn", "variant_count", Some(self.variant_count.to_string()));
        config.set(
            "spawn",
            "pop_random_to_spawn",
            Some(self.pop_random_to_spawn.to_string()),
        );

        config.set("bubbles", "min_size", Some(self.min_bubble_size.to_string()));
        config.set(
            "bubbles",
            "hover_transition",
            Some(self.hover_transition_time.to_string()),
        );
        if let Some(path) = &self.variants_path {
            config.set("bubbles", "variants", Some(path.display().to_string()));
        }

        config.set("win", "condition", Some(self.win_condition.as_str().to_string()));
        config.set("win", "target", Some(self.target_bubble_count.to_string()));

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved rules to {:?}", self.config_path);

        Ok(())
    }
}
