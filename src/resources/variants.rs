//! Per-variant behaviour rules.
//!
//! Every bubble carries an integer variant id selecting a [`VariantRule`]
//! from the [`VariantRuleSet`] resource. Rules are immutable for the life of
//! a simulation and describe forces, thresholds, growth rates and the
//! pop/merge/split parameters.
//!
//! Lookups are lenient: an unknown id resolves to the fallback rule (the
//! first one) and logs a warning instead of failing, so malformed content
//! degrades gracefully.
//!
//! # File Format
//!
//! A JSON array of rules. Every field is optional and defaults to the values
//! in [`VariantRule::default`]:
//!
//! ```json
//! [
//!   { "name": "red", "hue": 0.0, "pop_matching_variants": true },
//!   { "name": "blue", "hue": 0.6, "matching_interaction": "attract" }
//! ]
//! ```

use bevy_ecs::prelude::Resource;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How two overlapping bubbles push on each other when no pop or merge happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForceMode {
    /// No continuous force.
    None,
    /// Pull together, scaled by how far apart the centers are.
    Attract,
    /// Push apart, scaled by the overlap ratio.
    #[default]
    Repulse,
}

/// Behaviour parameters for one bubble variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantRule {
    pub name: String,

    // Visual identity, only forwarded to renderers.
    pub hue: f32,
    pub saturation: f32,
    pub opacity: f32,
    pub core_size_ratio: f32,

    // Physics
    pub drag: f32,
    pub max_speed: f32,
    pub gravity_factor: f32,
    /// Mass per unit area, sampled per bubble at spawn.
    pub density_range: (f32, f32),
    /// Spawn impulse; the applied magnitude is in `[impulse / 2, impulse]`.
    pub initial_impulse: f32,
    /// Diameter range for freshly spawned bubbles.
    pub size_range: (f32, f32),

    // Continuous forces
    pub matching_interaction: ForceMode,
    pub other_interaction: ForceMode,
    pub attraction_force: f32,
    pub repulsion_force: f32,

    // Pop
    pub pop_on_click: bool,
    pub pop_matching_variants: bool,
    pub pop_matching_neighbors: bool,
    pub pop_other_variants: bool,
    pub min_overlap_to_pop: f32,
    /// Auto-pop once the diameter reaches this value (0 disables).
    pub pop_at_size: f32,
    /// Auto-pop once the diameter falls to this value (0 disables).
    pub pop_below_size: f32,
    pub pop_force: f32,
    pub pop_radius_ratio: f32,
    pub pop_delay: f32,
    pub pop_size_increase: f32,
    /// Delay range in seconds before a chain-reaction pop fires.
    pub neighbor_pop_delay: (f32, f32),

    // Split on pop
    pub pop_split_count: u32,
    pub pop_split_variant: Option<usize>,
    pub pop_split_volume_factor: f32,

    // Merge
    pub merge_matching_variants: bool,
    pub min_overlap_to_merge: f32,
    /// Negative values pull neighbours in after a merge.
    pub merge_force: f32,
    pub merge_radius_ratio: f32,
    pub merge_delay: f32,
    pub merge_size_shrink: f32,
    pub merge_volume_factor: f32,
    pub merged_variant: Option<usize>,

    // Growth, in volume units (per second for the rates)
    pub click_growth: f32,
    pub hold_growth_rate: f32,
    pub hover_growth_rate: f32,
    pub passive_growth_rate: f32,
}

impl Default for VariantRule {
    fn default() -> Self {
        Self {
            name: String::from("default"),
            hue: 0.0,
            saturation: 0.8,
            opacity: 0.9,
            core_size_ratio: 0.6,
            drag: 1.0,
            max_speed: 10.0,
            gravity_factor: 0.0,
            density_range: (1.0, 1.0),
            initial_impulse: 5.0,
            size_range: (1.2, 3.0),
            matching_interaction: ForceMode::Repulse,
            other_interaction: ForceMode::Repulse,
            attraction_force: 5.0,
            repulsion_force: 5.0,
            pop_on_click: true,
            pop_matching_variants: false,
            pop_matching_neighbors: false,
            pop_other_variants: false,
            min_overlap_to_pop: 0.4,
            pop_at_size: 5.0,
            pop_below_size: 0.0,
            pop_force: 10.0,
            pop_radius_ratio: 1.5,
            pop_delay: 0.2,
            pop_size_increase: 1.5,
            neighbor_pop_delay: (0.1, 0.2),
            pop_split_count: 0,
            pop_split_variant: None,
            pop_split_volume_factor: 1.0,
            merge_matching_variants: true,
            min_overlap_to_merge: 0.3,
            merge_force: -8.0,
            merge_radius_ratio: 1.5,
            merge_delay: 0.2,
            merge_size_shrink: 0.7,
            merge_volume_factor: 1.0,
            merged_variant: None,
            click_growth: 0.0,
            hold_growth_rate: 0.0,
            hover_growth_rate: 0.0,
            passive_growth_rate: 0.0,
        }
    }
}

impl VariantRule {
    /// Whether a bubble of the given diameter should pop on its own.
    pub fn should_auto_pop(&self, size: f32) -> bool {
        (self.pop_at_size > 0.0 && size >= self.pop_at_size)
            || (self.pop_below_size > 0.0 && size <= self.pop_below_size)
    }

    /// Force mode toward a bubble of the same or of another variant.
    pub fn interaction(&self, same_variant: bool) -> ForceMode {
        if same_variant {
            self.matching_interaction
        } else {
            self.other_interaction
        }
    }
}

/// Immutable table of variant rules.
#[derive(Resource, Debug, Clone)]
pub struct VariantRuleSet {
    rules: Vec<VariantRule>,
    fallback: VariantRule,
}

impl Default for VariantRuleSet {
    fn default() -> Self {
        Self::builtin(5)
    }
}

impl VariantRuleSet {
    /// Build a rule set. The first rule doubles as the fallback; an empty
    /// list gets [`VariantRule::default`] as its only rule.
    pub fn new(mut rules: Vec<VariantRule>) -> Self {
        if rules.is_empty() {
            rules.push(VariantRule::default());
        }
        let fallback = rules[0].clone();
        Self { rules, fallback }
    }

    /// `count` default variants with evenly spread hues.
    pub fn builtin(count: usize) -> Self {
        let count = count.max(1);
        let rules = (0..count)
            .map(|i| VariantRule {
                name: format!("variant_{i}"),
                hue: i as f32 / count as f32,
                ..VariantRule::default()
            })
            .collect();
        Self::new(rules)
    }

    /// Parse a JSON array of rules.
    pub fn from_json(text: &str) -> Result<Self, String> {
        let rules: Vec<VariantRule> =
            serde_json::from_str(text).map_err(|e| format!("Invalid variant rules: {}", e))?;
        Ok(Self::new(rules))
    }

    /// Load rules from a JSON file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read variant file {:?}: {}", path, e))?;
        let set = Self::from_json(&text)?;
        info!("Loaded {} bubble variants from {:?}", set.len(), path);
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Strict lookup.
    pub fn get(&self, variant: usize) -> Option<&VariantRule> {
        self.rules.get(variant)
    }

    /// Lenient lookup: unknown ids get the fallback rule and a warning.
    pub fn rule_for(&self, variant: usize) -> &VariantRule {
        match self.rules.get(variant) {
            Some(rule) => rule,
            None => {
                warn!(
                    "Unknown bubble variant {} ({} defined), using fallback rule",
                    variant,
                    self.rules.len()
                );
                &self.fallback
            }
        }
    }

    /// Normalise a variant id for a new bubble. Unknown ids map to variant 0.
    pub fn resolve_variant(&self, variant: usize) -> usize {
        if variant < self.rules.len() {
            variant
        } else {
            warn!(
                "Unknown bubble variant {} ({} defined), spawning fallback variant 0",
                variant,
                self.rules.len()
            );
            0
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &VariantRule> {
        self.rules.iter()
    }
}
