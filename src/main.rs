//! Bubble engine headless driver.
//!
//! Runs a bubble simulation without a window:
//! - **bevy_ecs** for entity-component-system architecture
//! - **configparser** INI rules and **serde_json** variant rules
//!
//! # Main Loop
//!
//! 1. Load rules from `config.ini` (defaults when missing) and variant
//!    rules from JSON (built-in variants when missing)
//! 2. Build the simulation: walls, initial spawn batch, schedule
//! 3. Step it `--ticks` times with a fixed `--dt`, logging statistics
//! 4. Optionally write the final bubble snapshot as JSON
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --ticks 3000 --seed 7 --snapshot out.json
//! ```

use bubbleengine::resources::gamerules::GameRules;
use bubbleengine::resources::variants::VariantRuleSet;
use bubbleengine::simulation::Simulation;
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;

/// Bubble Engine
#[derive(Parser)]
#[command(version, about = "Headless bubble lifecycle and interaction simulation")]
struct Cli {
    /// INI file with world, spawn, bubble and win rules.
    #[arg(long, value_name = "PATH", default_value = "./config.ini")]
    config: PathBuf,

    /// JSON file with variant rules. Overrides the path in the config file.
    #[arg(long, value_name = "PATH")]
    variants: Option<PathBuf>,

    /// Number of ticks to run.
    #[arg(long, default_value_t = 600)]
    ticks: u32,

    /// Seconds per tick.
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Random seed.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Write the final snapshot as JSON to this path.
    #[arg(long, value_name = "PATH")]
    snapshot: Option<PathBuf>,

    /// Write the effective rules back to the config file and exit.
    #[arg(long)]
    write_config: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut rules = GameRules::with_path(&cli.config);
    if let Err(e) = rules.load_from_file() {
        warn!("{}; using default rules", e);
    }

    if cli.write_config {
        if let Err(e) = rules.save_to_file() {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
        println!("Rules written to {}", rules.config_path.display());
        return;
    }

    let variants_path = cli.variants.clone().or_else(|| rules.variants_path.clone());
    let variants = match variants_path {
        Some(path) => VariantRuleSet::load_from_file(&path).unwrap_or_else(|e| {
            warn!("{}; using {} built-in variants", e, rules.variant_count);
            VariantRuleSet::builtin(rules.variant_count)
        }),
        None => VariantRuleSet::builtin(rules.variant_count),
    };

    let mut sim = Simulation::new(rules, variants, cli.seed);
    let report_every = (1.0 / cli.dt.max(1e-4)).round().max(1.0) as u32;

    for tick in 1..=cli.ticks {
        sim.step(cli.dt);
        // Nobody listens to lifecycle events headless.
        sim.drain_events();

        if tick % report_every == 0 {
            let stats = sim.stats();
            info!(
                "t={:.1}s bubbles={} popped={} merges={} splits={}",
                sim.elapsed(),
                stats.live_total,
                stats.bubbles_popped,
                stats.merges,
                stats.splits_spawned
            );
        }
    }

    let stats = sim.stats();
    info!(
        "Finished {} ticks: {} bubbles alive, {} popped, {} merges{}",
        cli.ticks,
        sim.registry().count(),
        stats.bubbles_popped,
        stats.merges,
        if stats.has_won { ", level won" } else { "" }
    );

    if let Some(path) = cli.snapshot {
        let json = match serde_json::to_string_pretty(&sim.snapshot()) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("Error serializing snapshot: {e}");
                std::process::exit(1);
            }
        };
        if let Err(e) = std::fs::write(&path, json) {
            eprintln!("Error writing {}: {e}", path.display());
            std::process::exit(1);
        }
        println!("Snapshot written to {}", path.display());
    }
}
