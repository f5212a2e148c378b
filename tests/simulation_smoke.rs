//! Whole-simulation runs with the reference physics.

use glam::Vec2;

use bubbleengine::components::bubble::Bubble;
use bubbleengine::components::mapposition::MapPosition;
use bubbleengine::resources::gamerules::{GameRules, WinCondition};
use bubbleengine::resources::variants::{ForceMode, VariantRule, VariantRuleSet};
use bubbleengine::simulation::Simulation;

const DT: f32 = 1.0 / 60.0;

fn check_invariants(sim: &mut Simulation) {
    let max = sim.rules().max_bubbles;
    let half = sim.rules().half_extents();
    assert!(sim.registry().count() <= max);

    let world = sim.world_mut();
    let mut query = world.query::<(&Bubble, &MapPosition)>();
    for (bubble, position) in query.iter(world) {
        assert!(bubble.size() > 0.0);
        assert!(bubble.size().is_finite());
        assert!(position.pos.is_finite());
        assert!(position.pos.x.abs() <= half.x + 1e-3);
        assert!(position.pos.y.abs() <= half.y + 1e-3);
    }
}

#[test]
fn builtin_variants_run_within_bounds() {
    let mut sim = Simulation::new(GameRules::new(), VariantRuleSet::builtin(5), 42);
    for _ in 0..600 {
        sim.step(DT);
        sim.drain_events();
        check_invariants(&mut sim);
    }
    assert!(sim.registry().count() > 0);
    assert!((sim.elapsed() - 10.0).abs() < 0.01);
}

#[test]
fn same_seed_gives_same_run() {
    let run = |seed: u64| {
        let mut sim = Simulation::new(GameRules::new(), VariantRuleSet::builtin(3), seed);
        for _ in 0..240 {
            sim.step(DT);
        }
        (sim.snapshot(), sim.stats().bubbles_popped, sim.stats().merges)
    };
    assert_eq!(run(7), run(7));
}

#[test]
fn aggressive_variants_stay_under_cap() {
    let splitter = VariantRule {
        name: "splitter".into(),
        pop_other_variants: true,
        min_overlap_to_pop: 0.1,
        pop_split_count: 4,
        pop_split_variant: Some(1),
        pop_delay: 0.05,
        passive_growth_rate: 2.0,
        pop_at_size: 2.5,
        size_range: (1.0, 2.0),
        ..VariantRule::default()
    };
    let merger = VariantRule {
        name: "merger".into(),
        matching_interaction: ForceMode::Attract,
        merge_matching_variants: true,
        min_overlap_to_merge: 0.05,
        merge_delay: 0.05,
        pop_matching_neighbors: true,
        neighbor_pop_delay: (0.0, 0.05),
        size_range: (0.8, 1.6),
        ..VariantRule::default()
    };
    let rules = GameRules {
        max_bubbles: 10,
        world_size: Vec2::new(8.0, 8.0),
        spawn_interval: 0.05,
        initial_spawn_count: 10,
        variant_count: 2,
        pop_random_to_spawn: true,
        ..GameRules::new()
    };
    let mut sim = Simulation::new(rules, VariantRuleSet::new(vec![splitter, merger]), 3);
    for _ in 0..900 {
        sim.step(DT);
        sim.drain_events();
        check_invariants(&mut sim);
    }
    assert!(sim.stats().bubbles_popped > 0);
}

#[test]
fn win_latches_once() {
    let rules = GameRules {
        spawn_interval: 0.0,
        initial_spawn_count: 0,
        win_condition: WinCondition::BubblesPopped,
        target_bubble_count: 1,
        ..GameRules::new()
    };
    let mut sim = Simulation::new(rules, VariantRuleSet::builtin(1), 1);
    let a = sim.place_bubble(Vec2::ZERO, 2.0, 0).unwrap();
    sim.request_pop(a);

    // Warm-up keeps the win from firing at once.
    sim.step(DT);
    assert_eq!(sim.stats().bubbles_popped, 1);
    assert!(!sim.stats().has_won);

    for _ in 0..60 {
        sim.step(DT);
    }
    assert!(sim.stats().has_won);
    let final_time = sim.stats().final_time;
    assert!(final_time.is_some());

    sim.place_bubble(Vec2::new(3.0, 0.0), 2.0, 0).unwrap();
    for _ in 0..30 {
        sim.step(DT);
    }
    assert!(sim.stats().has_won);
    assert_eq!(sim.stats().final_time, final_time);
    // The level clock stops at the win while world time runs on.
    assert_eq!(Some(sim.stats().elapsed), final_time);
    assert!(sim.elapsed() > sim.stats().elapsed + 0.4);
}

#[test]
fn max_bubbles_left_needs_warmup() {
    let rules = GameRules {
        spawn_interval: 0.0,
        initial_spawn_count: 0,
        win_condition: WinCondition::MaxBubblesLeft,
        target_bubble_count: 0,
        ..GameRules::new()
    };
    let mut sim = Simulation::new(rules, VariantRuleSet::builtin(1), 1);
    sim.step(DT);
    assert!(!sim.stats().has_won);
    for _ in 0..40 {
        sim.step(DT);
    }
    assert!(sim.stats().has_won);
}

#[test]
fn snapshot_serializes_to_json() {
    let mut sim = Simulation::new(GameRules::new(), VariantRuleSet::builtin(2), 11);
    for _ in 0..10 {
        sim.step(DT);
    }
    let snapshot = sim.snapshot();
    assert_eq!(snapshot.len(), sim.registry().count());

    let json = serde_json::to_value(&snapshot).unwrap();
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), snapshot.len());
    for entry in entries {
        assert!(entry.get("radius").and_then(|r| r.as_f64()).unwrap() > 0.0);
        assert!(entry.get("variant").is_some());
    }

    let stats = serde_json::to_value(sim.stats()).unwrap();
    assert!(stats.get("bubbles_popped").is_some());
}

#[test]
fn simulations_are_independent() {
    let mut a = Simulation::new(GameRules::new(), VariantRuleSet::builtin(2), 1);
    let mut b = Simulation::new(
        GameRules {
            initial_spawn_count: 0,
            spawn_interval: 0.0,
            ..GameRules::new()
        },
        VariantRuleSet::builtin(2),
        1,
    );
    for _ in 0..30 {
        a.step(DT);
        b.step(DT);
    }
    assert!(a.registry().count() > 0);
    assert_eq!(b.registry().count(), 0);
}
