//! Integration tests for headless scenario execution
//!
//! These tests verify that:
//! - Headless scenarios run to completion
//! - Scenario results are accessible programmatically
//! - Seeded RNG produces deterministic results
//! - Each outcome is reachable

use std::path::{Path, PathBuf};

use isocombat::headless::config::{HeroAttackConfig, SpawnConfig};
use isocombat::headless::{run_scenario, ScenarioConfig, ScenarioOutcome};
use isocombat::sim::components::PowerId;

const ROOM: [&str; 5] = [
    "##########",
    "#........#",
    "#........#",
    "#........#",
    "##########",
];

fn spawn(template: impl Into<String>, tile: [i32; 2]) -> SpawnConfig {
    SpawnConfig {
        template: template.into(),
        tile,
    }
}

/// Hero on the left of the room, one goblin in the middle
fn create_config(seed: Option<u64>) -> ScenarioConfig {
    ScenarioConfig {
        name: "Test".to_string(),
        map: ROOM.iter().map(|row| row.to_string()).collect(),
        hero: spawn("assets/creatures/hero.txt", [1, 2]),
        enemies: vec![spawn("assets/creatures/goblin.txt", [5, 2])],
        hero_attack: Some(HeroAttackConfig {
            power: PowerId::new("hero_slash"),
            interval: 10,
        }),
        max_ticks: 900,
        random_seed: seed,
        output_path: None,
        powers_path: "assets/config/powers.ron".to_string(),
    }
}

/// Write a template built from a shipped one with some keys overridden.
///
/// Later keys win, so the overrides are simply appended.
fn derived_template(base: &str, overrides: &str, file_name: &str) -> PathBuf {
    let contents = std::fs::read_to_string(base).expect("base template should exist");
    let dir = std::env::temp_dir().join(format!("isocombat-headless-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("temp dir should be writable");

    let path = dir.join(file_name);
    std::fs::write(&path, format!("{}\n{}\n", contents, overrides))
        .expect("template should be writable");
    path
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

// =============================================================================
// Outcome Tests
// =============================================================================

#[test]
fn test_goblin_ambush_is_won() {
    let config = ScenarioConfig::load_from_file(Path::new("scenarios/goblin_ambush.json"))
        .expect("bundled scenario should load");

    let result = run_scenario(&config, false).expect("scenario should run");

    assert_eq!(result.outcome, ScenarioOutcome::Victory);
    assert_eq!(result.name, "Goblin ambush");
    assert_eq!(result.random_seed, Some(42));
    assert!(result.ticks < config.max_ticks);
    assert!(result.hero_hp > 0);
    assert_eq!(result.hero_maxhp, 100);

    assert_eq!(result.enemies.len(), 1);
    let goblin = &result.enemies[0];
    assert!(!goblin.alive);
    assert_eq!(goblin.hp, 0);
    assert_eq!(goblin.xp, Some(14));
    assert_eq!(result.xp_earned, 14, "Experience comes from the goblin's template");
}

#[test]
fn test_no_hero_attack_times_out() {
    let config = ScenarioConfig {
        hero_attack: None,
        max_ticks: 60,
        ..create_config(Some(3))
    };

    let result = run_scenario(&config, false).expect("scenario should run");

    assert_eq!(result.outcome, ScenarioOutcome::Timeout);
    assert_eq!(result.ticks, 60);
    assert!(result.enemies[0].alive);
    assert_eq!(result.xp_earned, 0);
}

#[test]
fn test_frail_hero_is_defeated() {
    let hero = derived_template(
        "assets/creatures/hero.txt",
        "hp=5\navoidance=0\nabsorb_min=0\nabsorb_max=0",
        "frail_hero.txt",
    );
    let brute = derived_template(
        "assets/creatures/goblin.txt",
        "name=Brute\naccuracy=100\ndmg_melee_min=50\ndmg_melee_max=50\nchance_melee_phys=100",
        "brute.txt",
    );

    let config = ScenarioConfig {
        hero: spawn(path_string(&hero), [1, 2]),
        enemies: vec![spawn(path_string(&brute), [4, 2])],
        hero_attack: None,
        ..create_config(Some(11))
    };

    let result = run_scenario(&config, false).expect("scenario should run");

    assert_eq!(result.outcome, ScenarioOutcome::Defeat);
    assert_eq!(result.hero_hp, 0);
    assert_eq!(result.hero_maxhp, 5);
    assert!(result.enemies[0].alive);
}

// =============================================================================
// Determinism Tests
// =============================================================================

#[test]
fn test_same_seed_same_result() {
    let first = run_scenario(&create_config(Some(99)), false).expect("scenario should run");
    let second = run_scenario(&create_config(Some(99)), false).expect("scenario should run");

    assert_eq!(first.outcome, second.outcome);
    assert_eq!(first.ticks, second.ticks);
    assert_eq!(first.hero_hp, second.hero_hp);
    assert_eq!(first.loot_drops, second.loot_drops);
}

#[test]
fn test_unseeded_run_reports_no_seed() {
    let result = run_scenario(&create_config(None), false).expect("scenario should run");

    assert!(result.random_seed.is_none());
    assert!(result.ticks > 0);
}

// =============================================================================
// Setup Errors
// =============================================================================

#[test]
fn test_missing_template_is_an_error() {
    let config = ScenarioConfig {
        enemies: vec![spawn("assets/creatures/dragon.txt", [5, 2])],
        ..create_config(Some(1))
    };

    let err = run_scenario(&config, false).unwrap_err();
    assert!(err.contains("dragon.txt"), "Unexpected error: {}", err);
}

#[test]
fn test_missing_powers_file_is_an_error() {
    let config = ScenarioConfig {
        powers_path: "assets/config/nope.ron".to_string(),
        ..create_config(Some(1))
    };

    assert!(run_scenario(&config, false).is_err());
}

#[test]
fn test_saves_combat_log_when_asked() {
    let dir = std::env::temp_dir().join(format!("isocombat-log-{}", std::process::id()));
    let path = dir.join("ambush.json");
    let config = ScenarioConfig {
        output_path: Some(path_string(&path)),
        ..create_config(Some(42))
    };

    run_scenario(&config, false).expect("scenario should run");

    let saved = std::fs::read_to_string(&path).expect("log should be written");
    let json: serde_json::Value = serde_json::from_str(&saved).expect("log should be JSON");
    assert_eq!(json["metadata"]["name"], "Test");
    assert!(json["entries"].as_array().is_some_and(|entries| !entries.is_empty()));
}
