//! Tests for combat log queries and message formats
//!
//! These tests verify that the CombatLog correctly:
//! - Filters, counts and windows entries by type
//! - Saves entries and metadata as JSON
//! - Records a scenario with consistently formatted messages

use std::path::Path;

use regex::Regex;

use isocombat::combat::log::{CombatLog, CombatLogEventType};
use isocombat::headless::runner::{build_scenario_app, run_scenario_app};
use isocombat::headless::ScenarioConfig;

fn create_test_log() -> CombatLog {
    let mut log = CombatLog::default();
    log.tick = 3;
    log.log(CombatLogEventType::Awareness, "Goblin engages".to_string());
    log.tick = 9;
    log.log(CombatLogEventType::Damage, "Goblin takes 7 damage".to_string());
    log.log(CombatLogEventType::Miss, "Hero evades an attack".to_string());
    log.tick = 19;
    log.log(CombatLogEventType::Damage, "Goblin takes 8 damage (critical)".to_string());
    log.log(CombatLogEventType::Death, "Goblin dies (critical)".to_string());
    log
}

/// Run a bundled scenario and hand back its log
fn run_and_log(path: &str) -> CombatLog {
    let config = ScenarioConfig::load_from_file(Path::new(path)).expect("scenario should load");
    let mut app = build_scenario_app(&config, false).expect("scenario should build");
    run_scenario_app(&mut app, &config.name);

    let log = app.world().resource::<CombatLog>();
    CombatLog {
        entries: log.entries.clone(),
        tick: log.tick,
    }
}

// =============================================================================
// Query Tests
// =============================================================================

#[test]
fn test_filter_by_type() {
    let log = create_test_log();

    let damage = log.filter_by_type(CombatLogEventType::Damage);
    assert_eq!(damage.len(), 2);
    assert_eq!(damage[0].tick, 9);
    assert_eq!(damage[1].tick, 19);
    assert!(log.filter_by_type(CombatLogEventType::Reward).is_empty());
}

#[test]
fn test_count_by_type() {
    let log = create_test_log();

    assert_eq!(log.count(CombatLogEventType::Damage), 2);
    assert_eq!(log.count(CombatLogEventType::Miss), 1);
    assert_eq!(log.count(CombatLogEventType::PowerUsed), 0);
}

#[test]
fn test_recent_more_than_available() {
    let log = create_test_log();
    assert_eq!(log.recent(50).len(), log.entries.len());
    assert_eq!(log.recent(1)[0].event_type, CombatLogEventType::Death);
}

#[test]
fn test_save_to_file_writes_metadata_and_entries() {
    let log = create_test_log();
    let path = std::env::temp_dir()
        .join(format!("isocombat-log-test-{}", std::process::id()))
        .join("nested")
        .join("log.json");
    let path = path.to_string_lossy().into_owned();

    let saved = log
        .save_to_file(&serde_json::json!({ "run": "unit" }), Some(path.as_str()))
        .expect("log should save");
    assert_eq!(saved, path);

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("file should exist"))
            .expect("file should be JSON");
    assert_eq!(json["metadata"]["run"], "unit");
    assert_eq!(json["entries"][1]["event_type"], "Damage");
    assert_eq!(json["entries"][1]["tick"], 9);
}

// =============================================================================
// Scenario Log Tests
// =============================================================================

#[test]
fn test_scenario_log_is_bracketed_by_match_events() {
    let log = run_and_log("scenarios/goblin_ambush.json");

    let matches = log.filter_by_type(CombatLogEventType::MatchEvent);
    assert!(matches.len() >= 2);
    assert!(matches[0].message.starts_with("Scenario 'Goblin ambush' started"));
    assert!(matches
        .last()
        .is_some_and(|e| e.message.starts_with("Scenario ended: Victory")));
}

#[test]
fn test_scenario_log_ticks_never_go_backwards() {
    let log = run_and_log("scenarios/goblin_ambush.json");

    assert!(log.entries.windows(2).all(|pair| pair[0].tick <= pair[1].tick));
}

#[test]
fn test_scenario_messages_follow_formats() {
    let log = run_and_log("scenarios/goblin_ambush.json");

    let formats = [
        (CombatLogEventType::Damage, r"^\w+ takes \d+ damage( \(critical\))?$"),
        (CombatLogEventType::Miss, r"^\w+ evades an attack$"),
        (CombatLogEventType::PowerUsed, r"^\w+ uses \w+$"),
        (CombatLogEventType::Awareness, r"^\w+ (engages|disengages)$"),
        (CombatLogEventType::Death, r"^\w+ dies( \(critical\))?$"),
        (
            CombatLogEventType::Reward,
            r"^\w+ (grants \d+ xp|drops loot|drops quest item \d+)$",
        ),
    ];

    for (event_type, pattern) in formats {
        let re = Regex::new(pattern).expect("pattern should compile");
        for entry in log.filter_by_type(event_type) {
            assert!(
                re.is_match(&entry.message),
                "{:?} message '{}' does not match {}",
                event_type,
                entry.message,
                pattern
            );
        }
    }

    assert_eq!(log.count(CombatLogEventType::Death), 1, "The goblin dies once");
    assert!(log
        .filter_by_type(CombatLogEventType::Reward)
        .iter()
        .any(|e| e.message == "Goblin grants 14 xp"));
    assert!(log.count(CombatLogEventType::Damage) >= 1);
}
