//! isocombat - headless scenario runner
//!
//! Loads a JSON scenario, runs it to completion and prints the outcome.

use isocombat::cli;
use isocombat::headless::{run_scenario, ScenarioConfig};

fn main() {
    let args = cli::parse_args();

    let mut config = match ScenarioConfig::load_from_file(&args.scenario) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading scenario: {}", e);
            std::process::exit(1);
        }
    };

    // Command line overrides
    if let Some(output) = args.output {
        config.output_path = Some(output.to_string_lossy().to_string());
    }
    if let Some(max_ticks) = args.max_ticks {
        config.max_ticks = max_ticks.max(1);
    }
    if let Some(powers) = args.powers {
        config.powers_path = powers.to_string_lossy().to_string();
    }

    println!("Running scenario '{}'...", config.name);
    println!("  Enemies: {}", config.enemies.len());
    println!("  Max ticks: {}", config.max_ticks);

    match run_scenario(&config, true) {
        Ok(result) => {
            println!(
                "{:?} after {} ticks (hero {}/{} hp, {} xp, {} loot drops)",
                result.outcome,
                result.ticks,
                result.hero_hp,
                result.hero_maxhp,
                result.xp_earned,
                result.loot_drops
            );
            for enemy in &result.enemies {
                let status = if enemy.alive { "alive" } else { "dead" };
                println!("  {}: {}/{} hp, {}", enemy.name, enemy.hp, enemy.maxhp, status);
            }
        }
        Err(e) => {
            eprintln!("Scenario failed: {}", e);
            std::process::exit(1);
        }
    }
}
