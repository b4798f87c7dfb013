//! JSON configuration parsing for headless scenarios

use bevy::prelude::IVec2;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::sim::collision::MapCollision;
use crate::sim::components::PowerId;
use crate::sim::powers::DEFAULT_POWERS_PATH;

/// A combatant placed on the map from a stat template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnConfig {
    /// Path to the stat template
    pub template: String,
    /// Tile to spawn on, as `[x, y]`
    pub tile: [i32; 2],
}

/// Scripted hero attack, standing in for player input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeroAttackConfig {
    /// Power the hero activates
    pub power: PowerId,
    /// Ticks between activations
    #[serde(default = "default_attack_interval")]
    pub interval: u64,
}

/// Headless scenario configuration loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Scenario name for logs (default: "Scenario")
    #[serde(default = "default_name")]
    pub name: String,
    /// ASCII map rows, `#` is wall
    pub map: Vec<String>,
    pub hero: SpawnConfig,
    pub enemies: Vec<SpawnConfig>,
    #[serde(default)]
    pub hero_attack: Option<HeroAttackConfig>,
    /// Ticks before the scenario is called a timeout (default: 900)
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
    /// Random seed for deterministic reproduction
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Custom output path for the combat log (optional)
    #[serde(default)]
    pub output_path: Option<String>,
    /// Power definitions file
    #[serde(default = "default_powers_path")]
    pub powers_path: String,
}

fn default_name() -> String {
    "Scenario".to_string()
}

fn default_max_ticks() -> u64 {
    900
}

fn default_attack_interval() -> u64 {
    15
}

fn default_powers_path() -> String {
    DEFAULT_POWERS_PATH.to_string()
}

impl ScenarioConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read scenario file: {}", e))?;

        Self::from_json_str(&contents)
    }

    /// Parse and validate configuration from JSON text
    pub fn from_json_str(contents: &str) -> Result<Self, String> {
        let config: ScenarioConfig = serde_json::from_str(contents)
            .map_err(|e| format!("Failed to parse JSON: {}", e))?;

        config.validate()?;
        Ok(config)
    }

    /// Build the collision grid from the map rows
    pub fn collision(&self) -> Result<MapCollision, String> {
        MapCollision::from_rows(&self.map).map_err(|e| format!("map: {}", e))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        let map = self.collision()?;

        if self.enemies.is_empty() {
            return Err("enemies must have at least one entry".to_string());
        }

        Self::validate_spawn("hero", &self.hero, &map)?;
        for (i, enemy) in self.enemies.iter().enumerate() {
            Self::validate_spawn(&format!("enemies[{}]", i), enemy, &map)?;
        }

        if self.max_ticks == 0 {
            return Err("max_ticks must be positive".to_string());
        }

        if let Some(attack) = &self.hero_attack {
            if attack.interval == 0 {
                return Err("hero_attack.interval must be positive".to_string());
            }
            if attack.power.as_str().is_empty() {
                return Err("hero_attack.power must not be empty".to_string());
            }
        }

        Ok(())
    }

    fn validate_spawn(field: &str, spawn: &SpawnConfig, map: &MapCollision) -> Result<(), String> {
        if spawn.template.is_empty() {
            return Err(format!("{}.template must not be empty", field));
        }
        let [x, y] = spawn.tile;
        if map.is_wall_tile(IVec2::new(x, y)) {
            return Err(format!(
                "{}.tile [{}, {}] is a wall or outside the {}x{} map",
                field,
                x,
                y,
                map.size().x,
                map.size().y
            ));
        }
        Ok(())
    }
}
