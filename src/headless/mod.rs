//! Headless mode for scripted scenarios
//!
//! Runs the combat core against a map and a set of creatures without any
//! graphical output, for automated testing and balance checks.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release -- --scenario scenarios/goblin_ambush.json
//! ```
//!
//! ## JSON Configuration
//!
//! ```json
//! {
//!   "name": "Goblin ambush",
//!   "map": ["########", "#......#", "#......#", "########"],
//!   "hero": { "template": "assets/creatures/hero.txt", "tile": [1, 1] },
//!   "enemies": [{ "template": "assets/creatures/goblin.txt", "tile": [6, 2] }],
//!   "hero_attack": { "power": "hero_slash", "interval": 10 },
//!   "max_ticks": 900,
//!   "random_seed": 42
//! }
//! ```

pub mod config;
pub mod runner;

pub use config::ScenarioConfig;
pub use runner::{run_scenario, ScenarioOutcome, ScenarioResult};
