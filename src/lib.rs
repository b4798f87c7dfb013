//! isocombat - combat and creature behavior core of an isometric action game
//!
//! Per-combatant stat state, hazards and their resolution against defenders,
//! and the per-tick behavior of non-player creatures, hosted in bevy ECS.
//!
//! This library exposes the core modules for testing and reuse.

pub mod cli;
pub mod combat;
pub mod headless;
pub mod sim;

// Re-export commonly used types
pub use combat::log::{CombatLog, CombatLogEventType};
pub use headless::{ScenarioConfig, ScenarioOutcome, ScenarioResult};
pub use sim::{CombatantState, Hazard, HazardDirectory, SimPlugin};
