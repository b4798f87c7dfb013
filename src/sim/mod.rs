//! Combat simulation core
//!
//! Per-combatant stat state, hazards and how they resolve against defenders,
//! the per-tick creature behavior, and the bevy systems that run them in order.
//!
//! The update functions here take plain references plus a `CombatContext` of
//! collaborators, so they run the same inside the bevy schedule and in tests.

pub mod behavior;
pub mod collision;
pub mod components;
pub mod constants;
pub mod damage;
pub mod directory;
pub mod hazard;
pub mod powers;
pub mod render;
pub mod rewards;
pub mod services;
pub mod stats;
pub mod steering;
pub mod systems;
pub mod template;

pub use components::{Direction, Faction, GameRng, Hero, HeroSnapshot, PowerId, PowerSlot};
pub use directory::HazardDirectory;
pub use hazard::Hazard;
pub use stats::CombatantState;
pub use systems::{CombatSystemPhase, SimPlugin};
