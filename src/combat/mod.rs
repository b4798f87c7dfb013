//! Combat reporting
//!
//! The combat log and the events the simulation emits while it runs:
//! - Hazard hits and misses
//! - Power activations
//! - Deaths

use bevy::prelude::*;

pub mod events;
pub mod log;

use events::*;

/// Plugin for combat events and the combat log
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<HazardHitEvent>()
            .add_event::<PowerUsedEvent>()
            .add_event::<CombatantDeathEvent>()
            .init_resource::<log::CombatLog>();
    }
}
