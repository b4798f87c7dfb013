//! Combat events
//!
//! Emitted by the combat systems for renderers, audio and tests to react to.

use bevy::prelude::*;

use crate::sim::components::{DeathKind, PowerSlot};
use crate::sim::hazard::HazardSource;

/// Event fired when a hazard's hit attempt lands or misses
#[derive(Event, Debug, Clone)]
pub struct HazardHitEvent {
    /// Entity the hazard collided with
    pub target: Entity,
    /// Who the hazard belonged to
    pub source: HazardSource,
    /// Damage dealt (0 on a miss)
    pub damage: i32,
    /// Whether this was a critical hit
    pub is_critical: bool,
    /// False when the accuracy roll failed
    pub landed: bool,
}

/// Event fired when a creature activates a power
#[derive(Event, Debug, Clone)]
pub struct PowerUsedEvent {
    pub caster: Entity,
    pub slot: PowerSlot,
}

/// Event fired when a combatant dies
#[derive(Event, Debug, Clone)]
pub struct CombatantDeathEvent {
    /// Entity that died
    pub victim: Entity,
    pub kind: DeathKind,
}
