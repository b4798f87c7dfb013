//! Combat Systems API
//!
//! Bevy systems that drive the combat core once per `Update`, and the
//! helpers that install them. Both the headless runner and any graphical
//! frontend should add systems through here.
//!
//! ## System Phases
//!
//! 1. **Vitals** - Clock, camera shake, per-combatant upkeep
//! 2. **HazardClaim** - Expire spent hazards, claim newly created ones
//! 3. **Behavior** - Creature steering and state machines, hero reactions
//! 4. **HazardResolution** - Move hazards, resolve collisions, report hits
//!
//! ## Usage
//!
//! ```ignore
//! // Everything, always running
//! app.add_plugins(SimPlugin);
//!
//! // Or just the systems, under a run condition
//! systems::configure_combat_system_ordering(&mut app);
//! systems::add_core_combat_systems(&mut app, in_state(GameState::Playing));
//! ```

use bevy::prelude::*;

use crate::combat::events::{CombatantDeathEvent, HazardHitEvent, PowerUsedEvent};
use crate::combat::log::{CombatLog, CombatLogEventType};
use crate::combat::CombatPlugin;

use super::behavior::{animate_reactions, update_creature, BehaviorEvent};
use super::collision::MapCollision;
use super::components::{CameraShake, DeathKind, Faction, GameRng, Hero, HeroSnapshot, SimClock};
use super::damage::HitOutcome;
use super::directory::HazardDirectory;
use super::powers::PowerManager;
use super::services::{CombatContext, StoryFlags};
use super::stats::CombatantState;

/// System set labels for combat system ordering.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum CombatSystemPhase {
    /// Phase 1: Clock, regeneration, status countdown, bleeding
    Vitals,
    /// Phase 2: Expire and collect hazards
    HazardClaim,
    /// Phase 3: Creature behavior
    Behavior,
    /// Phase 4: Hazard movement and collision
    HazardResolution,
}

/// Configures the ordering between combat system phases.
///
/// Call this once during app setup before adding combat systems.
pub fn configure_combat_system_ordering(app: &mut App) {
    app.configure_sets(
        Update,
        (
            CombatSystemPhase::Vitals,
            CombatSystemPhase::HazardClaim,
            CombatSystemPhase::Behavior,
            CombatSystemPhase::HazardResolution,
        )
            .chain(),
    );
}

/// Adds the core combat systems to the app.
///
/// Expects the resources `SimPlugin` inserts and the events `CombatPlugin`
/// registers.
///
/// # Example
/// ```ignore
/// // For headless mode (always run)
/// add_core_combat_systems(&mut app, || true);
/// ```
pub fn add_core_combat_systems<M>(app: &mut App, run_condition: impl Condition<M> + Clone)
where
    M: 'static,
{
    app.add_systems(
        Update,
        (advance_clock, tick_combatants)
            .chain()
            .in_set(CombatSystemPhase::Vitals)
            .run_if(run_condition.clone()),
    );

    app.add_systems(
        Update,
        claim_hazards
            .in_set(CombatSystemPhase::HazardClaim)
            .run_if(run_condition.clone()),
    );

    app.add_systems(
        Update,
        (update_creatures, animate_hero)
            .chain()
            .in_set(CombatSystemPhase::Behavior)
            .run_if(run_condition.clone()),
    );

    app.add_systems(
        Update,
        resolve_hazards
            .in_set(CombatSystemPhase::HazardResolution)
            .run_if(run_condition),
    );
}

/// Installs the combat resources, events and systems, always running.
pub struct SimPlugin;

impl Plugin for SimPlugin {
    fn build(&self, app: &mut App) {
        if !app.is_plugin_added::<CombatPlugin>() {
            app.add_plugins(CombatPlugin);
        }

        app.init_resource::<HazardDirectory>()
            .init_resource::<MapCollision>()
            .init_resource::<PowerManager>()
            .init_resource::<GameRng>()
            .init_resource::<StoryFlags>()
            .init_resource::<CameraShake>()
            .init_resource::<SimClock>();

        configure_combat_system_ordering(app);
        add_core_combat_systems(app, || true);
    }
}

// ============================================================================
// Phase 1: Vitals
// ============================================================================

pub fn advance_clock(
    mut clock: ResMut<SimClock>,
    mut shake: ResMut<CameraShake>,
    mut combat_log: ResMut<CombatLog>,
) {
    clock.tick += 1;
    combat_log.tick = clock.tick;
    shake.tick();
}

pub fn tick_combatants(mut combatants: Query<&mut CombatantState>) {
    for mut state in combatants.iter_mut() {
        state.tick();
    }
}

// ============================================================================
// Phase 2: Hazard Claim
// ============================================================================

pub fn claim_hazards(
    mut directory: ResMut<HazardDirectory>,
    mut powers: ResMut<PowerManager>,
    mut combatants: Query<&mut CombatantState>,
) {
    let expired = directory.expire();
    let claimed = directory.collect(
        &mut *powers,
        combatants.iter_mut().filter(|state| state.pending_hazard.is_some()).map(Mut::into_inner),
    );
    if expired > 0 || claimed > 0 {
        trace!("Hazards: {} expired, {} claimed, {} live", expired, claimed, directory.len());
    }
}

// ============================================================================
// Phase 3: Behavior
// ============================================================================

#[allow(clippy::too_many_arguments)]
pub fn update_creatures(
    mut creatures: Query<(Entity, &mut CombatantState), Without<Hero>>,
    hero: Query<&CombatantState, With<Hero>>,
    map: Res<MapCollision>,
    mut powers: ResMut<PowerManager>,
    mut rng: ResMut<GameRng>,
    mut story: ResMut<StoryFlags>,
    mut combat_log: ResMut<CombatLog>,
    mut power_events: EventWriter<PowerUsedEvent>,
    mut death_events: EventWriter<CombatantDeathEvent>,
) {
    let snapshot = match hero.get_single() {
        Ok(state) if state.is_alive() => HeroSnapshot::alive_at(state.pos),
        _ => HeroSnapshot::absent(),
    };

    let mut ctx = CombatContext {
        collider: &*map,
        powers: &mut *powers,
        rng: &mut *rng,
        story: &mut *story,
    };

    let mut ordered: Vec<(Entity, Mut<CombatantState>)> = creatures.iter_mut().collect();
    ordered.sort_by_key(|(entity, _)| *entity);

    for (entity, mut state) in ordered {
        let was_in_combat = state.in_combat;
        let report = update_creature(&mut state, snapshot, &mut ctx);

        if state.in_combat != was_in_combat {
            let message = if state.in_combat {
                format!("{} engages", state.name)
            } else {
                format!("{} disengages", state.name)
            };
            combat_log.log(CombatLogEventType::Awareness, message);
        }

        for event in report.events {
            match event {
                BehaviorEvent::PowerActivated(slot) => {
                    combat_log.log(
                        CombatLogEventType::PowerUsed,
                        format!("{} uses {}", state.name, state.slot(slot).power),
                    );
                    power_events.send(PowerUsedEvent {
                        caster: entity,
                        slot,
                    });
                }
                BehaviorEvent::Died(kind) => {
                    log_death(&mut combat_log, &state, kind);
                    death_events.send(CombatantDeathEvent { victim: entity, kind });
                }
                BehaviorEvent::AttackStarted(_) | BehaviorEvent::BecameCorpse => {}
            }
        }
    }
}

pub fn animate_hero(
    mut hero: Query<(Entity, &mut CombatantState), With<Hero>>,
    mut combat_log: ResMut<CombatLog>,
    mut death_events: EventWriter<CombatantDeathEvent>,
) {
    for (entity, mut state) in hero.iter_mut() {
        for event in animate_reactions(&mut state).events {
            if let BehaviorEvent::Died(kind) = event {
                info!("{} has fallen", state.name);
                log_death(&mut combat_log, &state, kind);
                death_events.send(CombatantDeathEvent { victim: entity, kind });
            }
        }
    }
}

// ============================================================================
// Phase 4: Hazard Resolution
// ============================================================================

#[allow(clippy::too_many_arguments)]
pub fn resolve_hazards(
    mut directory: ResMut<HazardDirectory>,
    map: Res<MapCollision>,
    mut powers: ResMut<PowerManager>,
    mut rng: ResMut<GameRng>,
    mut story: ResMut<StoryFlags>,
    mut shake: ResMut<CameraShake>,
    mut combat_log: ResMut<CombatLog>,
    mut combatants: Query<(Entity, &mut CombatantState)>,
    mut hit_events: EventWriter<HazardHitEvent>,
    mut death_events: EventWriter<CombatantDeathEvent>,
) {
    directory.advance(&*map);
    if directory.is_empty() {
        return;
    }

    // Enemies before the hero, each in spawn order
    let mut ordered: Vec<(Entity, Mut<CombatantState>)> = combatants.iter_mut().collect();
    ordered.sort_by_key(|(entity, state)| (state.faction == Faction::Hero, *entity));
    let (entities, mut states): (Vec<Entity>, Vec<Mut<CombatantState>>) =
        ordered.into_iter().unzip();
    let mut targets: Vec<&mut CombatantState> = states.iter_mut().map(|s| &mut **s).collect();

    let mut ctx = CombatContext {
        collider: &*map,
        powers: &mut *powers,
        rng: &mut *rng,
        story: &mut *story,
    };
    let reports = directory.resolve_collisions(&mut targets, &mut ctx);

    for report in reports {
        let target = &targets[report.target];
        let entity = entities[report.target];

        match report.outcome {
            HitOutcome::Struck(strike) => {
                if strike.crit {
                    shake.pulse();
                }
                if strike.damage > 0 {
                    let crit = if strike.crit { " (critical)" } else { "" };
                    combat_log.log(
                        CombatLogEventType::Damage,
                        format!("{} takes {} damage{}", target.name, strike.damage, crit),
                    );
                }
                hit_events.send(HazardHitEvent {
                    target: entity,
                    source: report.source,
                    damage: strike.damage,
                    is_critical: strike.crit,
                    landed: true,
                });
                if let Some(kind) = strike.death {
                    log_death(&mut combat_log, target, kind);
                    death_events.send(CombatantDeathEvent { victim: entity, kind });
                }
            }
            HitOutcome::Missed => {
                combat_log.log(
                    CombatLogEventType::Miss,
                    format!("{} evades an attack", target.name),
                );
                hit_events.send(HazardHitEvent {
                    target: entity,
                    source: report.source,
                    damage: 0,
                    is_critical: false,
                    landed: false,
                });
            }
            HitOutcome::Deflected | HitOutcome::Ignored => {}
        }
    }
}

fn log_death(combat_log: &mut CombatLog, state: &CombatantState, kind: DeathKind) {
    let suffix = match kind {
        DeathKind::Normal => "",
        DeathKind::Critical => " (critical)",
    };
    combat_log.log(
        CombatLogEventType::Death,
        format!("{} dies{}", state.name, suffix),
    );

    if let Some(xp) = state.rewards.xp {
        combat_log.log(
            CombatLogEventType::Reward,
            format!("{} grants {} xp", state.name, xp),
        );
    }
    if state.rewards.loot_drop {
        combat_log.log(
            CombatLogEventType::Reward,
            format!("{} drops loot", state.name),
        );
    }
    if let Some(item) = state.rewards.forced_loot {
        combat_log.log(
            CombatLogEventType::Reward,
            format!("{} drops quest item {}", state.name, item),
        );
    }
}
