//! Headless scenario execution
//!
//! Runs a scenario without any graphical output, stepping the schedule one
//! tick per `app.update()` until it reaches an outcome.

use bevy::log::LogPlugin;
use bevy::prelude::*;
use serde::Serialize;

use crate::combat::log::{CombatLog, CombatLogEventType};
use crate::sim::collision::MapCollision;
use crate::sim::components::{Faction, GameRng, Hero, SimClock};
use crate::sim::powers::{load_power_definitions, PowerManager};
use crate::sim::services::EffectActivation;
use crate::sim::stats::CombatantState;
use crate::sim::steering::{distance, face};
use crate::sim::systems::{CombatSystemPhase, SimPlugin};
use crate::sim::template::load_template;

use super::config::{HeroAttackConfig, ScenarioConfig, SpawnConfig};

/// How a scenario ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScenarioOutcome {
    /// Every enemy is dead
    Victory,
    /// The hero is dead
    Defeat,
    /// `max_ticks` ran out first
    Timeout,
}

/// Result of a completed headless scenario
///
/// This struct provides programmatic access to scenario results for testing
/// and is saved as the metadata of the combat log.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub name: String,
    pub outcome: ScenarioOutcome,
    /// Ticks simulated
    pub ticks: u64,
    pub hero_hp: i32,
    pub hero_maxhp: i32,
    /// Enemies in spawn order
    pub enemies: Vec<EnemyResult>,
    /// Experience flagged by defeated enemies
    pub xp_earned: i32,
    /// Number of enemies that flagged a random loot drop
    pub loot_drops: usize,
    /// Random seed used (if deterministic mode)
    pub random_seed: Option<u64>,
}

/// State of a single enemy after the scenario
#[derive(Debug, Clone, Serialize)]
pub struct EnemyResult {
    pub name: String,
    pub hp: i32,
    pub maxhp: i32,
    pub alive: bool,
    /// Finished its death animation
    pub corpse: bool,
    pub xp: Option<i32>,
    pub loot_drop: bool,
    pub forced_loot: Option<u32>,
}

/// Resource to track headless scenario state
#[derive(Resource, Debug)]
pub struct ScenarioState {
    pub max_ticks: u64,
    pub hero_attack: Option<HeroAttackConfig>,
    /// Set once the scenario has ended
    pub outcome: Option<ScenarioOutcome>,
}

/// Plugin for headless scenario execution
pub struct HeadlessPlugin {
    pub max_ticks: u64,
    pub hero_attack: Option<HeroAttackConfig>,
}

impl Plugin for HeadlessPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ScenarioState {
            max_ticks: self.max_ticks,
            hero_attack: self.hero_attack.clone(),
            outcome: None,
        });

        app.add_systems(
            Update,
            scripted_hero_attack
                .in_set(CombatSystemPhase::Behavior)
                .run_if(scenario_running),
        )
        .add_systems(
            Update,
            check_scenario_end.after(CombatSystemPhase::HazardResolution),
        );
    }
}

fn scenario_running(scenario: Res<ScenarioState>) -> bool {
    scenario.outcome.is_none()
}

/// Activate the scripted hero power at the nearest living enemy.
fn scripted_hero_attack(
    scenario: Res<ScenarioState>,
    clock: Res<SimClock>,
    mut hero: Query<&mut CombatantState, With<Hero>>,
    enemies: Query<&CombatantState, Without<Hero>>,
    mut powers: ResMut<PowerManager>,
    mut combat_log: ResMut<CombatLog>,
) {
    let Some(attack) = &scenario.hero_attack else {
        return;
    };
    if clock.tick % attack.interval != 0 {
        return;
    }
    let Ok(mut hero) = hero.get_single_mut() else {
        return;
    };
    if !hero.is_alive() || hero.pending_hazard.is_some() {
        return;
    }

    let Some(target) = enemies
        .iter()
        .filter(|enemy| enemy.is_alive())
        .min_by_key(|enemy| distance(hero.pos, enemy.pos))
        .map(|enemy| enemy.pos)
    else {
        return;
    };

    hero.direction = face(hero.pos, target);
    let hazard = powers.activate(&attack.power, &hero, target);
    hero.pending_hazard = hazard;
    combat_log.log(
        CombatLogEventType::PowerUsed,
        format!("{} uses {}", hero.name, attack.power),
    );
}

/// End the scenario when one side is gone or time is up
fn check_scenario_end(
    clock: Res<SimClock>,
    combatants: Query<(&CombatantState, Has<Hero>)>,
    mut scenario: ResMut<ScenarioState>,
    mut combat_log: ResMut<CombatLog>,
) {
    if scenario.outcome.is_some() {
        return;
    }

    let hero_alive = combatants
        .iter()
        .any(|(state, is_hero)| is_hero && state.is_alive());
    let enemies_alive = combatants
        .iter()
        .any(|(state, is_hero)| !is_hero && state.is_alive());

    let outcome = if !hero_alive {
        ScenarioOutcome::Defeat
    } else if !enemies_alive {
        ScenarioOutcome::Victory
    } else if clock.tick >= scenario.max_ticks {
        ScenarioOutcome::Timeout
    } else {
        return;
    };

    info!("Scenario ended: {:?} after {} ticks", outcome, clock.tick);
    combat_log.log(
        CombatLogEventType::MatchEvent,
        format!("Scenario ended: {:?} after {} ticks", outcome, clock.tick),
    );
    scenario.outcome = Some(outcome);
}

fn spawn_combatant(spawn: &SpawnConfig, faction: Faction) -> Result<CombatantState, String> {
    let mut state = load_template(&spawn.template)?;
    let [x, y] = spawn.tile;
    state.faction = faction;
    state.pos = MapCollision::tile_center(IVec2::new(x, y));
    Ok(state)
}

/// Build an app ready to run the scenario.
///
/// With `logging` set, `LogPlugin` is installed first so template and power
/// loading is reported too.
pub fn build_scenario_app(config: &ScenarioConfig, logging: bool) -> Result<App, String> {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    if logging {
        app.add_plugins(LogPlugin::default());
    }

    let map = config.collision()?;
    let powers = load_power_definitions(&config.powers_path)?;
    let hero = spawn_combatant(&config.hero, Faction::Hero)?;
    let enemies = config
        .enemies
        .iter()
        .map(|spawn| spawn_combatant(spawn, Faction::Enemy))
        .collect::<Result<Vec<_>, String>>()?;

    let game_rng = match config.random_seed {
        Some(seed) => {
            info!("Using deterministic RNG with seed: {}", seed);
            GameRng::from_seed(seed)
        }
        None => {
            info!("Using non-deterministic RNG (no seed provided)");
            GameRng::from_entropy()
        }
    };

    app.add_plugins(SimPlugin)
        .add_plugins(HeadlessPlugin {
            max_ticks: config.max_ticks,
            hero_attack: config.hero_attack.clone(),
        })
        .insert_resource(map)
        .insert_resource(PowerManager::new(powers))
        .insert_resource(game_rng);

    let enemy_count = enemies.len();
    let world = app.world_mut();
    world.spawn((Hero, hero));
    for enemy in enemies {
        world.spawn(enemy);
    }

    let mut combat_log = world.resource_mut::<CombatLog>();
    combat_log.clear();
    combat_log.log(
        CombatLogEventType::MatchEvent,
        format!("Scenario '{}' started with {} enemies", config.name, enemy_count),
    );

    info!(
        "Headless scenario '{}' set up: hero vs {} enemies",
        config.name, enemy_count
    );

    Ok(app)
}

/// Step the app until the scenario ends and collect the result.
pub fn run_scenario_app(app: &mut App, name: &str) -> ScenarioResult {
    app.finish();
    app.cleanup();

    loop {
        app.update();
        if app.world().resource::<ScenarioState>().outcome.is_some() {
            break;
        }
    }

    collect_result(app.world_mut(), name)
}

fn collect_result(world: &mut World, name: &str) -> ScenarioResult {
    let outcome = world
        .resource::<ScenarioState>()
        .outcome
        .unwrap_or(ScenarioOutcome::Timeout);
    let ticks = world.resource::<SimClock>().tick;
    let random_seed = world.resource::<GameRng>().seed;

    let mut query = world.query::<(Entity, &CombatantState, Has<Hero>)>();
    let mut combatants: Vec<(Entity, &CombatantState, bool)> = query.iter(world).collect();
    combatants.sort_by_key(|(entity, _, _)| *entity);

    let (hero_hp, hero_maxhp) = combatants
        .iter()
        .find(|(_, _, is_hero)| *is_hero)
        .map_or((0, 0), |(_, state, _)| (state.hp, state.maxhp));

    let enemies: Vec<EnemyResult> = combatants
        .iter()
        .filter(|(_, _, is_hero)| !is_hero)
        .map(|(_, state, _)| EnemyResult {
            name: state.name.clone(),
            hp: state.hp,
            maxhp: state.maxhp,
            alive: state.is_alive(),
            corpse: state.corpse,
            xp: state.rewards.xp,
            loot_drop: state.rewards.loot_drop,
            forced_loot: state.rewards.forced_loot,
        })
        .collect();

    ScenarioResult {
        name: name.to_string(),
        outcome,
        ticks,
        hero_hp,
        hero_maxhp,
        xp_earned: enemies.iter().filter_map(|e| e.xp).sum(),
        loot_drops: enemies.iter().filter(|e| e.loot_drop).count(),
        enemies,
        random_seed,
    }
}

/// Run a headless scenario with the given configuration
///
/// Saves the combat log when the config names an output path.
pub fn run_scenario(config: &ScenarioConfig, logging: bool) -> Result<ScenarioResult, String> {
    let mut app = build_scenario_app(config, logging)?;
    let result = run_scenario_app(&mut app, &config.name);

    if let Some(path) = config.output_path.as_deref() {
        let saved = app
            .world()
            .resource::<CombatLog>()
            .save_to_file(&result, Some(path))?;
        info!("Combat log saved to {}", saved);
    }

    Ok(result)
}
