//! Data-Driven Power Configuration
//!
//! Powers are defined in `assets/config/powers.ron` and turned into hazards
//! by `PowerManager`, the default effect-activation collaborator.
//!
//! ## Usage
//! ```ignore
//! let definitions = load_power_definitions("assets/config/powers.ron")?;
//! app.insert_resource(PowerManager::new(definitions));
//! ```

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use super::components::PowerId;
use super::hazard::{CasterStats, Element, Hazard, HazardSource, HazardTraits, StatusPayload};
use super::services::{EffectActivation, SparkKind};
use super::stats::{CombatantState, DamageRange};

/// Default location of the power definitions.
pub const DEFAULT_POWERS_PATH: &str = "assets/config/powers.ron";

fn default_radius() -> i32 {
    32
}

fn default_lifespan() -> i32 {
    1
}

fn default_true() -> bool {
    true
}

/// How a power delivers its hazard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerKind {
    /// Stationary hazard in front of the caster, held in the caster's pending slot.
    Melee,
    /// Travelling hazard placed in the shared pending queue.
    Missile,
}

/// Which of the caster's damage ranges a power copies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageSource {
    #[default]
    Melee,
    Ranged,
    Magic,
}

/// Complete power configuration loaded from RON.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PowerConfig {
    /// Display name of the power
    pub name: String,
    pub kind: PowerKind,
    #[serde(default = "default_true")]
    pub requires_los: bool,

    // === Damage ===
    #[serde(default)]
    pub damage: DamageSource,
    #[serde(default)]
    pub accuracy_bonus: i32,
    #[serde(default)]
    pub crit_bonus: i32,

    // === Shape ===
    #[serde(default = "default_radius")]
    pub radius: i32,
    /// Ticks the hazard lives
    #[serde(default = "default_lifespan")]
    pub lifespan: i32,
    /// Missile travel in units per tick
    #[serde(default)]
    pub speed: f32,
    /// Melee hazard offset from the caster toward its facing
    #[serde(default)]
    pub reach: f32,
    #[serde(default)]
    pub multitarget: bool,
    /// Collide only on this frame
    #[serde(default)]
    pub active_frame: Option<i32>,
    #[serde(default)]
    pub frame_duration: Option<i32>,

    // === Traits ===
    #[serde(default)]
    pub element: Option<Element>,
    #[serde(default)]
    pub armor_penetration: bool,
    #[serde(default)]
    pub crit_bonus_vs_impaired: i32,
    #[serde(default)]
    pub statuses: StatusPayload,
    /// Power activated on the defender after every damaging hit
    #[serde(default)]
    pub post_power: Option<PowerId>,
    /// Overrides the caster's faction (e.g. neutral traps)
    #[serde(default)]
    pub source: Option<HazardSource>,
}

impl PowerConfig {
    fn damage_range(&self, caster: &CombatantState) -> DamageRange {
        match self.damage {
            DamageSource::Melee => caster.dmg_melee,
            DamageSource::Ranged => caster.dmg_ranged,
            DamageSource::Magic => caster.dmg_magic,
        }
    }

    /// Build the hazard this power creates for `caster` aimed at `target`.
    pub fn build_hazard(&self, caster: &CombatantState, target: IVec2) -> Hazard {
        let damage = self.damage_range(caster);
        let origin = caster.pos.as_vec2();
        let facing = caster.direction.step().as_vec2().normalize_or_zero();

        let (pos, velocity) = match self.kind {
            PowerKind::Melee => (origin + facing * self.reach, Vec2::ZERO),
            PowerKind::Missile => {
                let aim = (target.as_vec2() - origin).normalize_or_zero();
                let aim = if aim == Vec2::ZERO { facing } else { aim };
                (origin, aim * self.speed)
            }
        };

        Hazard {
            source: self.source.unwrap_or(HazardSource::of(caster.faction)),
            origin: caster.pos,
            pos,
            velocity,
            radius: self.radius,
            dmg_min: damage.min,
            dmg_max: damage.max,
            accuracy: caster.accuracy + self.accuracy_bonus,
            crit_chance: caster.crit + self.crit_bonus,
            lifespan: self.lifespan,
            frame: 0,
            frame_duration: self.frame_duration.unwrap_or(1).max(1),
            direction: caster.direction,
            active_frame: self.active_frame,
            multitarget: self.multitarget,
            active: true,
            traits: HazardTraits {
                element: self.element,
                armor_penetration: self.armor_penetration,
                crit_bonus_vs_impaired: self.crit_bonus_vs_impaired,
            },
            statuses: self.statuses,
            post_power: self.post_power.clone(),
            caster: CasterStats::of(caster),
        }
    }
}

/// Root structure for the powers.ron file
#[derive(Debug, Serialize, Deserialize)]
pub struct PowersConfig {
    pub powers: HashMap<PowerId, PowerConfig>,
}

/// All power definitions, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct PowerDefinitions {
    definitions: HashMap<PowerId, PowerConfig>,
}

impl PowerDefinitions {
    pub fn new(config: PowersConfig) -> Self {
        Self {
            definitions: config.powers,
        }
    }

    /// Parse definitions from RON text.
    pub fn from_ron_str(contents: &str) -> Result<Self, String> {
        let config: PowersConfig =
            ron::from_str(contents).map_err(|e| format!("Failed to parse powers: {}", e))?;
        Ok(Self::new(config))
    }

    pub fn get(&self, id: &PowerId) -> Option<&PowerConfig> {
        self.definitions.get(id)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn power_ids(&self) -> impl Iterator<Item = &PowerId> {
        self.definitions.keys()
    }

    /// Check every definition for values hit resolution can't use.
    ///
    /// Returns one message per problem.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();

        for (id, config) in &self.definitions {
            if config.radius <= 0 {
                problems.push(format!("{}: radius must be positive", id));
            }
            if config.lifespan <= 0 {
                problems.push(format!("{}: lifespan must be positive", id));
            }
            if config.kind == PowerKind::Missile && config.speed <= 0.0 {
                problems.push(format!("{}: missiles need a positive speed", id));
            }
            if let Some(post) = &config.post_power {
                if !self.definitions.contains_key(post) {
                    problems.push(format!("{}: unknown post_power '{}'", id, post));
                }
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            problems.sort();
            Err(problems)
        }
    }
}

/// Load and validate power definitions from a RON file.
pub fn load_power_definitions(path: impl AsRef<Path>) -> Result<PowerDefinitions, String> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    let definitions = PowerDefinitions::from_ron_str(&contents)
        .map_err(|e| format!("{} ({})", e, path.display()))?;

    definitions
        .validate()
        .map_err(|problems| format!("Invalid power definitions: {}", problems.join("; ")))?;

    info!(
        "Loaded {} power definitions from {}",
        definitions.len(),
        path.display()
    );

    Ok(definitions)
}

/// A decorative impact effect waiting for a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spark {
    pub kind: SparkKind,
    pub at: IVec2,
}

/// Default effect-activation collaborator: turns power ids into hazards.
#[derive(Resource, Debug, Default)]
pub struct PowerManager {
    definitions: PowerDefinitions,
    pending: Vec<Hazard>,
    sparks: Vec<Spark>,
}

impl PowerManager {
    pub fn new(definitions: PowerDefinitions) -> Self {
        Self {
            definitions,
            pending: Vec::new(),
            sparks: Vec::new(),
        }
    }

    pub fn definitions(&self) -> &PowerDefinitions {
        &self.definitions
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Hand over the sparks spawned since the last call.
    pub fn drain_sparks(&mut self) -> Vec<Spark> {
        std::mem::take(&mut self.sparks)
    }
}

impl EffectActivation for PowerManager {
    fn activate(
        &mut self,
        power: &PowerId,
        caster: &CombatantState,
        target: IVec2,
    ) -> Option<Hazard> {
        let Some(config) = self.definitions.get(power) else {
            warn!("{} tried to use unknown power '{}'", caster.name, power);
            return None;
        };

        let hazard = config.build_hazard(caster, target);
        match config.kind {
            PowerKind::Melee => Some(hazard),
            PowerKind::Missile => {
                self.pending.push(hazard);
                None
            }
        }
    }

    fn requires_los(&self, power: &PowerId) -> bool {
        self.definitions
            .get(power)
            .map_or(true, |config| config.requires_los)
    }

    fn enqueue(&mut self, hazard: Hazard) {
        self.pending.push(hazard);
    }

    fn drain_pending(&mut self) -> Vec<Hazard> {
        std::mem::take(&mut self.pending)
    }

    fn spark(&mut self, kind: SparkKind, at: IVec2) {
        self.sparks.push(Spark { kind, at });
    }
}
