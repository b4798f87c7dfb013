//! Hazards
//!
//! A hazard is a short-lived attack volume: a sword swing, an arrow, a spell
//! burst. It carries everything hit resolution needs so the defender never
//! has to look back at whoever made it.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::components::{Direction, Faction, PowerId};
use super::services::{MapCollider, SparkKind};
use super::stats::{CombatantState, DamageRange};

/// Which population a hazard can harm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HazardSource {
    #[default]
    Hero,
    Enemy,
    Neutral,
}

impl HazardSource {
    /// The source a combatant's own attacks carry.
    pub fn of(faction: Faction) -> Self {
        match faction {
            Faction::Hero => HazardSource::Hero,
            Faction::Enemy => HazardSource::Enemy,
        }
    }

    /// Hero and neutral hazards hurt enemies; enemy and neutral hazards hurt the hero.
    pub fn can_harm(self, faction: Faction) -> bool {
        match (self, faction) {
            (HazardSource::Neutral, _) => true,
            (HazardSource::Hero, Faction::Enemy) => true,
            (HazardSource::Enemy, Faction::Hero) => true,
            _ => false,
        }
    }
}

/// Elemental damage types with a matching resistance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Element {
    Fire,
    Ice,
}

impl Element {
    pub fn spark(self) -> SparkKind {
        match self {
            Element::Fire => SparkKind::Fire,
            Element::Ice => SparkKind::Ice,
        }
    }
}

/// Status effect durations (in ticks) a hazard inflicts on hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusPayload {
    #[serde(default)]
    pub stun: i32,
    #[serde(default)]
    pub slow: i32,
    #[serde(default)]
    pub bleed: i32,
    #[serde(default)]
    pub immobilize: i32,
}

/// Trait flags that change how hit resolution treats a hazard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HazardTraits {
    #[serde(default)]
    pub element: Option<Element>,
    /// Skip armor absorption entirely.
    #[serde(default)]
    pub armor_penetration: bool,
    /// Extra crit chance against stunned, slowed or immobilized defenders.
    #[serde(default)]
    pub crit_bonus_vs_impaired: i32,
}

/// The attacker's offensive stats, kept on the hazard so a follow-up power
/// is built from the attacker rather than from whoever was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CasterStats {
    pub faction: Faction,
    pub dmg_melee: DamageRange,
    pub dmg_ranged: DamageRange,
    pub dmg_magic: DamageRange,
    pub accuracy: i32,
    pub crit: i32,
}

impl CasterStats {
    pub fn of(caster: &CombatantState) -> Self {
        Self {
            faction: caster.faction,
            dmg_melee: caster.dmg_melee,
            dmg_ranged: caster.dmg_ranged,
            dmg_magic: caster.dmg_magic,
            accuracy: caster.accuracy,
            crit: caster.crit,
        }
    }

    /// A stand-in combatant carrying these stats, placed at `pos`.
    pub fn stand_in(&self, name: &str, pos: IVec2, direction: Direction) -> CombatantState {
        CombatantState {
            name: name.to_string(),
            faction: self.faction,
            pos,
            direction,
            dmg_melee: self.dmg_melee,
            dmg_ranged: self.dmg_ranged,
            dmg_magic: self.dmg_magic,
            accuracy: self.accuracy,
            crit: self.crit,
            ..Default::default()
        }
    }
}

/// An active attack instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Hazard {
    pub source: HazardSource,
    /// Where the attacker stood when the hazard was made.
    pub origin: IVec2,
    pub pos: Vec2,
    pub velocity: Vec2,
    pub radius: i32,
    pub dmg_min: i32,
    pub dmg_max: i32,
    pub accuracy: i32,
    pub crit_chance: i32,
    /// Ticks left to live. The directory expires hazards that reach zero.
    pub lifespan: i32,
    pub frame: i32,
    pub frame_duration: i32,
    pub direction: Direction,
    /// Only collide on this animation frame; `None` means every frame.
    pub active_frame: Option<i32>,
    pub multitarget: bool,
    pub active: bool,
    pub traits: HazardTraits,
    pub statuses: StatusPayload,
    /// Follow-up power activated on every successful hit.
    pub post_power: Option<PowerId>,
    /// Who made the hazard, for the follow-up power.
    pub caster: CasterStats,
}

impl Default for Hazard {
    fn default() -> Self {
        Self {
            source: HazardSource::default(),
            origin: IVec2::ZERO,
            pos: Vec2::ZERO,
            velocity: Vec2::ZERO,
            radius: 32,
            dmg_min: 0,
            dmg_max: 0,
            accuracy: 75,
            crit_chance: 0,
            lifespan: 1,
            frame: 0,
            frame_duration: 1,
            direction: Direction::default(),
            active_frame: None,
            multitarget: false,
            active: true,
            traits: HazardTraits::default(),
            statuses: StatusPayload::default(),
            post_power: None,
            caster: CasterStats::default(),
        }
    }
}

impl Hazard {
    /// Advance one tick: age, animate, and fly.
    ///
    /// A moving hazard that enters a wall is spent.
    pub fn advance(&mut self, collider: &dyn MapCollider) {
        if self.lifespan > 0 {
            self.lifespan -= 1;
        }
        self.frame += 1;

        if self.velocity != Vec2::ZERO {
            self.pos += self.velocity;
            if collider.is_wall(self.grid_pos()) {
                self.lifespan = 0;
                self.active = false;
            }
        }
    }

    /// Position rounded to world units.
    pub fn grid_pos(&self) -> IVec2 {
        self.pos.round().as_ivec2()
    }

    /// Whether the hazard may collide this tick.
    pub fn is_collision_eligible(&self) -> bool {
        self.active && self.active_frame.map_or(true, |frame| frame == self.frame)
    }

    /// Center-distance test against a target position.
    pub fn reaches(&self, target: IVec2) -> bool {
        let delta = (self.grid_pos() - target).as_i64vec2();
        let radius = self.radius as i64;
        delta.x * delta.x + delta.y * delta.y < radius * radius
    }

    /// Spend the hazard so it can never hit again.
    pub fn spend(&mut self) {
        self.active = false;
        self.lifespan = 0;
    }

    pub fn is_expired(&self) -> bool {
        self.lifespan <= 0
    }

    /// Spark kind shown when this hazard crits or draws blood.
    pub fn spark_kind(&self) -> SparkKind {
        self.traits.element.map_or(SparkKind::Blood, Element::spark)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct OpenField;

    impl MapCollider for OpenField {
        fn step(&self, pos: &mut IVec2, step: IVec2, distance: i32) -> bool {
            *pos += step * distance;
            true
        }
        fn line_of_sight(&self, _from: IVec2, _to: IVec2) -> bool {
            true
        }
        fn is_wall(&self, pos: IVec2) -> bool {
            pos.x >= 100
        }
    }

    #[test]
    fn test_source_harm_matrix() {
        assert!(HazardSource::Hero.can_harm(Faction::Enemy));
        assert!(!HazardSource::Hero.can_harm(Faction::Hero));
        assert!(HazardSource::Enemy.can_harm(Faction::Hero));
        assert!(!HazardSource::Enemy.can_harm(Faction::Enemy));
        assert!(HazardSource::Neutral.can_harm(Faction::Hero));
        assert!(HazardSource::Neutral.can_harm(Faction::Enemy));
    }

    #[test]
    fn test_advance_ages_and_moves() {
        let mut hazard = Hazard {
            lifespan: 3,
            velocity: Vec2::new(10.0, 0.0),
            ..default()
        };

        hazard.advance(&OpenField);

        assert_eq!(hazard.lifespan, 2);
        assert_eq!(hazard.frame, 1);
        assert_eq!(hazard.grid_pos(), IVec2::new(10, 0));
        assert!(hazard.active);
    }

    #[test]
    fn test_missile_dies_in_wall() {
        let mut hazard = Hazard {
            lifespan: 30,
            pos: Vec2::new(95.0, 0.0),
            velocity: Vec2::new(10.0, 0.0),
            ..default()
        };

        hazard.advance(&OpenField);

        assert!(hazard.is_expired());
        assert!(!hazard.active);
    }

    #[test]
    fn test_stationary_hazard_ignores_walls() {
        let mut hazard = Hazard {
            lifespan: 2,
            pos: Vec2::new(150.0, 0.0),
            ..default()
        };

        hazard.advance(&OpenField);

        assert!(hazard.active);
        assert_eq!(hazard.lifespan, 1);
    }

    #[test]
    fn test_active_frame_gate() {
        let mut hazard = Hazard {
            active_frame: Some(2),
            lifespan: 10,
            ..default()
        };
        assert!(!hazard.is_collision_eligible());
        hazard.advance(&OpenField);
        assert!(!hazard.is_collision_eligible());
        hazard.advance(&OpenField);
        assert!(hazard.is_collision_eligible());
        hazard.advance(&OpenField);
        assert!(!hazard.is_collision_eligible());
    }

    #[test]
    fn test_reach_is_strict() {
        let hazard = Hazard {
            radius: 10,
            ..default()
        };
        assert!(hazard.reaches(IVec2::new(6, 7)));
        assert!(!hazard.reaches(IVec2::new(10, 0)));
        assert!(!hazard.reaches(IVec2::new(8, 8)));
    }

    #[test]
    fn test_spark_kind_follows_element() {
        let mut hazard = Hazard::default();
        assert_eq!(hazard.spark_kind(), SparkKind::Blood);
        hazard.traits.element = Some(Element::Fire);
        assert_eq!(hazard.spark_kind(), SparkKind::Fire);
        hazard.traits.element = Some(Element::Ice);
        assert_eq!(hazard.spark_kind(), SparkKind::Ice);
    }
}
