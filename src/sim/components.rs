//! Core Components and Resources
//!
//! Small shared types for the combat core: facing, behavior states, factions,
//! the random roller, and the world-level resources the systems share.

use std::collections::VecDeque;

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::constants::CAMERA_SHAKE_TICKS;

// ============================================================================
// Facing
// ============================================================================

/// Eight-way facing. The discriminant is the sprite-sheet row.
///
/// Names are screen-space compass points; `step()` gives the map-space delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    West = 0,
    NorthWest = 1,
    North = 2,
    NorthEast = 3,
    East = 4,
    SouthEast = 5,
    #[default]
    South = 6,
    SouthWest = 7,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::West,
        Direction::NorthWest,
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
    ];

    pub fn index(self) -> i32 {
        self as i32
    }

    pub fn from_index(index: i32) -> Self {
        Self::ALL[index.rem_euclid(8) as usize]
    }

    /// Unit map-space step for this facing.
    pub fn step(self) -> IVec2 {
        match self {
            Direction::West => IVec2::new(-1, 1),
            Direction::NorthWest => IVec2::new(-1, 0),
            Direction::North => IVec2::new(-1, -1),
            Direction::NorthEast => IVec2::new(0, -1),
            Direction::East => IVec2::new(1, -1),
            Direction::SouthEast => IVec2::new(1, 0),
            Direction::South => IVec2::new(1, 1),
            Direction::SouthWest => IVec2::new(0, 1),
        }
    }

    /// True when the map step moves along both axes (uses diagonal speed).
    pub fn is_diagonal(self) -> bool {
        let step = self.step();
        step.x != 0 && step.y != 0
    }
}

// ============================================================================
// Behavior State
// ============================================================================

/// Animation/behavior state of a combatant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BehaviorState {
    #[default]
    Stance,
    Move,
    MeleePhys,
    RangedPhys,
    MeleeMystic,
    RangedMystic,
    Hit,
    Dead,
    CritDead,
}

impl BehaviorState {
    pub fn is_terminal(self) -> bool {
        matches!(self, BehaviorState::Dead | BehaviorState::CritDead)
    }

    /// The power slot an attack state fires, if it is one.
    pub fn attack_slot(self) -> Option<PowerSlot> {
        match self {
            BehaviorState::MeleePhys => Some(PowerSlot::MeleePhys),
            BehaviorState::RangedPhys => Some(PowerSlot::RangedPhys),
            BehaviorState::MeleeMystic => Some(PowerSlot::MeleeMystic),
            BehaviorState::RangedMystic => Some(PowerSlot::RangedMystic),
            _ => None,
        }
    }
}

/// The four attack slots every creature template fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerSlot {
    MeleePhys = 0,
    RangedPhys = 1,
    MeleeMystic = 2,
    RangedMystic = 3,
}

impl PowerSlot {
    pub const ALL: [PowerSlot; 4] = [
        PowerSlot::MeleePhys,
        PowerSlot::RangedPhys,
        PowerSlot::MeleeMystic,
        PowerSlot::RangedMystic,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// The attack state that fires this slot.
    pub fn attack_state(self) -> BehaviorState {
        match self {
            PowerSlot::MeleePhys => BehaviorState::MeleePhys,
            PowerSlot::RangedPhys => BehaviorState::RangedPhys,
            PowerSlot::MeleeMystic => BehaviorState::MeleeMystic,
            PowerSlot::RangedMystic => BehaviorState::RangedMystic,
        }
    }

    pub fn is_ranged(self) -> bool {
        matches!(self, PowerSlot::RangedPhys | PowerSlot::RangedMystic)
    }
}

/// How a combatant died.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathKind {
    Normal,
    Critical,
}

// ============================================================================
// Identity
// ============================================================================

/// Name of a power in the power definitions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PowerId(pub String);

impl PowerId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PowerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which side a combatant fights on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Faction {
    Hero,
    #[default]
    Enemy,
}

/// Marker component for the player character entity.
#[derive(Component, Debug, Default)]
pub struct Hero;

/// What every creature gets to know about the hero each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeroSnapshot {
    pub pos: IVec2,
    pub alive: bool,
}

impl HeroSnapshot {
    pub fn alive_at(pos: IVec2) -> Self {
        Self { pos, alive: true }
    }

    pub fn absent() -> Self {
        Self { pos: IVec2::ZERO, alive: false }
    }
}

// ============================================================================
// Randomness
// ============================================================================

/// Source of every probabilistic decision in the core.
pub trait Roller {
    /// Uniform roll in `0..100`.
    fn percent(&mut self) -> i32;

    /// Uniform roll in `min..=max`. Returns `min` when the range is degenerate.
    fn between(&mut self, min: i32, max: i32) -> i32;
}

/// Seeded random number generator resource for deterministic simulation.
///
/// When `seed` is set, every decision in a run is reproducible.
#[derive(Resource)]
pub struct GameRng {
    rng: StdRng,
    /// The seed used to initialize this RNG (if deterministic)
    pub seed: Option<u64>,
}

impl GameRng {
    /// Create a new GameRng with a specific seed for deterministic behavior
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    /// Create a new GameRng with random entropy (non-deterministic)
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            seed: None,
        }
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl Roller for GameRng {
    fn percent(&mut self) -> i32 {
        self.rng.gen_range(0..100)
    }

    fn between(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        self.rng.gen_range(min..=max)
    }
}

/// Roller that replays a fixed script, for pinning decision order in tests
/// and replays.
///
/// `percent` and `between` draw from the same queue. `between` clamps the
/// drawn value into range and does not draw at all for degenerate ranges.
/// Once the script runs dry every draw returns `fallback`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRolls {
    rolls: VecDeque<i32>,
    pub fallback: i32,
}

impl ScriptedRolls {
    pub fn new(rolls: impl IntoIterator<Item = i32>) -> Self {
        Self {
            rolls: rolls.into_iter().collect(),
            fallback: 0,
        }
    }

    pub fn with_fallback(mut self, fallback: i32) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn remaining(&self) -> usize {
        self.rolls.len()
    }

    fn next(&mut self) -> i32 {
        self.rolls.pop_front().unwrap_or(self.fallback)
    }
}

impl Roller for ScriptedRolls {
    fn percent(&mut self) -> i32 {
        self.next().clamp(0, 99)
    }

    fn between(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        self.next().clamp(min, max)
    }
}

// ============================================================================
// World Resources
// ============================================================================

/// Camera shake requests. Renderers read `ticks` and let it run down.
#[derive(Resource, Debug, Default)]
pub struct CameraShake {
    pub ticks: i32,
}

impl CameraShake {
    pub fn pulse(&mut self) {
        self.ticks = CAMERA_SHAKE_TICKS;
    }

    pub fn tick(&mut self) {
        if self.ticks > 0 {
            self.ticks -= 1;
        }
    }
}

/// Simulation tick counter.
#[derive(Resource, Debug, Default)]
pub struct SimClock {
    pub tick: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_index_round_trip() {
        for dir in Direction::ALL {
            assert_eq!(Direction::from_index(dir.index()), dir);
        }
        assert_eq!(Direction::from_index(-1), Direction::SouthWest);
        assert_eq!(Direction::from_index(9), Direction::NorthWest);
    }

    #[test]
    fn test_diagonal_directions_alternate() {
        let diagonals: Vec<bool> = Direction::ALL.iter().map(|d| d.is_diagonal()).collect();
        assert_eq!(
            diagonals,
            vec![true, false, true, false, true, false, true, false]
        );
    }

    #[test]
    fn test_terminal_states() {
        assert!(BehaviorState::Dead.is_terminal());
        assert!(BehaviorState::CritDead.is_terminal());
        assert!(!BehaviorState::Hit.is_terminal());
        assert!(!BehaviorState::Stance.is_terminal());
    }

    #[test]
    fn test_attack_slot_round_trip() {
        for slot in PowerSlot::ALL {
            assert_eq!(slot.attack_state().attack_slot(), Some(slot));
        }
        assert_eq!(BehaviorState::Move.attack_slot(), None);
    }

    // =========================================================================
    // Roller Tests
    // =========================================================================

    #[test]
    fn test_seeded_rng_is_deterministic() {
        let mut rng1 = GameRng::from_seed(42);
        let mut rng2 = GameRng::from_seed(42);

        for _ in 0..100 {
            assert_eq!(rng1.percent(), rng2.percent());
            assert_eq!(rng1.between(3, 9), rng2.between(3, 9));
        }
    }

    #[test]
    fn test_rng_ranges() {
        let mut rng = GameRng::from_seed(123);

        for _ in 0..200 {
            let p = rng.percent();
            assert!((0..100).contains(&p), "percent {} out of range", p);
            let b = rng.between(-2, 4);
            assert!((-2..=4).contains(&b), "between {} out of range", b);
        }
        assert_eq!(rng.between(7, 7), 7);
        assert_eq!(rng.between(7, 3), 7);
    }

    #[test]
    fn test_seeded_rng_stores_seed() {
        assert_eq!(GameRng::from_seed(12345).seed, Some(12345));
        assert!(GameRng::from_entropy().seed.is_none());
    }

    #[test]
    fn test_scripted_rolls_replay_in_order() {
        let mut rolls = ScriptedRolls::new([5, 150, -3, 2]).with_fallback(50);

        assert_eq!(rolls.percent(), 5);
        assert_eq!(rolls.percent(), 99);
        assert_eq!(rolls.percent(), 0);
        // Degenerate range does not consume the script
        assert_eq!(rolls.between(4, 4), 4);
        assert_eq!(rolls.between(0, 10), 2);
        assert_eq!(rolls.remaining(), 0);
        assert_eq!(rolls.percent(), 50);
    }

    #[test]
    fn test_camera_shake_pulse_runs_down() {
        let mut shake = CameraShake::default();
        shake.pulse();
        assert_eq!(shake.ticks, CAMERA_SHAKE_TICKS);
        for _ in 0..CAMERA_SHAKE_TICKS + 3 {
            shake.tick();
        }
        assert_eq!(shake.ticks, 0);
    }
}
