//! Steering & Vision
//!
//! Runs before the behavior state machine each tick. Works out how far away
//! the hero is, whether the creature can see them, and where it should head.
//! The result is an immutable `Pursuit` every state handler reads.

use bevy::prelude::*;

use super::components::{Direction, HeroSnapshot};
use super::constants::PATROL_TICKS;
use super::services::MapCollider;
use super::stats::CombatantState;

/// Integer Euclidean distance, floored.
pub fn distance(a: IVec2, b: IVec2) -> i32 {
    let d = (b - a).as_dvec2();
    d.length().floor() as i32
}

/// Facing that points from `from` toward `to`.
///
/// Map rows grow downward, so the vertical axis is flipped before bucketing
/// the slope. Slopes of exactly ±2 and +½ land in the diagonal buckets, −½
/// in the horizontal one.
pub fn face(from: IVec2, to: IVec2) -> Direction {
    let dx = to.x - from.x;
    let dy = from.y - to.y;

    if dx == 0 {
        return if dy > 0 {
            Direction::NorthEast
        } else {
            Direction::SouthWest
        };
    }

    let slope = dy as f32 / dx as f32;
    if (0.5..=2.0).contains(&slope) {
        if dy > 0 {
            Direction::East
        } else {
            Direction::West
        }
    } else if (-0.5..=0.5).contains(&slope) {
        if dx > 0 {
            Direction::SouthEast
        } else {
            Direction::NorthWest
        }
    } else if (-2.0..=-0.5).contains(&slope) {
        if dx > 0 {
            Direction::South
        } else {
            Direction::North
        }
    } else if dy > 0 {
        Direction::NorthEast
    } else {
        Direction::SouthWest
    }
}

/// Fallback facing when `current` is blocked: rotate 45° toward the side the
/// target lies on.
pub fn face_next_best(from: IVec2, to: IVec2, current: Direction) -> Direction {
    let dx = (to.x - from.x).abs();
    let dy = (to.y - from.y).abs();

    match current {
        Direction::West => {
            if dy > dx {
                Direction::SouthWest
            } else {
                Direction::NorthWest
            }
        }
        Direction::NorthWest => {
            if to.y > from.y {
                Direction::West
            } else {
                Direction::North
            }
        }
        Direction::North => {
            if dx > dy {
                Direction::NorthWest
            } else {
                Direction::NorthEast
            }
        }
        Direction::NorthEast => {
            if to.x < from.x {
                Direction::North
            } else {
                Direction::East
            }
        }
        Direction::East => {
            if dy > dx {
                Direction::NorthEast
            } else {
                Direction::SouthEast
            }
        }
        Direction::SouthEast => {
            if to.y < from.y {
                Direction::East
            } else {
                Direction::South
            }
        }
        Direction::South => {
            if dx > dy {
                Direction::SouthEast
            } else {
                Direction::SouthWest
            }
        }
        Direction::SouthWest => {
            if to.x > from.x {
                Direction::South
            } else {
                Direction::West
            }
        }
    }
}

/// What the creature knows about its quarry this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pursuit {
    /// Where to head, if anywhere.
    pub target: Option<IVec2>,
    /// Distance to the hero (0 when the hero is absent).
    pub distance: i32,
    pub los: bool,
}

impl Pursuit {
    /// Point to aim attacks and detours at: the target, or one step ahead.
    pub fn aim(&self, state: &CombatantState) -> IVec2 {
        self.target
            .unwrap_or_else(|| state.pos + state.direction.step() * state.speed.max(1))
    }
}

/// Update combat memory from the hero snapshot and produce this tick's pursuit.
pub fn steer(
    state: &mut CombatantState,
    hero: HeroSnapshot,
    collider: &dyn MapCollider,
) -> Pursuit {
    let dist = if hero.alive {
        distance(state.pos, hero.pos)
    } else {
        0
    };

    if !hero.alive || dist > state.threat_range * 2 {
        if state.in_combat {
            debug!("{} disengages", state.name);
        }
        state.in_combat = false;
        state.last_seen = None;
        state.patrol_ticks = 0;
    }

    let los = hero.alive
        && dist < state.threat_range
        && collider.line_of_sight(state.pos, hero.pos);

    let mut patrol_started = false;
    if los {
        if !state.in_combat {
            debug!("{} spots the hero at distance {}", state.name, dist);
        }
        state.in_combat = true;
        state.last_seen = Some(hero.pos);
        state.patrol_ticks = 0;
    } else if let Some(last_seen) = state.last_seen {
        if distance(state.pos, last_seen) <= state.speed * 2 && state.patrol_ticks == 0 {
            state.last_seen = None;
            state.patrol_ticks = PATROL_TICKS;
            patrol_started = true;
        }
    }

    let target = if los {
        Some(hero.pos)
    } else if state.in_combat {
        if state.patrol_ticks > 0 && !patrol_started {
            state.patrol_ticks -= 1;
            if state.patrol_ticks == 0 {
                debug!("{} gives up the search", state.name);
                state.in_combat = false;
            }
        }
        state.last_seen
    } else {
        None
    };

    Pursuit {
        target,
        distance: dist,
        los,
    }
}
