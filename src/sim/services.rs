//! Collaborator Interfaces
//!
//! The combat core does not own the map, the power catalogue, or story state.
//! It talks to them through these traits so the pure update functions can be
//! driven by the bevy resources in a running game and by fakes in tests.

use std::collections::HashSet;

use bevy::prelude::*;

use super::components::{PowerId, Roller};
use super::hazard::Hazard;
use super::stats::CombatantState;

/// Collision and line-of-sight queries against the map.
pub trait MapCollider {
    /// Move `pos` up to `distance` units along `step` (each component -1, 0 or 1).
    ///
    /// Returns false when no unit could be taken: a wall or obstacle, or a
    /// zero-length move.
    fn step(&self, pos: &mut IVec2, step: IVec2, distance: i32) -> bool;

    /// Whether an unobstructed straight line joins `from` and `to`.
    fn line_of_sight(&self, from: IVec2, to: IVec2) -> bool;

    /// Whether the world position is inside a wall.
    fn is_wall(&self, pos: IVec2) -> bool;
}

/// Decorative impact effect kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SparkKind {
    Blood,
    Fire,
    Ice,
}

/// The power activation collaborator.
pub trait EffectActivation {
    /// Activate `power` for `caster` aimed at `target`.
    ///
    /// A returned hazard belongs to the caster and should sit in its pending
    /// slot until the hazard directory claims it. Powers that spawn their
    /// hazards into the shared queue return `None`.
    fn activate(&mut self, power: &PowerId, caster: &CombatantState, target: IVec2)
        -> Option<Hazard>;

    /// Whether using `power` needs line of sight to the target.
    fn requires_los(&self, power: &PowerId) -> bool;

    /// Put a hazard into the shared pending queue.
    fn enqueue(&mut self, hazard: Hazard);

    /// Hand over every queued hazard.
    fn drain_pending(&mut self) -> Vec<Hazard>;

    /// Spawn a decorative spark. Sparks never deal damage.
    fn spark(&mut self, _kind: SparkKind, _at: IVec2) {}
}

/// Story and quest flags.
pub trait StoryStatus {
    fn check_status(&self, id: &str) -> bool;
    fn set_status(&mut self, id: &str);
}

/// Set of story flags, the default story collaborator.
#[derive(Resource, Debug, Default, Clone)]
pub struct StoryFlags {
    flags: HashSet<String>,
}

impl StoryFlags {
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

impl StoryStatus for StoryFlags {
    fn check_status(&self, id: &str) -> bool {
        self.flags.contains(id)
    }

    fn set_status(&mut self, id: &str) {
        self.flags.insert(id.to_string());
    }
}

/// Everything a creature update or hit resolution may call out to.
pub struct CombatContext<'a> {
    pub collider: &'a dyn MapCollider,
    pub powers: &'a mut dyn EffectActivation,
    pub rng: &'a mut dyn Roller,
    pub story: &'a mut dyn StoryStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_story_flags_set_and_check() {
        let mut story = StoryFlags::default();
        assert!(story.is_empty());
        assert!(!story.check_status("ogre_defeated"));

        story.set_status("ogre_defeated");
        story.set_status("ogre_defeated");

        assert!(story.check_status("ogre_defeated"));
        assert_eq!(story.len(), 1);
    }
}
