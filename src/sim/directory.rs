//! Hazard Directory
//!
//! Owns every live hazard. Each tick it drops expired hazards, claims new
//! ones from the power collaborator and from combatants' pending slots, moves
//! them, and resolves collisions against the populations they can harm.

use bevy::prelude::*;
use smallvec::SmallVec;

use super::damage::{take_hit, HitOutcome};
use super::hazard::{Hazard, HazardSource};
use super::services::{CombatContext, EffectActivation, MapCollider};
use super::stats::CombatantState;

/// One collision that reached `take_hit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitReport {
    /// Index of the defender in the slice passed to `resolve_collisions`.
    pub target: usize,
    pub source: HazardSource,
    pub outcome: HitOutcome,
    /// Defender position at the time of the hit.
    pub at: IVec2,
}

/// Hit reports from a single collision pass.
pub type HitReports = SmallVec<[HitReport; 8]>;

/// The live hazard set.
#[derive(Resource, Debug, Default)]
pub struct HazardDirectory {
    hazards: Vec<Hazard>,
}

impl HazardDirectory {
    pub fn len(&self) -> usize {
        self.hazards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hazards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hazard> {
        self.hazards.iter()
    }

    /// Take ownership of a hazard directly.
    pub fn insert(&mut self, hazard: Hazard) {
        self.hazards.push(hazard);
    }

    /// Drop every hazard whose lifespan has run out. Returns how many went.
    pub fn expire(&mut self) -> usize {
        let before = self.hazards.len();
        self.hazards.retain(|hazard| !hazard.is_expired());
        before - self.hazards.len()
    }

    /// Claim hazards from the power queue and from each creator's pending slot.
    ///
    /// Returns how many were claimed.
    pub fn collect<'c>(
        &mut self,
        powers: &mut dyn EffectActivation,
        creators: impl IntoIterator<Item = &'c mut CombatantState>,
    ) -> usize {
        let before = self.hazards.len();
        self.hazards.extend(powers.drain_pending());
        self.hazards
            .extend(creators.into_iter().filter_map(|creator| creator.pending_hazard.take()));
        self.hazards.len() - before
    }

    /// Age, animate and move every hazard.
    pub fn advance(&mut self, collider: &dyn MapCollider) {
        for hazard in self.hazards.iter_mut() {
            hazard.advance(collider);
        }
    }

    /// Test every collision-eligible hazard against the combatants it can harm.
    ///
    /// A non-multitarget hazard is spent by its first hit attempt, so it can
    /// never reach a second defender.
    pub fn resolve_collisions(
        &mut self,
        combatants: &mut [&mut CombatantState],
        ctx: &mut CombatContext,
    ) -> HitReports {
        let mut reports = HitReports::new();

        for hazard in self.hazards.iter_mut() {
            if !hazard.is_collision_eligible() {
                continue;
            }

            for (index, target) in combatants.iter_mut().enumerate() {
                if !hazard.active {
                    break;
                }
                if !target.is_alive()
                    || !hazard.source.can_harm(target.faction)
                    || !hazard.reaches(target.pos)
                {
                    continue;
                }

                let outcome = take_hit(target, hazard, ctx);
                if outcome.is_attempt() && !hazard.multitarget {
                    hazard.spend();
                }
                reports.push(HitReport {
                    target: index,
                    source: hazard.source,
                    outcome,
                    at: target.pos,
                });
            }
        }

        reports
    }

    /// The whole per-tick sequence for callers outside the ECS schedule:
    /// expire, collect, advance, resolve.
    pub fn tick(
        &mut self,
        combatants: &mut [&mut CombatantState],
        ctx: &mut CombatContext,
    ) -> HitReports {
        self.expire();
        self.collect(&mut *ctx.powers, combatants.iter_mut().map(|c| &mut **c));
        self.advance(ctx.collider);
        self.resolve_collisions(combatants, ctx)
    }

    /// Drop everything, e.g. on map change.
    pub fn clear(&mut self) {
        self.hazards.clear();
    }
}
