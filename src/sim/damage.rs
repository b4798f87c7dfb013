//! Hit Resolution
//!
//! `take_hit` resolves one hazard against one defender: the anti-rehit
//! window, accuracy, damage, resistance, armor, crits, status effects, the
//! post-hit trigger, and the resulting state change.

use bevy::prelude::*;

use super::components::{BehaviorState, DeathKind, Faction};
use super::constants::{BASE_HIT_BONUS, REHIT_WINDOW};
use super::hazard::{Element, Hazard};
use super::rewards::grant_rewards;
use super::services::CombatContext;
use super::stats::CombatantState;

/// A hit that landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strike {
    /// Damage dealt after resistance, armor and crit.
    pub damage: i32,
    /// Crits request a camera shake.
    pub crit: bool,
    /// Set when this strike killed the defender.
    pub death: Option<DeathKind>,
}

/// Result of resolving a hazard against a defender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// The defender was already dead.
    Ignored,
    /// The defender was hit moments ago and is inside its anti-rehit window.
    Deflected,
    /// The accuracy roll failed.
    Missed,
    Struck(Strike),
}

impl HitOutcome {
    /// Whether this counted as a hit attempt. A non-multitarget hazard is
    /// spent by any attempt, hit or miss.
    pub fn is_attempt(&self) -> bool {
        matches!(self, HitOutcome::Missed | HitOutcome::Struck(_))
    }

    pub fn strike(&self) -> Option<&Strike> {
        match self {
            HitOutcome::Struck(strike) => Some(strike),
            _ => None,
        }
    }
}

/// Percentage of `element` damage the defender shrugs off, at most 100.
fn resistance(defender: &CombatantState, element: Option<Element>) -> i32 {
    match element {
        Some(Element::Fire) => defender.resist_fire.min(100),
        Some(Element::Ice) => defender.resist_ice.min(100),
        None => 0,
    }
}

/// Resolve `hazard` against `defender`.
pub fn take_hit(
    defender: &mut CombatantState,
    hazard: &Hazard,
    ctx: &mut CombatContext,
) -> HitOutcome {
    if defender.is_terminal() {
        return HitOutcome::Ignored;
    }

    if !defender.in_combat {
        defender.in_combat = true;
        defender.last_seen = Some(hazard.origin);
    }

    if defender.targeted > 0 {
        return HitOutcome::Deflected;
    }
    defender.targeted = REHIT_WINDOW;

    let hit_threshold = hazard.accuracy - defender.avoidance + BASE_HIT_BONUS;
    if ctx.rng.percent() > hit_threshold {
        return HitOutcome::Missed;
    }

    let mut damage = ctx.rng.between(hazard.dmg_min, hazard.dmg_max);

    damage -= damage * resistance(defender, hazard.traits.element) / 100;

    if !hazard.traits.armor_penetration {
        damage -= ctx.rng.between(defender.absorb.min, defender.absorb.max);
        if damage < 1 && hazard.dmg_min >= 1 {
            damage = 1;
        }
        damage = damage.max(0);
    }

    let mut crit_chance = hazard.crit_chance;
    if defender.status.is_impaired() {
        crit_chance += hazard.traits.crit_bonus_vs_impaired;
    }
    let crit = ctx.rng.percent() < crit_chance;
    if crit {
        damage += hazard.dmg_max;
    }

    debug_assert!(damage >= 0, "take_hit: negative damage {}", damage);

    defender.apply_damage(damage);
    if damage > 0 {
        defender.status.stun = 0;
    }

    if defender.hp > 0 && defender.status.immunity == 0 {
        defender.status.merge_longest(&hazard.statuses);
    }

    if crit || hazard.statuses.bleed > 0 {
        ctx.powers.spark(hazard.spark_kind(), defender.pos);
    }

    if damage > 0 {
        if let Some(post_power) = &hazard.post_power {
            let caster = hazard
                .caster
                .stand_in(post_power.as_str(), defender.pos, hazard.direction);
            if let Some(follow_up) = ctx.powers.activate(post_power, &caster, defender.pos) {
                ctx.powers.enqueue(follow_up);
            }
        }
    }

    let mut death = None;
    if damage > 0 {
        defender.sfx.hit = true;
        defender.cur_frame = 0;

        death = defender.settle_death(crit);
        if death.is_some() {
            if defender.faction == Faction::Enemy {
                grant_rewards(defender, ctx.rng, ctx.story);
            } else {
                info!("{} has fallen", defender.name);
            }
        } else if hazard.statuses.stun == 0 {
            defender.cur_state = BehaviorState::Hit;
            defender.disp_frame = defender.anim.hit.position;
        }
    }

    HitOutcome::Struck(Strike {
        damage,
        crit,
        death,
    })
}
