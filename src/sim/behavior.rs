//! Creature Behavior
//!
//! The per-tick update for every non-player creature. Steering runs first and
//! yields a `Pursuit`; then the handler for the current behavior state
//! advances its animation and decides whether to move, turn or attack.
//!
//! ## State handlers
//! - `stance`: idle ping-pong; ranged rolls, pursuit, melee rolls
//! - `moving`: looping run; ranged rolls can interrupt movement
//! - `attack`: play-once attack; fires the slot's power at the half-point
//! - `flinch`: ping-pong hit reaction, back to stance when done
//! - `dying`: play-once death animation that holds on the corpse frame

use bevy::prelude::*;
use smallvec::SmallVec;

use super::components::{BehaviorState, DeathKind, HeroSnapshot, PowerSlot};
use super::constants::BLEED_INTERVAL;
use super::rewards::grant_rewards;
use super::services::{CombatContext, MapCollider, SparkKind};
use super::stats::{Animation, CombatantState};
use super::steering::{face, face_next_best, steer, Pursuit};

/// Something notable a creature did this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BehaviorEvent {
    /// Entered an attack state for this slot.
    AttackStarted(PowerSlot),
    /// Reached the attack's half-point and activated the slot's power.
    PowerActivated(PowerSlot),
    /// Bled out this tick.
    Died(DeathKind),
    /// Death animation finished.
    BecameCorpse,
}

/// What one creature update produced.
#[derive(Debug, Clone, Default)]
pub struct BehaviorReport {
    /// `None` when the creature was dead or stunned and never steered.
    pub pursuit: Option<Pursuit>,
    pub events: SmallVec<[BehaviorEvent; 4]>,
}

/// Run one tick of creature behavior.
///
/// `CombatantState::tick` should already have run for this tick.
pub fn update_creature(
    state: &mut CombatantState,
    hero: HeroSnapshot,
    ctx: &mut CombatContext,
) -> BehaviorReport {
    let mut report = BehaviorReport::default();

    // Bleeding out is the only way to reach zero hp outside of take_hit
    if let Some(kind) = state.settle_death(false) {
        grant_rewards(state, ctx.rng, ctx.story);
        report.events.push(BehaviorEvent::Died(kind));
    }

    if state.is_terminal() {
        if dying(state) {
            report.events.push(BehaviorEvent::BecameCorpse);
        }
        return report;
    }

    if state.status.bleed % BLEED_INTERVAL == 1 {
        ctx.powers.spark(SparkKind::Blood, state.pos);
    }

    if state.status.stun > 0 {
        return report;
    }

    let pursuit = steer(state, hero, ctx.collider);
    report.pursuit = Some(pursuit);

    let before = state.cur_state;
    match state.cur_state {
        BehaviorState::Stance => stance(state, &pursuit, ctx),
        BehaviorState::Move => moving(state, &pursuit, ctx),
        BehaviorState::Hit => flinch(state),
        BehaviorState::MeleePhys
        | BehaviorState::RangedPhys
        | BehaviorState::MeleeMystic
        | BehaviorState::RangedMystic => {
            if let Some(slot) = state.cur_state.attack_slot() {
                if attack(state, slot, &pursuit, ctx) {
                    report.events.push(BehaviorEvent::PowerActivated(slot));
                }
            }
        }
        BehaviorState::Dead | BehaviorState::CritDead => {}
    }

    if state.cur_state != before {
        if let Some(slot) = state.cur_state.attack_slot() {
            report.events.push(BehaviorEvent::AttackStarted(slot));
        }
    }

    report
}

/// Advance the reaction animations of a combatant that has no behavior of
/// its own (the hero): flinching and dying.
///
/// Settles a bleed-out first, like `update_creature`. No rewards are
/// granted here.
pub fn animate_reactions(state: &mut CombatantState) -> BehaviorReport {
    let mut report = BehaviorReport::default();
    if let Some(kind) = state.settle_death(false) {
        report.events.push(BehaviorEvent::Died(kind));
    }

    match state.cur_state {
        BehaviorState::Hit => flinch(state),
        BehaviorState::Dead | BehaviorState::CritDead => {
            if dying(state) {
                report.events.push(BehaviorEvent::BecameCorpse);
            }
        }
        _ => {}
    }
    report
}

/// Move along the current facing. Slow halves the distance, haste doubles
/// it, and immobilize refuses the move.
///
/// Returns false when blocked.
pub fn move_step(state: &mut CombatantState, collider: &dyn MapCollider) -> bool {
    if state.status.immobilize > 0 {
        return false;
    }

    let mut distance = if state.direction.is_diagonal() {
        state.dspeed
    } else {
        state.speed
    };
    if state.status.slow > 0 {
        distance /= 2;
    }
    if state.status.haste > 0 {
        distance *= 2;
    }

    collider.step(&mut state.pos, state.direction.step(), distance)
}

/// Move, or detour 45° toward the target. Restores the facing when both fail.
fn move_or_detour(state: &mut CombatantState, pursuit: &Pursuit, collider: &dyn MapCollider) -> bool {
    if move_step(state, collider) {
        return true;
    }

    let previous = state.direction;
    state.direction = face_next_best(state.pos, pursuit.aim(state), previous);
    if move_step(state, collider) {
        return true;
    }
    state.direction = previous;
    false
}

/// Re-face the pursuit target every `dir_favor` ticks, unless patrolling.
fn refresh_facing(state: &mut CombatantState, pursuit: &Pursuit) {
    state.dir_ticks += 1;
    if state.dir_ticks > state.dir_favor && state.patrol_ticks == 0 {
        if let Some(target) = pursuit.target {
            state.direction = face(state.pos, target);
        }
        state.dir_ticks = 0;
    }
}

/// Roll one attack slot: off its own cooldown, with line of sight if the
/// power needs it, and under its chance.
fn roll_slot(state: &mut CombatantState, slot: PowerSlot, pursuit: &Pursuit, ctx: &mut CombatContext) -> bool {
    let config = state.slot(slot);
    if config.cooldown_ticks > 0 {
        return false;
    }
    if ctx.powers.requires_los(&config.power) && !pursuit.los {
        return false;
    }
    if ctx.rng.percent() < config.chance {
        state.new_state(slot.attack_state());
        return true;
    }
    false
}

/// Ranged physical, then ranged mystic. Gated by the shared cooldown.
fn roll_ranged(state: &mut CombatantState, pursuit: &Pursuit, ctx: &mut CombatContext) -> bool {
    if state.cooldown_ticks > 0 {
        return false;
    }
    roll_slot(state, PowerSlot::RangedPhys, pursuit, ctx)
        || roll_slot(state, PowerSlot::RangedMystic, pursuit, ctx)
}

/// Melee physical, then melee mystic. Gated by the shared cooldown.
fn roll_melee(state: &mut CombatantState, pursuit: &Pursuit, ctx: &mut CombatContext) -> bool {
    if state.cooldown_ticks > 0 {
        return false;
    }
    roll_slot(state, PowerSlot::MeleePhys, pursuit, ctx)
        || roll_slot(state, PowerSlot::MeleeMystic, pursuit, ctx)
}

/// Display column for a back-and-forth animation.
fn ping_pong(anim: &Animation, cur_frame: i32, max_frame: i32) -> i32 {
    let mid_frame = anim.length();
    if cur_frame >= mid_frame {
        (max_frame - 1 - cur_frame) / anim.duration.max(1) + anim.position
    } else {
        anim.column(cur_frame)
    }
}

fn stance(state: &mut CombatantState, pursuit: &Pursuit, ctx: &mut CombatContext) {
    let anim = state.anim.stance;
    let max_frame = anim.length() * 2;
    state.cur_frame += 1;
    if state.cur_frame >= max_frame {
        state.cur_frame = 0;
    }
    state.disp_frame = ping_pong(&anim, state.cur_frame, max_frame);

    if !state.in_combat {
        return;
    }

    refresh_facing(state, pursuit);

    if pursuit.distance > state.melee_range {
        if roll_ranged(state, pursuit, ctx) {
            return;
        }
        if ctx.rng.percent() < state.chance_pursue && move_or_detour(state, pursuit, ctx.collider) {
            state.new_state(BehaviorState::Move);
        }
    } else {
        roll_melee(state, pursuit, ctx);
    }
}

fn moving(state: &mut CombatantState, pursuit: &Pursuit, ctx: &mut CombatContext) {
    let anim = state.anim.run;
    state.cur_frame += 1;
    if state.cur_frame >= anim.length() {
        state.cur_frame = 0;
    }
    state.disp_frame = anim.column(state.cur_frame);

    if !state.in_combat {
        state.new_state(BehaviorState::Stance);
        return;
    }

    refresh_facing(state, pursuit);

    if pursuit.distance <= state.melee_range {
        state.new_state(BehaviorState::Stance);
        return;
    }
    if roll_ranged(state, pursuit, ctx) {
        return;
    }
    if !move_or_detour(state, pursuit, ctx.collider) {
        state.new_state(BehaviorState::Stance);
    }
}

/// Returns true when the slot's power was activated this tick.
fn attack(
    state: &mut CombatantState,
    slot: PowerSlot,
    pursuit: &Pursuit,
    ctx: &mut CombatContext,
) -> bool {
    let anim = match slot {
        PowerSlot::MeleePhys => state.anim.melee,
        PowerSlot::RangedPhys => state.anim.ranged,
        PowerSlot::MeleeMystic | PowerSlot::RangedMystic => state.anim.magic,
    };
    let max_frame = anim.length();
    state.cur_frame += 1;
    state.disp_frame = anim.column(state.cur_frame);

    if slot.is_ranged() {
        if let Some(target) = pursuit.target {
            state.direction = face(state.pos, target);
        }
    }

    if state.cur_frame == 1 {
        match slot {
            PowerSlot::MeleePhys => state.sfx.phys_melee = true,
            PowerSlot::RangedPhys => state.sfx.phys_ranged = true,
            PowerSlot::MeleeMystic | PowerSlot::RangedMystic => state.sfx.mystic = true,
        }
    }

    let mut activated = false;
    if state.cur_frame == (max_frame / 2).max(1) && state.pending_hazard.is_none() {
        let power = state.slot(slot).power.clone();
        let aim = pursuit.aim(state);
        state.pending_hazard = ctx.powers.activate(&power, state, aim);
        let config = state.slot_mut(slot);
        config.cooldown_ticks = config.cooldown;
        activated = true;
    }

    if state.cur_frame >= max_frame - 1 {
        state.new_state(BehaviorState::Stance);
        state.cooldown_ticks = state.cooldown;
    }

    activated
}

fn flinch(state: &mut CombatantState) {
    let anim = state.anim.hit;
    let max_frame = anim.length() * 2;
    state.cur_frame += 1;
    state.disp_frame = ping_pong(&anim, state.cur_frame, max_frame);

    if state.cur_frame >= max_frame - 1 {
        state.new_state(BehaviorState::Stance);
    }
}

/// Returns true on the tick the corpse frame is reached.
fn dying(state: &mut CombatantState) -> bool {
    if state.corpse {
        return false;
    }

    let anim = if state.cur_state == BehaviorState::CritDead {
        state.anim.critdie
    } else {
        state.anim.die
    };

    if state.cur_frame == 0 {
        if state.cur_state == BehaviorState::CritDead {
            state.sfx.critdie = true;
        } else {
            state.sfx.die = true;
        }
    }

    let max_frame = (anim.frames - 1).max(0) * anim.duration.max(1);
    if state.cur_frame < max_frame {
        state.cur_frame += 1;
    }
    state.disp_frame = anim.column(state.cur_frame);
    if state.cur_frame >= max_frame {
        state.corpse = true;
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::collision::MapCollision;
    use crate::sim::components::{Direction, ScriptedRolls};
    use crate::sim::powers::PowerManager;
    use crate::sim::services::StoryFlags;

    fn open_map() -> MapCollision {
        MapCollision::open(20, 20)
    }

    fn creature() -> CombatantState {
        CombatantState {
            pos: IVec2::new(320, 320),
            speed: 8,
            dspeed: 6,
            ..CombatantState::with_hp(10)
        }
    }

    #[test]
    fn test_move_step_speeds() {
        let map = open_map();

        let mut state = creature();
        state.direction = Direction::SouthEast;
        assert!(move_step(&mut state, &map));
        assert_eq!(state.pos, IVec2::new(328, 320));

        let mut state = creature();
        state.direction = Direction::South;
        assert!(move_step(&mut state, &map));
        assert_eq!(state.pos, IVec2::new(326, 326), "Diagonals use dspeed");

        let mut state = creature();
        state.direction = Direction::SouthEast;
        state.status.slow = 3;
        move_step(&mut state, &map);
        assert_eq!(state.pos, IVec2::new(324, 320), "Slow halves");

        let mut state = creature();
        state.direction = Direction::SouthEast;
        state.status.haste = 3;
        move_step(&mut state, &map);
        assert_eq!(state.pos, IVec2::new(336, 320), "Haste doubles");
    }

    #[test]
    fn test_slowed_crawl_to_zero_is_not_a_move() {
        let map = open_map();
        let mut state = CombatantState {
            speed: 1,
            dspeed: 1,
            direction: Direction::SouthEast,
            ..creature()
        };
        state.status.slow = 3;

        assert!(!move_step(&mut state, &map), "Half of 1 is no distance at all");
        assert_eq!(state.pos, IVec2::new(320, 320));
    }

    #[test]
    fn test_immobilized_cannot_move() {
        let map = open_map();
        let mut state = creature();
        state.status.immobilize = 1;
        assert!(!move_step(&mut state, &map));
        assert_eq!(state.pos, IVec2::new(320, 320));
    }

    #[test]
    fn test_stance_ping_pong_frames() {
        let mut state = creature();
        state.anim.stance = Animation {
            position: 0,
            frames: 2,
            duration: 2,
        };

        let map = open_map();
        let mut powers = PowerManager::default();
        let mut rolls = ScriptedRolls::default();
        let mut story = StoryFlags::default();
        let mut ctx = CombatContext {
            collider: &map,
            powers: &mut powers,
            rng: &mut rolls,
            story: &mut story,
        };

        let mut frames = Vec::new();
        for _ in 0..8 {
            stance(&mut state, &Pursuit::default(), &mut ctx);
            frames.push(state.disp_frame);
        }

        assert_eq!(frames, vec![0, 1, 1, 1, 1, 0, 0, 0]);
    }

    #[test]
    fn test_flinch_returns_to_stance() {
        let mut state = creature();
        state.anim.hit = Animation {
            position: 10,
            frames: 1,
            duration: 2,
        };
        state.new_state(BehaviorState::Hit);

        // 2 * (1 * 2) = 4 ticks, ends on frame 3
        for _ in 0..2 {
            flinch(&mut state);
            assert_eq!(state.cur_state, BehaviorState::Hit);
        }
        flinch(&mut state);
        assert_eq!(state.cur_state, BehaviorState::Stance);
    }

    #[test]
    fn test_dying_holds_corpse_frame() {
        let mut state = creature();
        state.anim.die = Animation {
            position: 20,
            frames: 3,
            duration: 2,
        };
        state.apply_damage(10);
        state.settle_death(false);

        assert!(!dying(&mut state));
        assert!(state.sfx.die, "Death sound on the first frame");
        let mut ticks = 1;
        while !dying(&mut state) {
            ticks += 1;
            assert!(ticks < 10);
        }
        assert_eq!(ticks, 3);
        assert!(state.corpse);
        assert_eq!(state.disp_frame, 22);

        let frame = state.cur_frame;
        assert!(!dying(&mut state));
        assert_eq!(state.cur_frame, frame);
    }

    #[test]
    fn test_single_frame_death_is_immediate_corpse() {
        let mut state = creature();
        state.anim.critdie = Animation {
            position: 5,
            frames: 1,
            duration: 1,
        };
        state.apply_damage(10);
        state.settle_death(true);

        assert!(dying(&mut state));
        assert!(state.sfx.critdie);
        assert_eq!(state.disp_frame, 5);
    }
}
