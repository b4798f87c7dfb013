//! Combatant State
//!
//! The stat and status record shared by the hero and every creature:
//! vitals, damage ranges, behavior tuning, animation tables, combat memory,
//! and the single pending-hazard slot.

use bevy::prelude::*;

use super::components::{BehaviorState, DeathKind, Direction, Faction, PowerId, PowerSlot};
use super::constants::*;
use super::hazard::{Hazard, StatusPayload};

/// Inclusive damage or absorption range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DamageRange {
    pub min: i32,
    pub max: i32,
}

impl DamageRange {
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }
}

/// One row of a sprite sheet's animation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Animation {
    /// First column of the animation in the sheet.
    pub position: i32,
    pub frames: i32,
    /// Ticks each frame is shown.
    pub duration: i32,
}

impl Default for Animation {
    fn default() -> Self {
        Self {
            position: 0,
            frames: 1,
            duration: 1,
        }
    }
}

impl Animation {
    /// Ticks for one full pass.
    pub fn length(&self) -> i32 {
        self.frames.max(1) * self.duration.max(1)
    }

    /// Sheet column shown at `cur_frame`.
    pub fn column(&self, cur_frame: i32) -> i32 {
        cur_frame / self.duration.max(1) + self.position
    }
}

/// Animation table for every behavior state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnimationSet {
    pub stance: Animation,
    pub run: Animation,
    pub melee: Animation,
    pub ranged: Animation,
    pub magic: Animation,
    pub hit: Animation,
    pub die: Animation,
    pub critdie: Animation,
}

/// Configuration and runtime cooldown of one attack slot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PowerSlotConfig {
    pub power: PowerId,
    /// Percent chance per decision to use this slot.
    pub chance: i32,
    /// Ticks the slot stays unavailable after firing.
    pub cooldown: i32,
    pub cooldown_ticks: i32,
}

/// Remaining durations of status effects, in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusDurations {
    pub stun: i32,
    pub slow: i32,
    pub haste: i32,
    pub immobilize: i32,
    pub bleed: i32,
    pub immunity: i32,
}

impl StatusDurations {
    /// Stunned, slowed or immobilized.
    pub fn is_impaired(&self) -> bool {
        self.stun > 0 || self.slow > 0 || self.immobilize > 0
    }

    /// Raise each duration to the payload's where the payload is longer.
    pub fn merge_longest(&mut self, payload: &StatusPayload) {
        self.stun = self.stun.max(payload.stun);
        self.slow = self.slow.max(payload.slow);
        self.bleed = self.bleed.max(payload.bleed);
        self.immobilize = self.immobilize.max(payload.immobilize);
    }

    fn count_down(&mut self) {
        for duration in [
            &mut self.stun,
            &mut self.slow,
            &mut self.haste,
            &mut self.immobilize,
            &mut self.bleed,
            &mut self.immunity,
        ] {
            if *duration > 0 {
                *duration -= 1;
            }
        }
    }
}

/// Sound cues raised by the core and cleared by the audio collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SoundCues {
    pub phys_melee: bool,
    pub phys_ranged: bool,
    pub mystic: bool,
    pub hit: bool,
    pub die: bool,
    pub critdie: bool,
}

/// Loot forced by quest state on defeat.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuestLoot {
    pub requires: Option<String>,
    pub not: Option<String>,
    pub item: u32,
}

/// Rewards flagged on defeat, collected by the loot and experience collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RewardFlags {
    pub loot_drop: bool,
    pub forced_loot: Option<u32>,
    pub xp: Option<i32>,
}

/// Per-combatant stat and status record.
#[derive(Component, Debug, Clone)]
pub struct CombatantState {
    pub name: String,
    pub faction: Faction,
    pub level: i32,
    pub xp: i32,
    pub loot_chance: i32,

    // === Position & Animation ===
    pub pos: IVec2,
    pub direction: Direction,
    pub cur_state: BehaviorState,
    pub cur_frame: i32,
    pub disp_frame: i32,
    pub corpse: bool,
    pub anim: AnimationSet,
    pub render_size: IVec2,
    pub render_offset: IVec2,

    // === Vitals ===
    pub alive: bool,
    pub hp: i32,
    pub maxhp: i32,
    pub hp_per_minute: i32,
    pub hp_ticker: i32,
    pub mp: i32,
    pub maxmp: i32,
    pub mp_per_minute: i32,
    pub mp_ticker: i32,
    pub shield_hp: i32,
    pub shield_frame: i32,
    pub vengeance_stacks: i32,
    pub vengeance_frame: i32,

    // === Offense & Defense ===
    pub dmg_melee: DamageRange,
    pub dmg_ranged: DamageRange,
    pub dmg_magic: DamageRange,
    pub absorb: DamageRange,
    pub resist_fire: i32,
    pub resist_ice: i32,
    pub accuracy: i32,
    pub avoidance: i32,
    pub crit: i32,

    // === Movement ===
    pub speed: i32,
    pub dspeed: i32,

    // === Attacks ===
    /// Shared cooldown armed when any attack animation finishes.
    pub cooldown: i32,
    pub cooldown_ticks: i32,
    pub slots: [PowerSlotConfig; 4],

    // === Status ===
    pub status: StatusDurations,
    /// Anti-rehit window; hit attempts are deflected while positive.
    pub targeted: i32,

    // === Combat Memory ===
    pub in_combat: bool,
    pub last_seen: Option<IVec2>,
    pub patrol_ticks: i32,
    pub dir_ticks: i32,

    // === Behavior Tuning ===
    pub threat_range: i32,
    pub melee_range: i32,
    /// Ticks between re-facing the pursuit target.
    pub dir_favor: i32,
    pub chance_pursue: i32,

    // === Collaborator Handoff ===
    pub sfx: SoundCues,
    /// Hazard made by this combatant's attack, waiting to be claimed.
    pub pending_hazard: Option<Hazard>,
    pub rewards: RewardFlags,
    pub defeat_status: Option<String>,
    pub quest_loot: Option<QuestLoot>,
}

impl Default for CombatantState {
    fn default() -> Self {
        Self {
            name: String::new(),
            faction: Faction::Enemy,
            level: 0,
            xp: 0,
            loot_chance: 0,

            pos: IVec2::ZERO,
            direction: Direction::default(),
            cur_state: BehaviorState::Stance,
            cur_frame: 0,
            disp_frame: 0,
            corpse: false,
            anim: AnimationSet::default(),
            render_size: IVec2::new(64, 64),
            render_offset: IVec2::new(32, 48),

            alive: true,
            hp: 1,
            maxhp: 1,
            hp_per_minute: 0,
            hp_ticker: 0,
            mp: 0,
            maxmp: 0,
            mp_per_minute: 0,
            mp_ticker: 0,
            shield_hp: 0,
            shield_frame: 0,
            vengeance_stacks: 0,
            vengeance_frame: 0,

            dmg_melee: DamageRange::new(1, 4),
            dmg_ranged: DamageRange::default(),
            dmg_magic: DamageRange::default(),
            absorb: DamageRange::default(),
            resist_fire: 0,
            resist_ice: 0,
            accuracy: 75,
            avoidance: 25,
            crit: 0,

            speed: 8,
            dspeed: 6,

            cooldown: 0,
            cooldown_ticks: 0,
            slots: Default::default(),

            status: StatusDurations::default(),
            targeted: 0,

            in_combat: false,
            last_seen: None,
            patrol_ticks: 0,
            dir_ticks: 0,

            threat_range: 0,
            melee_range: 64,
            dir_favor: 0,
            chance_pursue: 0,

            sfx: SoundCues::default(),
            pending_hazard: None,
            rewards: RewardFlags::default(),
            defeat_status: None,
            quest_loot: None,
        }
    }
}

impl CombatantState {
    /// Fresh state with full hit points.
    pub fn with_hp(hp: i32) -> Self {
        Self {
            hp,
            maxhp: hp,
            ..Default::default()
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.cur_state.is_terminal()
    }

    /// Alive and not in a death state; the only combatants hazards test against.
    pub fn is_alive(&self) -> bool {
        self.hp > 0 && !self.is_terminal()
    }

    pub fn slot(&self, slot: PowerSlot) -> &PowerSlotConfig {
        &self.slots[slot.index()]
    }

    pub fn slot_mut(&mut self, slot: PowerSlot) -> &mut PowerSlotConfig {
        &mut self.slots[slot.index()]
    }

    /// Enter a new behavior state from its first frame.
    pub fn new_state(&mut self, state: BehaviorState) {
        self.cur_state = state;
        self.cur_frame = 0;
    }

    /// Subtract damage from the shield first, then hit points.
    ///
    /// Hit points clamp at zero, which also clears `alive`.
    pub fn apply_damage(&mut self, amount: i32) {
        let amount = amount.max(0);
        if self.shield_hp > 0 {
            self.shield_hp -= amount;
            if self.shield_hp < 0 {
                self.hp += self.shield_hp;
                self.shield_hp = 0;
            }
        } else {
            self.hp -= amount;
        }

        if self.hp <= 0 {
            self.hp = 0;
            self.alive = false;
        }
    }

    /// Enter the matching death state if hit points have run out.
    ///
    /// This is the only way into DEAD or CRITDEAD. It returns the kind of
    /// death only on the call that actually makes the transition, so rewards
    /// keyed off it fire once.
    pub fn settle_death(&mut self, crit: bool) -> Option<DeathKind> {
        if self.hp > 0 || self.is_terminal() {
            return None;
        }

        self.alive = false;
        self.cur_frame = 0;
        let kind = if crit {
            self.cur_state = BehaviorState::CritDead;
            self.disp_frame = self.anim.critdie.position;
            DeathKind::Critical
        } else {
            self.cur_state = BehaviorState::Dead;
            self.disp_frame = self.anim.die.position;
            DeathKind::Normal
        };
        Some(kind)
    }

    /// Per-tick upkeep: cooldowns, regeneration, status countdown, bleeding,
    /// the anti-rehit window, and decorative counters.
    ///
    /// Does nothing once the combatant is dead.
    pub fn tick(&mut self) {
        if self.is_terminal() || !self.alive {
            return;
        }

        if self.cooldown_ticks > 0 {
            self.cooldown_ticks -= 1;
        }
        for slot in self.slots.iter_mut() {
            if slot.cooldown_ticks > 0 {
                slot.cooldown_ticks -= 1;
            }
        }

        if regen(self.hp_per_minute, &mut self.hp_ticker, self.hp < self.maxhp) {
            self.hp += 1;
        }
        if regen(self.mp_per_minute, &mut self.mp_ticker, self.mp < self.maxmp) {
            self.mp += 1;
        }

        self.status.count_down();

        if self.status.bleed % BLEED_INTERVAL == 1 {
            self.apply_damage(1);
        }

        if self.targeted > 0 {
            self.targeted -= 1;
        }

        self.shield_frame = (self.shield_frame + 1) % SHIELD_FRAME_CYCLE;
        self.vengeance_frame += self.vengeance_stacks;
        if self.vengeance_frame >= VENGEANCE_FRAME_CYCLE {
            self.vengeance_frame -= VENGEANCE_FRAME_CYCLE;
        }
    }

    /// Collect and clear the sound cues raised since the last call.
    pub fn take_sounds(&mut self) -> SoundCues {
        std::mem::take(&mut self.sfx)
    }
}

/// Advance a regeneration ticker. Returns true when a point is due.
fn regen(per_minute: i32, ticker: &mut i32, below_max: bool) -> bool {
    if per_minute <= 0 || !below_max {
        return false;
    }
    *ticker += 1;
    if *ticker >= (60 * TICK_RATE) / per_minute {
        *ticker = 0;
        return true;
    }
    false
}
