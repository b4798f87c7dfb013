//! Stat Templates
//!
//! Creature stat blocks are plain `key=value` text files under
//! `assets/creatures/`. Lines starting with `#` are comments and `[section]`
//! headers are skipped. Unknown keys are ignored so templates can carry
//! data for other subsystems.

use std::path::Path;

use bevy::prelude::*;

use super::components::{PowerId, PowerSlot};
use super::stats::{Animation, CombatantState, QuestLoot};

/// Load a stat template from disk.
pub fn load_template(path: impl AsRef<Path>) -> Result<CombatantState, String> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read template {}: {}", path.display(), e))?;

    let state = parse_template(&contents);
    info!("Loaded creature template '{}' from {}", state.name, path.display());
    Ok(state)
}

/// Build a combatant from template text.
///
/// Parsing never fails: malformed numbers read as zero and unknown keys are
/// skipped, each with a log line.
pub fn parse_template(contents: &str) -> CombatantState {
    let mut state = CombatantState::default();
    let mut dspeed_set = false;

    for (line_no, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('[') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            debug!("Template line {} has no '=': {}", line_no + 1, line);
            continue;
        };
        let key = key.trim();
        let value = value.trim();

        if key == "dspeed" {
            dspeed_set = true;
        }
        apply_key(&mut state, key, value);
    }

    if !dspeed_set {
        state.dspeed = diagonal_speed(state.speed);
    }
    state
}

/// Straight speed scaled by cos 45°, the displacement of a diagonal step.
pub fn diagonal_speed(speed: i32) -> i32 {
    (speed as f32 * std::f32::consts::FRAC_1_SQRT_2).round() as i32
}

fn apply_key(state: &mut CombatantState, key: &str, value: &str) {
    let num = || parse_int(key, value);

    match key {
        "name" => state.name = value.to_string(),
        "level" => state.level = num(),
        "xp" => state.xp = num(),
        "loot_chance" => state.loot_chance = num(),
        "hp" => {
            state.hp = num();
            state.maxhp = state.hp;
        }
        "mp" => {
            state.mp = num();
            state.maxmp = state.mp;
        }
        "hp_per_minute" => state.hp_per_minute = num(),
        "mp_per_minute" => state.mp_per_minute = num(),
        "cooldown" => state.cooldown = num(),
        "accuracy" => state.accuracy = num(),
        "avoidance" => state.avoidance = num(),
        "crit" => state.crit = num(),

        "dmg_melee_min" => state.dmg_melee.min = num(),
        "dmg_melee_max" => state.dmg_melee.max = num(),
        "dmg_ranged_min" => state.dmg_ranged.min = num(),
        "dmg_ranged_max" => state.dmg_ranged.max = num(),
        "dmg_magic_min" => state.dmg_magic.min = num(),
        "dmg_magic_max" => state.dmg_magic.max = num(),
        "absorb_min" => state.absorb.min = num(),
        "absorb_max" => state.absorb.max = num(),
        "resist_fire" => state.resist_fire = num(),
        "resist_ice" => state.resist_ice = num(),

        "speed" => state.speed = num(),
        "dspeed" => state.dspeed = num(),
        "dir_favor" => state.dir_favor = num(),
        "threat_range" => state.threat_range = num(),
        "melee_range" => state.melee_range = num(),
        "chance_pursue" => state.chance_pursue = num(),

        "render_size_x" => state.render_size.x = num(),
        "render_size_y" => state.render_size.y = num(),
        "render_offset_x" => state.render_offset.x = num(),
        "render_offset_y" => state.render_offset.y = num(),

        "defeat_status" => state.defeat_status = Some(value.to_string()),
        "quest_loot_requires" => quest_loot(state).requires = Some(value.to_string()),
        "quest_loot_not" => quest_loot(state).not = Some(value.to_string()),
        "quest_loot_id" => quest_loot(state).item = num().max(0) as u32,

        _ => {
            if !apply_slot_key(state, key, value) && !apply_anim_key(state, key, value) {
                debug!("Ignoring unknown template key '{}'", key);
            }
        }
    }
}

/// `chance_*`, `power_*` and `cooldown_*` keys for the four attack slots.
fn apply_slot_key(state: &mut CombatantState, key: &str, value: &str) -> bool {
    let Some((field, slot_name)) = key.split_once('_') else {
        return false;
    };
    let slot = match slot_name {
        "melee_phys" => PowerSlot::MeleePhys,
        "ranged_phys" => PowerSlot::RangedPhys,
        "melee_mag" => PowerSlot::MeleeMystic,
        "ranged_mag" => PowerSlot::RangedMystic,
        _ => return false,
    };

    match field {
        "chance" => state.slot_mut(slot).chance = parse_int(key, value),
        "power" => state.slot_mut(slot).power = PowerId::new(value),
        "cooldown" => state.slot_mut(slot).cooldown = parse_int(key, value),
        _ => return false,
    }
    true
}

/// `anim_<name>_{position,frames,duration}` keys.
fn apply_anim_key(state: &mut CombatantState, key: &str, value: &str) -> bool {
    let Some(rest) = key.strip_prefix("anim_") else {
        return false;
    };
    let Some((name, field)) = rest.rsplit_once('_') else {
        return false;
    };

    let anim: &mut Animation = match name {
        "stance" => &mut state.anim.stance,
        "run" => &mut state.anim.run,
        "melee" => &mut state.anim.melee,
        "ranged" => &mut state.anim.ranged,
        "magic" => &mut state.anim.magic,
        "hit" => &mut state.anim.hit,
        "die" => &mut state.anim.die,
        "critdie" => &mut state.anim.critdie,
        _ => return false,
    };

    match field {
        "position" => anim.position = parse_int(key, value),
        "frames" => anim.frames = parse_int(key, value),
        "duration" => anim.duration = parse_int(key, value),
        _ => return false,
    }
    true
}

fn quest_loot(state: &mut CombatantState) -> &mut QuestLoot {
    state.quest_loot.get_or_insert_with(QuestLoot::default)
}

fn parse_int(key: &str, value: &str) -> i32 {
    value.parse().unwrap_or_else(|_| {
        warn!("Template key '{}' has non-numeric value '{}', using 0", key, value);
        0
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOBLIN: &str = "
# Goblin spearman
[stats]
name=Goblin
level=2
xp=14
hp=12
speed=10
dmg_melee_min=2
dmg_melee_max=5
absorb_min = 0
absorb_max = 1
threat_range=320
chance_pursue=40
chance_melee_phys=60
power_melee_phys=spear_thrust
cooldown_melee_phys=15
anim_die_position=16
anim_die_frames=4
anim_die_duration=3
loot_chance=25
favourite_colour=green
";

    #[test]
    fn test_parse_basic_fields() {
        let state = parse_template(GOBLIN);
        assert_eq!(state.name, "Goblin");
        assert_eq!(state.level, 2);
        assert_eq!(state.xp, 14);
        assert_eq!(state.hp, 12);
        assert_eq!(state.maxhp, 12);
        assert_eq!(state.dmg_melee.min, 2);
        assert_eq!(state.dmg_melee.max, 5);
        assert_eq!(state.absorb.max, 1, "Whitespace around '=' is trimmed");
        assert_eq!(state.threat_range, 320);
        assert_eq!(state.loot_chance, 25);
    }

    #[test]
    fn test_parse_slot_keys() {
        let state = parse_template(GOBLIN);
        let slot = state.slot(PowerSlot::MeleePhys);
        assert_eq!(slot.power.as_str(), "spear_thrust");
        assert_eq!(slot.chance, 60);
        assert_eq!(slot.cooldown, 15);
        assert_eq!(state.slot(PowerSlot::RangedMystic).chance, 0);
    }

    #[test]
    fn test_parse_animation_keys() {
        let state = parse_template(GOBLIN);
        assert_eq!(state.anim.die.position, 16);
        assert_eq!(state.anim.die.frames, 4);
        assert_eq!(state.anim.die.duration, 3);
    }

    #[test]
    fn test_dspeed_defaults_to_diagonal() {
        let state = parse_template(GOBLIN);
        assert_eq!(state.dspeed, 7, "10 * cos45 rounds to 7");

        let state = parse_template("speed=10\ndspeed=9");
        assert_eq!(state.dspeed, 9, "Explicit dspeed wins");
    }

    #[test]
    fn test_malformed_number_reads_as_zero() {
        let state = parse_template("hp=lots\nlevel=3");
        assert_eq!(state.hp, 0);
        assert_eq!(state.level, 3);
    }

    #[test]
    fn test_quest_loot_keys() {
        let state = parse_template(
            "quest_loot_requires=met_elder\nquest_loot_not=has_key\nquest_loot_id=9100\ndefeat_status=ogre_dead",
        );
        let loot = state.quest_loot.as_ref().expect("quest loot should be set");
        assert_eq!(loot.requires.as_deref(), Some("met_elder"));
        assert_eq!(loot.not.as_deref(), Some("has_key"));
        assert_eq!(loot.item, 9100);
        assert_eq!(state.defeat_status.as_deref(), Some("ogre_dead"));
    }

    #[test]
    fn test_load_missing_file_errors() {
        let result = load_template("assets/creatures/does_not_exist.txt");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("does_not_exist"));
    }
}
