//! Defeat rewards: loot roll, experience, quest loot and story flags.

use bevy::prelude::*;

use super::components::Roller;
use super::services::StoryStatus;
use super::stats::CombatantState;

/// Flag the rewards for a combatant that has just died.
///
/// Call once per death; `CombatantState::settle_death` decides when.
pub fn grant_rewards(state: &mut CombatantState, rng: &mut dyn Roller, story: &mut dyn StoryStatus) {
    if rng.percent() < state.loot_chance {
        state.rewards.loot_drop = true;
    }
    state.rewards.xp = Some(state.xp);

    if let Some(quest) = &state.quest_loot {
        let required = quest
            .requires
            .as_deref()
            .map_or(true, |id| story.check_status(id));
        let excluded = quest
            .not
            .as_deref()
            .map_or(false, |id| story.check_status(id));
        if quest.item != 0 && required && !excluded {
            state.rewards.forced_loot = Some(quest.item);
        }
    }

    if let Some(status) = &state.defeat_status {
        story.set_status(status);
    }

    info!(
        "{} defeated: {} xp{}{}",
        state.name,
        state.xp,
        if state.rewards.loot_drop { ", loot" } else { "" },
        if state.rewards.forced_loot.is_some() { ", quest loot" } else { "" },
    );
}
