//! Renderable descriptors handed to the sprite renderer.

use bevy::prelude::*;

use super::constants::HAZARD_CELL_SIZE;
use super::hazard::Hazard;
use super::stats::CombatantState;

/// Where and what to draw for one map object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Renderable {
    pub map_pos: IVec2,
    /// Source rectangle in the sprite sheet.
    pub src: IRect,
    pub offset: IVec2,
    /// Objects draw above corpses so floor loot stays visible.
    pub object_layer: bool,
}

impl Renderable {
    pub fn for_combatant(state: &CombatantState) -> Self {
        let size = state.render_size;
        let min = IVec2::new(size.x * state.disp_frame, size.y * state.direction.index());
        Self {
            map_pos: state.pos,
            src: IRect::from_corners(min, min + size),
            offset: state.render_offset,
            object_layer: !state.corpse,
        }
    }

    pub fn for_hazard(hazard: &Hazard) -> Self {
        let column = hazard.frame / hazard.frame_duration.max(1);
        let min = IVec2::new(
            HAZARD_CELL_SIZE * column,
            HAZARD_CELL_SIZE * hazard.direction.index(),
        );
        Self {
            map_pos: hazard.grid_pos(),
            src: IRect::from_corners(min, min + IVec2::splat(HAZARD_CELL_SIZE)),
            offset: IVec2::new(HAZARD_CELL_SIZE / 2, HAZARD_CELL_SIZE),
            object_layer: true,
        }
    }
}
