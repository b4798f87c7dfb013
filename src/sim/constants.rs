//! Simulation Constants
//!
//! Centralized location for the fixed numbers the combat core runs on.
//! Per-creature tuning (ranges, chances, speeds) lives in stat templates instead.

// ============================================================================
// Timing
// ============================================================================

/// Simulation ticks per second. Regeneration rates are expressed per minute
/// and converted with this.
pub const TICK_RATE: i32 = 30;

/// Bleeding deals one point of damage every this many ticks.
pub const BLEED_INTERVAL: i32 = 30;

/// After being hit, a combatant ignores further hit attempts for this many ticks.
/// Keeps slow, wide hazards from re-rolling against the same target every frame.
pub const REHIT_WINDOW: i32 = 5;

/// How long a creature keeps walking past the last place it saw the hero.
pub const PATROL_TICKS: i32 = 8;

/// Length of the camera shake requested by a critical hit.
pub const CAMERA_SHAKE_TICKS: i32 = 8;

// ============================================================================
// Combat Resolution
// ============================================================================

/// Flat bonus added to `accuracy - avoidance` before the hit roll.
pub const BASE_HIT_BONUS: i32 = 25;

// ============================================================================
// Map
// ============================================================================

/// World units per map tile.
pub const UNITS_PER_TILE: i32 = 64;

// ============================================================================
// Decorative Effect Cycles
// ============================================================================

/// Shield shimmer cycle length in ticks.
pub const SHIELD_FRAME_CYCLE: i32 = 12;

/// Vengeance glow cycle length.
pub const VENGEANCE_FRAME_CYCLE: i32 = 24;

/// Hazard sprite cell size in pixels.
pub const HAZARD_CELL_SIZE: i32 = 64;
