//! Combat logging
//!
//! Records combat events stamped with the simulation tick, for inspection in
//! tests and for saving after a headless run.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Where `save_to_file` writes when no path is given.
pub const DEFAULT_LOG_PATH: &str = "combat_logs/latest.json";

/// A single entry in the combat log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatLogEntry {
    /// Simulation tick the event happened on
    pub tick: u64,
    /// The type of event
    pub event_type: CombatLogEventType,
    /// Human-readable description of the event
    pub message: String,
}

/// Types of combat log events for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatLogEventType {
    /// Damage dealt by a hazard
    Damage,
    /// Hit attempt that failed the accuracy roll
    Miss,
    /// A creature activated one of its powers
    PowerUsed,
    /// A combatant noticed or lost track of the hero
    Awareness,
    /// Combatant died
    Death,
    /// Loot or experience flagged on a death
    Reward,
    /// Scenario event (start, end, etc.)
    MatchEvent,
}

/// Saved form of a log, with caller-supplied metadata.
#[derive(Serialize)]
struct SavedLog<'a, M: Serialize> {
    metadata: &'a M,
    entries: &'a [CombatLogEntry],
}

/// The combat log resource storing all events
#[derive(Resource, Default, Debug)]
pub struct CombatLog {
    /// All log entries in chronological order
    pub entries: Vec<CombatLogEntry>,
    /// Current simulation tick
    pub tick: u64,
}

impl CombatLog {
    /// Clear the log for a new run
    pub fn clear(&mut self) {
        self.entries.clear();
        self.tick = 0;
    }

    /// Add a new entry to the log
    pub fn log(&mut self, event_type: CombatLogEventType, message: String) {
        self.entries.push(CombatLogEntry {
            tick: self.tick,
            event_type,
            message,
        });
    }

    /// Get entries filtered by event type
    pub fn filter_by_type(&self, event_type: CombatLogEventType) -> Vec<&CombatLogEntry> {
        self.entries
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Count entries of one type
    pub fn count(&self, event_type: CombatLogEventType) -> usize {
        self.entries
            .iter()
            .filter(|e| e.event_type == event_type)
            .count()
    }

    /// Get the last N entries
    pub fn recent(&self, count: usize) -> Vec<&CombatLogEntry> {
        self.entries.iter().rev().take(count).rev().collect()
    }

    /// Write the log and metadata as pretty JSON.
    ///
    /// Returns the path written.
    pub fn save_to_file<M: Serialize>(
        &self,
        metadata: &M,
        path: Option<&str>,
    ) -> Result<String, String> {
        let path = path.unwrap_or(DEFAULT_LOG_PATH);

        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;
            }
        }

        let saved = SavedLog {
            metadata,
            entries: &self.entries,
        };
        let json = serde_json::to_string_pretty(&saved)
            .map_err(|e| format!("Failed to serialize combat log: {}", e))?;
        std::fs::write(path, json).map_err(|e| format!("Failed to write {}: {}", path, e))?;

        Ok(path.to_string())
    }
}
