//! Persisted player progress
//!
//! One `GameState` per player. The engine mutates a working copy and commits
//! it through [`crate::persistence::ProgressStore`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::achievements::{self, Achievement};
use crate::levels;

/// Durable progress record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Level the player last selected
    pub current_level: u32,
    /// Highest level the player may select (never decreases)
    pub unlocked_level: u32,
    pub total_score: u64,
    /// All-time blocks removed across every session
    pub blocks_removed: u64,
    /// Best final score per completed level id
    #[serde(default)]
    pub level_scores: BTreeMap<u32, u64>,
    /// Levels completed in a row without a game over
    #[serde(default)]
    pub streak: u32,
    pub achievements: Vec<Achievement>,
    /// Unix timestamp (ms) of the last commit
    #[serde(default)]
    pub last_played: Option<f64>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    /// Fresh progress: level 1 unlocked, nothing earned
    pub fn new() -> Self {
        Self {
            current_level: 1,
            unlocked_level: 1,
            total_score: 0,
            blocks_removed: 0,
            level_scores: BTreeMap::new(),
            streak: 0,
            achievements: achievements::definitions(),
            last_played: None,
        }
    }

    /// Number of levels actually completed
    pub fn levels_completed(&self) -> u32 {
        self.unlocked_level.saturating_sub(1)
    }

    pub fn best_score(&self, level_id: u32) -> Option<u64> {
        self.level_scores.get(&level_id).copied()
    }

    pub fn is_unlocked(&self, level_id: u32) -> bool {
        level_id >= 1 && level_id <= self.unlocked_level
    }

    /// Record a final score; keeps it only if it beats the stored best.
    /// Returns true when the best changed.
    pub fn record_level_score(&mut self, level_id: u32, score: u64) -> bool {
        let previous = self.best_score(level_id).unwrap_or(0);
        if score > previous {
            self.level_scores.insert(level_id, score);
            true
        } else {
            false
        }
    }

    /// Raise the unlocked level after clearing `level_id`, bounded by the catalog
    pub fn unlock_after(&mut self, level_id: u32) {
        if level_id >= self.unlocked_level {
            self.unlocked_level = (level_id + 1).min(levels::count());
        }
    }

    pub fn achievement(&self, id: &str) -> Option<&Achievement> {
        self.achievements.iter().find(|a| a.id == id)
    }

    /// Bring a loaded record back within catalog bounds.
    /// Returns true if anything was changed.
    pub fn sanitize(&mut self) -> bool {
        let before = (self.current_level, self.unlocked_level);
        let max = levels::count();
        self.unlocked_level = self.unlocked_level.clamp(1, max);
        self.current_level = self.current_level.clamp(1, max);
        self.level_scores.retain(|id, _| *id >= 1 && *id <= max);
        let added = achievements::merge_missing(&mut self.achievements);
        before != (self.current_level, self.unlocked_level) || added > 0
    }

    /// Summary for stats screens
    pub fn stats(&self) -> PlayerStats {
        PlayerStats {
            total_score: self.total_score,
            levels_completed: self.levels_completed(),
            total_levels: levels::count(),
            blocks_removed: self.blocks_removed,
            achievements_unlocked: self.achievements.iter().filter(|a| a.unlocked).count(),
            achievements_total: self.achievements.len(),
            best_scores: self.level_scores.iter().map(|(k, v)| (*k, *v)).collect(),
        }
    }
}

/// Derived statistics shown on menus
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerStats {
    pub total_score: u64,
    pub levels_completed: u32,
    pub total_levels: u32,
    pub blocks_removed: u64,
    pub achievements_unlocked: usize,
    pub achievements_total: usize,
    /// (level id, best score), sorted by level id
    pub best_scores: Vec<(u32, u64)>,
}
