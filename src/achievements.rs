//! Achievement catalog
//!
//! Seeds the achievement list stored in a new save. Unlock rules live in
//! [`crate::sim::rules`].

use serde::{Deserialize, Serialize};

pub const FIRST_BLOCK: &str = "first_block";
pub const BLOCKS_10: &str = "blocks_10";
pub const BLOCKS_50: &str = "blocks_50";
pub const BLOCKS_100: &str = "blocks_100";
pub const LEVEL_3: &str = "level_3";
pub const LEVEL_5: &str = "level_5";
pub const LEVEL_8: &str = "level_8";
pub const NO_MISTAKES: &str = "no_mistakes";
pub const SPEED_DEMON: &str = "speed_demon";
pub const STREAK_5: &str = "streak_5";

/// A single achievement and the player's progress toward it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    /// Stable key, survives catalog reordering
    pub id: String,
    pub title: String,
    pub description: String,
    /// Threshold the tracked stat must reach
    pub requirement: u32,
    /// Once true, never reverts
    pub unlocked: bool,
    pub progress: u32,
    /// Icon name for the UI
    #[serde(default)]
    pub icon: String,
}

impl Achievement {
    fn new(id: &str, title: &str, description: &str, requirement: u32, icon: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            requirement,
            unlocked: false,
            progress: 0,
            icon: icon.to_string(),
        }
    }

    /// Progress toward the requirement, clamped to 0.0..=1.0
    pub fn fraction(&self) -> f32 {
        if self.unlocked || self.requirement == 0 {
            return 1.0;
        }
        (self.progress as f32 / self.requirement as f32).min(1.0)
    }
}

/// Fresh catalog with nothing unlocked
pub fn definitions() -> Vec<Achievement> {
    vec![
        Achievement::new(
            FIRST_BLOCK,
            "First Touch",
            "Remove your first block",
            1,
            "hand.tap",
        ),
        Achievement::new(
            BLOCKS_10,
            "Getting Started",
            "Remove 10 blocks total",
            10,
            "square.stack.3d.up",
        ),
        Achievement::new(
            BLOCKS_50,
            "Block Remover",
            "Remove 50 blocks total",
            50,
            "cube.box",
        ),
        Achievement::new(
            BLOCKS_100,
            "Century Club",
            "Remove 100 blocks total",
            100,
            "shippingbox",
        ),
        Achievement::new(
            LEVEL_3,
            "Rising Up",
            "Complete level 3",
            3,
            "arrow.up.circle",
        ),
        Achievement::new(
            LEVEL_5,
            "Halfway There",
            "Complete level 5",
            5,
            "star.circle",
        ),
        Achievement::new(LEVEL_8, "Master Player", "Complete all levels", 8, "crown"),
        Achievement::new(
            NO_MISTAKES,
            "Perfect Run",
            "Complete a level without mistakes",
            1,
            "checkmark.seal",
        ),
        Achievement::new(
            SPEED_DEMON,
            "Speed Demon",
            "Complete a timed level with over 70% of the clock left",
            1,
            "bolt.circle",
        ),
        Achievement::new(
            STREAK_5,
            "On Fire",
            "Complete 5 levels in a row",
            5,
            "flame",
        ),
    ]
}

/// Append catalog entries missing from `list`, leaving existing ones untouched.
/// Returns how many were added.
pub fn merge_missing(list: &mut Vec<Achievement>) -> usize {
    let missing: Vec<Achievement> = definitions()
        .into_iter()
        .filter(|def| !list.iter().any(|a| a.id == def.id))
        .collect();
    let added = missing.len();
    list.extend(missing);
    added
}
