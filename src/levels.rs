//! Level catalog
//!
//! Fixed, ordered list of tower levels. Ids are contiguous starting at 1.

use serde::{Deserialize, Serialize};

/// Difficulty tier of a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
    Expert,
}

/// Block dimensions used when laying out a tower
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockLayout {
    pub width: f32,
    pub height: f32,
    pub spacing: f32,
}

impl Difficulty {
    /// Multiplier applied to every block's base score
    pub fn score_multiplier(&self) -> u64 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
            Difficulty::Expert => 4,
        }
    }

    /// Block size and gap preset (harder tiers are smaller and tighter)
    pub fn layout(&self) -> BlockLayout {
        let (width, height, spacing) = match self {
            Difficulty::Easy => (85.0, 28.0, 6.0),
            Difficulty::Medium => (75.0, 24.0, 5.0),
            Difficulty::Hard => (70.0, 22.0, 4.0),
            Difficulty::Expert => (65.0, 20.0, 3.0),
        };
        BlockLayout {
            width,
            height,
            spacing,
        }
    }
}

/// Immutable definition of a single level
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelDefinition {
    /// Sequential id, 1-based
    pub id: u32,
    pub name: &'static str,
    /// Blocks that must be removed to clear the level
    pub target_blocks: u32,
    /// Interior blocks marked vulnerable at generation
    pub vulnerable_blocks: u32,
    pub layers: u32,
    /// Countdown in seconds (None = untimed)
    pub time_limit: Option<u32>,
    pub difficulty: Difficulty,
}

impl LevelDefinition {
    pub fn is_timed(&self) -> bool {
        self.time_limit.is_some()
    }

    /// Total blocks in a freshly generated tower
    pub fn block_count(&self) -> u32 {
        self.layers * crate::consts::BLOCKS_PER_LAYER
    }
}

static LEVELS: [LevelDefinition; 8] = [
    level(1, "First Steps", 3, 2, 6, None, Difficulty::Easy),
    level(2, "Rising Tower", 5, 3, 8, None, Difficulty::Easy),
    level(3, "Balance Master", 7, 4, 10, Some(120), Difficulty::Medium),
    level(4, "Precision", 9, 5, 12, Some(100), Difficulty::Medium),
    level(5, "Tower Challenge", 12, 6, 14, Some(90), Difficulty::Hard),
    level(6, "Expert Builder", 15, 7, 16, Some(80), Difficulty::Hard),
    level(
        7,
        "Master Architect",
        18,
        8,
        18,
        Some(70),
        Difficulty::Expert,
    ),
    level(8, "Ultimate Test", 22, 10, 20, Some(60), Difficulty::Expert),
];

const fn level(
    id: u32,
    name: &'static str,
    target_blocks: u32,
    vulnerable_blocks: u32,
    layers: u32,
    time_limit: Option<u32>,
    difficulty: Difficulty,
) -> LevelDefinition {
    LevelDefinition {
        id,
        name,
        target_blocks,
        vulnerable_blocks,
        layers,
        time_limit,
        difficulty,
    }
}

/// All levels, ordered by id
pub fn definitions() -> &'static [LevelDefinition] {
    &LEVELS
}

/// Number of levels in the catalog
pub fn count() -> u32 {
    LEVELS.len() as u32
}

/// Look up a level by id
pub fn get(id: u32) -> Option<&'static LevelDefinition> {
    id.checked_sub(1).and_then(|i| LEVELS.get(i as usize))
}

/// First level of the catalog
pub fn first() -> &'static LevelDefinition {
    &LEVELS[0]
}
