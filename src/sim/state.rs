//! Live level state
//!
//! Everything here belongs to one attempt at one level and is thrown away on
//! retry, level select or reset.

use glam::Vec2;
use serde::Serialize;

use crate::levels::{Difficulty, LevelDefinition};

/// Current phase of the attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GamePhase {
    InProgress,
    /// Target reached (terminal)
    LevelComplete,
    /// Vulnerable block pulled or clock ran out (terminal)
    GameOver,
}

/// Why an attempt ended in game over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GameOverReason {
    VulnerableBlock,
    TimeUp,
}

/// A tower block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    /// Unique for the engine's lifetime, never reused across attempts
    pub id: u32,
    /// 0 = bottom
    pub layer: u32,
    pub index_in_layer: u32,
    pub removed: bool,
    /// Fixed at generation
    pub vulnerable: bool,
    // Presentation only
    pub position: Vec2,
    /// Degrees: 0 horizontal, 90 vertical
    pub rotation: f32,
    pub size: Vec2,
}

impl Block {
    /// Points for pulling this block, before any time bonus
    pub fn score(&self, difficulty: Difficulty) -> u64 {
        super::rules::block_score(self.layer, difficulty)
    }
}

/// Hands out block ids
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next_id: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next_id: 1 }
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }
}

/// Notable transitions, drained by the UI
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    LevelStarted {
        level: u32,
    },
    BlockRemoved {
        block_id: u32,
        points: u64,
    },
    LevelCompleted {
        level: u32,
        final_score: u64,
        time_bonus: f64,
        new_best: bool,
    },
    GameOver {
        level: u32,
        reason: GameOverReason,
    },
    AchievementUnlocked {
        id: String,
    },
    NotificationCleared,
    TimeTicked {
        remaining: u32,
    },
}

/// One attempt at a level
#[derive(Debug, Clone, Serialize)]
pub struct LevelSession {
    pub level: LevelDefinition,
    /// Ordered bottom layer first
    pub blocks: Vec<Block>,
    /// Running score; replaced by the bonus-adjusted final score on completion
    pub score: u64,
    /// Read by the perfect-run check; no current rule increments it
    pub mistakes: u32,
    pub blocks_removed: u32,
    /// Unix ms when the attempt started
    pub started_at: f64,
    /// Seconds left on the countdown (None = untimed)
    pub time_remaining: Option<u32>,
    pub phase: GamePhase,
    pub game_over_reason: Option<GameOverReason>,
    /// Multiplier applied at completion (1.0 until then)
    pub time_bonus: f64,
    /// Generation token; queued countdown ticks only apply while it matches
    pub token: u64,
    /// A leaderboard entry was already recorded for this attempt
    pub submitted: bool,
}

impl LevelSession {
    pub fn new(level: LevelDefinition, blocks: Vec<Block>, started_at: f64, token: u64) -> Self {
        Self {
            level,
            blocks,
            score: 0,
            mistakes: 0,
            blocks_removed: 0,
            started_at,
            time_remaining: level.time_limit,
            phase: GamePhase::InProgress,
            game_over_reason: None,
            time_bonus: 1.0,
            token,
            submitted: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::InProgress
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    pub fn is_complete(&self) -> bool {
        self.phase == GamePhase::LevelComplete
    }

    pub fn block(&self, id: u32) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub(crate) fn block_index(&self, id: u32) -> Option<usize> {
        self.blocks.iter().position(|b| b.id == id)
    }

    pub fn blocks_left_to_target(&self) -> u32 {
        self.level.target_blocks.saturating_sub(self.blocks_removed)
    }
}
