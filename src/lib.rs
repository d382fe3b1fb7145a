//! Tower Pull - a block-pulling tower puzzle
//!
//! Core modules:
//! - `sim`: Level engine (tower generation, scoring, timers, state machine)
//! - `levels` / `achievements`: Static catalogs
//! - `progress`: Persisted player progress
//! - `leaderboard`: Local top scores
//! - `persistence`: Key-value backends and typed save/load
//! - `platform`: Browser/native clock and logger

pub mod achievements;
pub mod leaderboard;
pub mod levels;
pub mod persistence;
pub mod platform;
pub mod progress;
pub mod settings;
pub mod sim;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use leaderboard::{Leaderboard, LeaderboardEntry};
pub use levels::{Difficulty, LevelDefinition};
pub use persistence::{KeyValueStore, MemoryStore, ProgressStore, StoreError};
pub use platform::{Clock, ManualClock, SystemClock};
pub use progress::{GameState, PlayerStats};
pub use settings::Settings;
pub use sim::{EngineConfig, GameEngine, GameEvent, GamePhase};

/// Game configuration constants
pub mod consts {
    /// Blocks in every tower layer
    pub const BLOCKS_PER_LAYER: u32 = 3;

    /// Points for a bottom-layer block before the difficulty multiplier
    pub const BASE_BLOCK_SCORE: u64 = 10;
    /// Extra points per layer above the bottom
    pub const LAYER_SCORE_BONUS: u64 = 5;

    /// Share of the time limit that must remain for a speed run
    pub const SPEED_BONUS_THRESHOLD: f64 = 0.7;

    /// Countdown step (ms)
    pub const TICK_INTERVAL_MS: f64 = 1000.0;
    /// How long an unlock notification stays up (ms)
    pub const NOTIFICATION_DURATION_MS: f64 = 3000.0;
}
