//! Level simulation module
//!
//! All gameplay logic lives here. This module stays free of rendering and
//! platform code:
//! - Time comes from an injected clock
//! - Seeded RNG only
//! - Deferred work goes through a token-checked task queue

pub mod engine;
pub mod rules;
pub mod state;
pub mod timers;
pub mod tower;

pub use engine::{EngineConfig, EngineSnapshot, GameEngine, Notification};
pub use rules::{CompletionFlags, TimeBonus, block_score, final_score, time_bonus};
pub use state::{Block, GameEvent, GameOverReason, GamePhase, IdAllocator, LevelSession};
pub use timers::{Task, TaskQueue};
pub use tower::{generate, mark_vulnerable};
