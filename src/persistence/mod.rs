//! Save/load persistence
//!
//! Features:
//! - Pluggable key-value backends (memory, file directory, LocalStorage)
//! - Versioned JSON envelope for progress
//! - Atomic writes on the file backend (tmp → rename)
//! - Corruption falls back to fresh progress

#[cfg(not(target_arch = "wasm32"))]
mod file;
#[cfg(target_arch = "wasm32")]
mod local;
mod memory;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::leaderboard::{Leaderboard, LeaderboardEntry};
use crate::progress::GameState;
use crate::settings::Settings;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStore;
#[cfg(target_arch = "wasm32")]
pub use local::LocalStorageStore;
pub use memory::MemoryStore;

/// Current progress envelope version
pub const SAVE_VERSION: u32 = 1;

/// Failure reported by a storage backend
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not encode or decode stored value: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Raw string storage the progress store writes through
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    /// Replace the value for `key`; a failed write must leave the old value intact
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// Storage keys for each persisted record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreKeys {
    pub game_state: String,
    pub leaderboard: String,
    pub settings: String,
}

impl Default for StoreKeys {
    fn default() -> Self {
        Self {
            game_state: "tower_pull_game_state".to_string(),
            leaderboard: "tower_pull_leaderboard".to_string(),
            settings: "tower_pull_settings".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct SaveEnvelope<T> {
    version: u32,
    data: T,
}

/// Typed load/save of progress, leaderboard and settings
#[derive(Debug, Clone)]
pub struct ProgressStore<S> {
    backend: S,
    keys: StoreKeys,
}

impl<S: KeyValueStore> ProgressStore<S> {
    pub fn new(backend: S) -> Self {
        Self::with_keys(backend, StoreKeys::default())
    }

    pub fn with_keys(backend: S, keys: StoreKeys) -> Self {
        Self { backend, keys }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn keys(&self) -> &StoreKeys {
        &self.keys
    }

    /// Load progress, falling back to fresh progress on any failure
    pub fn load(&self) -> GameState {
        match self.try_load() {
            Ok(Some(mut state)) => {
                if state.sanitize() {
                    log::warn!("Loaded progress was out of bounds, repaired");
                }
                log::info!(
                    "Loaded progress (level {}, unlocked {})",
                    state.current_level,
                    state.unlocked_level
                );
                state
            }
            Ok(None) => {
                log::info!("No saved progress found, starting fresh");
                GameState::new()
            }
            Err(e) => {
                log::warn!("Saved progress unreadable, starting fresh: {}", e);
                GameState::new()
            }
        }
    }

    fn try_load(&self) -> Result<Option<GameState>, StoreError> {
        let Some(json) = self.backend.get(&self.keys.game_state)? else {
            return Ok(None);
        };
        let envelope: SaveEnvelope<GameState> = serde_json::from_str(&json)?;
        if envelope.version != SAVE_VERSION {
            log::warn!("Unsupported save version {}", envelope.version);
            return Ok(None);
        }
        Ok(Some(envelope.data))
    }

    pub fn save(&mut self, state: &GameState) -> Result<(), StoreError> {
        let json = serde_json::to_string(&SaveEnvelope {
            version: SAVE_VERSION,
            data: state,
        })?;
        self.backend.set(&self.keys.game_state, &json)?;
        log::info!("Progress saved (total score {})", state.total_score);
        Ok(())
    }

    /// Delete saved progress so the next load starts fresh
    pub fn reset(&mut self) -> Result<(), StoreError> {
        self.backend.remove(&self.keys.game_state)?;
        log::info!("Progress reset");
        Ok(())
    }

    pub fn load_leaderboard(&self) -> Leaderboard {
        let loaded = self
            .backend
            .get(&self.keys.leaderboard)
            .and_then(|json| match json {
                Some(json) => Ok(Some(serde_json::from_str::<Vec<LeaderboardEntry>>(&json)?)),
                None => Ok(None),
            });
        match loaded {
            Ok(Some(entries)) => Leaderboard::from_entries(entries),
            Ok(None) => Leaderboard::new(),
            Err(e) => {
                log::warn!("Leaderboard unreadable, starting empty: {}", e);
                Leaderboard::new()
            }
        }
    }

    pub fn save_leaderboard(&mut self, board: &Leaderboard) -> Result<(), StoreError> {
        let json = serde_json::to_string(board)?;
        self.backend.set(&self.keys.leaderboard, &json)?;
        log::info!("Leaderboard saved ({} entries)", board.len());
        Ok(())
    }

    /// Insert an entry and persist the board.
    /// Returns the rank achieved, or None if it didn't make the top entries.
    pub fn add_leaderboard_entry(
        &mut self,
        entry: LeaderboardEntry,
    ) -> Result<Option<usize>, StoreError> {
        let mut board = self.load_leaderboard();
        let rank = board.insert(entry);
        self.save_leaderboard(&board)?;
        Ok(rank)
    }

    pub fn load_settings(&self) -> Settings {
        match self.backend.get(&self.keys.settings) {
            Ok(Some(json)) => serde_json::from_str::<Settings>(&json)
                .map(Settings::sanitized)
                .unwrap_or_else(|e| {
                    log::warn!("Settings unreadable, using defaults: {}", e);
                    Settings::default()
                }),
            Ok(None) => Settings::default(),
            Err(e) => {
                log::warn!("Settings unavailable, using defaults: {}", e);
                Settings::default()
            }
        }
    }

    pub fn save_settings(&mut self, settings: &Settings) -> Result<(), StoreError> {
        let json = serde_json::to_string(settings)?;
        self.backend.set(&self.keys.settings, &json)?;
        log::info!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ProgressStore<MemoryStore> {
        ProgressStore::new(MemoryStore::new())
    }

    #[test]
    fn test_load_without_save_is_fresh() {
        assert_eq!(store().load(), GameState::new());
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let mut store = store();
        let mut state = GameState::new();
        state.unlocked_level = 4;
        state.current_level = 3;
        state.total_score = 900;
        state.blocks_removed = 31;
        state.streak = 2;
        state.record_level_score(1, 45);
        state.record_level_score(3, 500);
        state.achievements[1].unlocked = true;
        state.achievements[1].progress = 31;
        state.last_played = Some(12345.0);

        store.save(&state).unwrap();
        assert_eq!(store.load(), state);
    }

    #[test]
    fn test_current_level_ahead_of_unlocked_survives_reload() {
        let mut store = store();
        let mut state = GameState::new();
        state.current_level = 2;
        state.unlocked_level = 1;

        store.save(&state).unwrap();
        assert_eq!(store.load(), state);
    }

    #[test]
    fn test_garbage_decodes_to_fresh() {
        let mut backend = MemoryStore::new();
        backend.set("tower_pull_game_state", "{not json").unwrap();
        let store = ProgressStore::new(backend);
        assert_eq!(store.load(), GameState::new());
    }

    #[test]
    fn test_unknown_version_is_fresh() {
        let mut backend = MemoryStore::new();
        let json = serde_json::json!({ "version": 99, "data": GameState::new() }).to_string();
        backend.set("tower_pull_game_state", &json).unwrap();
        assert_eq!(ProgressStore::new(backend).load(), GameState::new());
    }

    #[test]
    fn test_reset_clears_progress_only() {
        let mut store = store();
        let mut state = GameState::new();
        state.total_score = 10;
        store.save(&state).unwrap();
        store
            .add_leaderboard_entry(LeaderboardEntry::new("a", 10, 1, 0.0))
            .unwrap();

        store.reset().unwrap();
        assert_eq!(store.load(), GameState::new());
        assert_eq!(store.load_leaderboard().len(), 1);
    }

    #[test]
    fn test_leaderboard_persists_sorted() {
        let mut store = store();
        for score in [30, 90, 60] {
            store
                .add_leaderboard_entry(LeaderboardEntry::new("p", score, 1, 0.0))
                .unwrap();
        }
        let scores: Vec<u64> = store
            .load_leaderboard()
            .entries()
            .iter()
            .map(|e| e.score)
            .collect();
        assert_eq!(scores, vec![90, 60, 30]);
    }

    #[test]
    fn test_unsorted_stored_leaderboard_is_reordered() {
        let mut backend = MemoryStore::new();
        let raw = vec![
            LeaderboardEntry::new("a", 1, 1, 0.0),
            LeaderboardEntry::new("b", 5, 2, 0.0),
        ];
        backend
            .set("tower_pull_leaderboard", &serde_json::to_string(&raw).unwrap())
            .unwrap();
        let board = ProgressStore::new(backend).load_leaderboard();
        assert_eq!(board.top_score(), Some(5));
    }

    #[test]
    fn test_settings_round_trip() {
        let mut store = store();
        assert_eq!(store.load_settings(), Settings::default());
        let mut settings = Settings::default();
        settings.set_player_name("Ada");
        settings.completed_onboarding = true;
        store.save_settings(&settings).unwrap();
        assert_eq!(store.load_settings(), settings);
    }

    #[test]
    fn test_custom_keys() {
        let keys = StoreKeys {
            game_state: "gs".into(),
            leaderboard: "lb".into(),
            settings: "st".into(),
        };
        let backend = MemoryStore::new();
        let mut store = ProgressStore::with_keys(backend.clone(), keys);
        store.save(&GameState::new()).unwrap();
        assert!(backend.get("gs").unwrap().is_some());
        assert!(backend.get("tower_pull_game_state").unwrap().is_none());
    }
}
