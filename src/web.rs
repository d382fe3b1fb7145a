//! Browser bindings (WASM only)
//!
//! Thin wrapper the JS UI drives: it forwards input to the engine, calls
//! `advance` from its animation frame, and reads snapshots/events as JSON.

use wasm_bindgen::prelude::*;

use crate::levels;
use crate::persistence::LocalStorageStore;
use crate::platform::{self, SystemClock};
use crate::sim::GameEngine;

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[wasm_bindgen(start)]
pub fn wasm_main() {
    platform::init_logging();
    log::info!("Tower Pull starting...");
}

#[wasm_bindgen]
pub struct WebGame {
    engine: GameEngine<LocalStorageStore, SystemClock>,
}

#[wasm_bindgen]
impl WebGame {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebGame {
        WebGame {
            engine: GameEngine::new(LocalStorageStore::new(), SystemClock),
        }
    }

    pub fn remove_block(&mut self, block_id: u32) -> bool {
        self.engine.remove_block(block_id)
    }

    /// Call every frame; runs countdown ticks and notification clears
    pub fn advance(&mut self) -> usize {
        self.engine.advance()
    }

    pub fn retry_level(&mut self) {
        self.engine.retry_level();
    }

    pub fn select_level(&mut self, level_id: u32) -> bool {
        self.engine.select_level(level_id)
    }

    pub fn next_level(&mut self) -> bool {
        self.engine.next_level()
    }

    pub fn reset_game(&mut self) {
        self.engine.reset_game();
    }

    pub fn dismiss_notification(&mut self) {
        self.engine.dismiss_notification();
    }

    /// Submit the finished level under the saved player name.
    /// Returns the rank, or 0 if it didn't place.
    pub fn submit_score(&mut self) -> usize {
        let name = self.engine.store().load_settings().player_name;
        self.engine.submit_score(&name).unwrap_or(0)
    }

    pub fn snapshot(&self) -> Result<String, JsValue> {
        to_json(&self.engine.snapshot())
    }

    pub fn drain_events(&mut self) -> Result<String, JsValue> {
        to_json(&self.engine.drain_events())
    }

    pub fn leaderboard(&self) -> Result<String, JsValue> {
        to_json(&self.engine.leaderboard())
    }

    pub fn levels(&self) -> Result<String, JsValue> {
        to_json(&levels::definitions())
    }

    pub fn settings(&self) -> Result<String, JsValue> {
        to_json(&self.engine.store().load_settings())
    }

    pub fn set_player_name(&mut self, name: &str) {
        let mut settings = self.engine.store().load_settings();
        settings.set_player_name(name);
        if let Err(e) = self.engine.store_mut().save_settings(&settings) {
            log::warn!("Could not save settings: {}", e);
        }
    }

    pub fn complete_onboarding(&mut self) {
        let mut settings = self.engine.store().load_settings();
        settings.completed_onboarding = true;
        if let Err(e) = self.engine.store_mut().save_settings(&settings) {
            log::warn!("Could not save settings: {}", e);
        }
    }
}

impl Default for WebGame {
    fn default() -> Self {
        Self::new()
    }
}
