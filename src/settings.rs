//! Player settings and preferences
//!
//! Persisted separately from progress, so resetting the game keeps them.

use serde::{Deserialize, Serialize};

/// Longest player name kept on leaderboard entries
pub const MAX_PLAYER_NAME_LEN: usize = 24;

fn default_player_name() -> String {
    "Player".to_string()
}

/// Player preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Name recorded on leaderboard entries
    #[serde(default = "default_player_name")]
    pub player_name: String,
    /// Onboarding screens were dismissed
    #[serde(default)]
    pub completed_onboarding: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            player_name: default_player_name(),
            completed_onboarding: false,
        }
    }
}

impl Settings {
    /// Trim the name and fall back to the default when blank
    pub fn sanitized(mut self) -> Self {
        self.player_name = sanitize_name(&self.player_name);
        self
    }

    pub fn set_player_name(&mut self, name: &str) {
        self.player_name = sanitize_name(name);
    }
}

/// Normalize a player name for display and storage
pub fn sanitize_name(name: &str) -> String {
    let trimmed: String = name.trim().chars().take(MAX_PLAYER_NAME_LEN).collect();
    let trimmed = trimmed.trim_end();
    if trimmed.is_empty() {
        default_player_name()
    } else {
        trimmed.to_string()
    }
}
