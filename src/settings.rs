//! Game settings and preferences
//!
//! Persisted separately from high scores. Read once when the controller is
//! built; the controller only changes them between rounds.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::persistence::{self, PersistError};
use crate::sim::CopyDifficulty;
use crate::sim::matchy::MAX_PLAYERS;

/// Shortest allowed round length in seconds
pub const MIN_ROUND_LENGTH: u32 = 5;
/// Longest allowed round length in seconds
pub const MAX_ROUND_LENGTH: u32 = 300;

/// Game settings/preferences
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Classic and Boppy round clock
    pub round_length_secs: u32,
    /// Copy board size
    pub copy_difficulty: CopyDifficulty,
    /// Matchy players (1-4)
    pub matchy_players: u8,
    /// Pre-round countdown ticks
    pub countdown_ticks: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            round_length_secs: 30,
            copy_difficulty: CopyDifficulty::Classic,
            matchy_players: 1,
            countdown_ticks: 3,
        }
    }
}

impl Settings {
    pub fn set_round_length(&mut self, secs: u32) {
        self.round_length_secs = secs.clamp(MIN_ROUND_LENGTH, MAX_ROUND_LENGTH);
    }

    pub fn set_matchy_players(&mut self, players: u8) {
        self.matchy_players = players.clamp(1, MAX_PLAYERS);
    }

    /// Clamp every field into range (after loading hand-edited files)
    pub fn sanitized(mut self) -> Self {
        self.set_round_length(self.round_length_secs);
        self.set_matchy_players(self.matchy_players);
        self.countdown_ticks = self.countdown_ticks.max(1);
        self
    }

    pub fn load(path: &Path) -> Result<Self, PersistError> {
        let settings: Settings = persistence::load(path)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings.sanitized())
    }

    pub fn load_or_default(path: &Path) -> Self {
        persistence::load_or_default::<Settings>(path).sanitized()
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistError> {
        persistence::save(path, self)?;
        log::info!("Settings saved");
        Ok(())
    }
}
