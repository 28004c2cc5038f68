//! Game modes and their static policy

use serde::{Deserialize, Serialize};

/// Available game modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GameMode {
    /// Tap lit cells against the clock
    Classic,
    /// Classic with a date-seeded duration and board
    Daily,
    /// Repeat a growing sequence
    Copy,
    /// Whack-a-mole
    Boppy,
    /// Memory pairs
    Matchy,
    /// Catch drifting dots
    Zoomy,
    /// Timed multi-tap survival
    Tappy,
    /// Odd one out
    Seeky,
}

/// Lives given to lives-based modes
pub const STARTING_LIVES: u32 = 3;

impl GameMode {
    pub fn name(&self) -> &'static str {
        match self {
            GameMode::Classic => "Classic",
            GameMode::Daily => "Daily",
            GameMode::Copy => "Copy",
            GameMode::Boppy => "Boppy",
            GameMode::Matchy => "Matchy",
            GameMode::Zoomy => "Zoomy",
            GameMode::Tappy => "Tappy",
            GameMode::Seeky => "Seeky",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|m| m.name().eq_ignore_ascii_case(s))
    }

    pub fn all() -> &'static [GameMode] {
        &[
            GameMode::Classic,
            GameMode::Daily,
            GameMode::Copy,
            GameMode::Boppy,
            GameMode::Matchy,
            GameMode::Zoomy,
            GameMode::Tappy,
            GameMode::Seeky,
        ]
    }

    /// Round ends when a clock runs out
    pub fn uses_timer(&self) -> bool {
        matches!(self, GameMode::Classic | GameMode::Daily | GameMode::Boppy)
    }

    /// Round ends when lives run out
    pub fn uses_lives(&self) -> bool {
        matches!(self, GameMode::Zoomy | GameMode::Tappy | GameMode::Seeky)
    }

    pub fn starting_lives(&self) -> u32 {
        if self.uses_lives() { STARTING_LIVES } else { 0 }
    }

    /// Board exhaustion needs an explicit pop to reseed
    pub fn shows_pop_action(&self) -> bool {
        matches!(self, GameMode::Classic | GameMode::Daily)
    }

    /// Terminal value is the round reached rather than a point count
    pub fn reports_round(&self) -> bool {
        matches!(self, GameMode::Copy | GameMode::Tappy | GameMode::Seeky)
    }
}

/// Copy mode board size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CopyDifficulty {
    /// Four cells in play
    #[default]
    Classic,
    /// All ten cells in play
    Challenge,
}

impl CopyDifficulty {
    pub fn dot_count(&self) -> u8 {
        match self {
            CopyDifficulty::Classic => 4,
            CopyDifficulty::Challenge => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_table() {
        for mode in GameMode::all() {
            // No mode is both timed and lives-based
            assert!(!(mode.uses_timer() && mode.uses_lives()), "{mode:?}");
            assert_eq!(mode.starting_lives() > 0, mode.uses_lives());
        }
        assert!(GameMode::Daily.shows_pop_action());
        assert!(!GameMode::Boppy.shows_pop_action());
        assert_eq!(GameMode::Tappy.starting_lives(), 3);
    }

    #[test]
    fn test_from_str_round_trips_names() {
        for &mode in GameMode::all() {
            assert_eq!(GameMode::from_str(mode.name()), Some(mode));
        }
        assert_eq!(GameMode::from_str("zoomy"), Some(GameMode::Zoomy));
        assert_eq!(GameMode::from_str("tetris"), None);
    }

    #[test]
    fn test_copy_dot_counts() {
        assert_eq!(CopyDifficulty::Classic.dot_count(), 4);
        assert_eq!(CopyDifficulty::Challenge.dot_count(), 10);
    }
}
