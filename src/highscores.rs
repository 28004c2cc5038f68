//! High score leaderboard
//!
//! The round controller only sees the [`HighscoreStore`] contract. [`HighScores`]
//! is the reference store: the top 10 results per `(mode, duration)` board,
//! plus the date the Daily challenge was last played.

use std::path::Path;

use chrono::{Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::daily;
use crate::persistence::{self, PersistError};
use crate::sim::GameMode;

/// Maximum number of high scores kept per board
pub const MAX_HIGH_SCORES: usize = 10;

/// What the round controller needs from score storage
pub trait HighscoreStore {
    /// Best stored value for a board, 0 if none
    fn best(&self, mode: GameMode, duration: u32) -> u32;
    /// Record a finished round's value
    fn register(&mut self, score: u32, mode: GameMode, duration: u32);
    /// Remember that today's Daily has been started
    fn mark_daily_played(&mut self);
    fn has_played_daily_today(&self) -> bool;

    /// Local calendar date the Daily rules use
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn daily_duration_for_today(&self) -> u32 {
        daily::duration_for_date(self.today())
    }
}

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub mode: GameMode,
    /// Round length, Copy board size, or 0
    pub duration: u32,
    /// Points, round or pairs
    pub score: u32,
    /// Unix timestamp (s) when achieved
    pub timestamp: i64,
}

/// High score leaderboard
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    /// Sorted descending by score within each board
    pub entries: Vec<HighScoreEntry>,
    pub last_daily: Option<NaiveDate>,
    /// Fixed "today" for deterministic runs
    #[serde(skip)]
    pinned_today: Option<NaiveDate>,
}

impl HighScores {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `date` as today instead of the system clock
    pub fn with_today(mut self, date: NaiveDate) -> Self {
        self.pinned_today = Some(date);
        self
    }

    /// Entries for one board, best first
    pub fn board(&self, mode: GameMode, duration: u32) -> impl Iterator<Item = &HighScoreEntry> {
        self.entries
            .iter()
            .filter(move |e| e.mode == mode && e.duration == duration)
    }

    /// Check if a score qualifies for a board
    pub fn qualifies(&self, score: u32, mode: GameMode, duration: u32) -> bool {
        if score == 0 {
            return false;
        }
        let scores: Vec<u32> = self.board(mode, duration).map(|e| e.score).collect();
        if scores.len() < MAX_HIGH_SCORES {
            return true;
        }
        // Check if score beats the lowest entry
        scores.last().map(|&s| score > s).unwrap_or(true)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, score: u32, mode: GameMode, duration: u32) -> Option<usize> {
        if !self.qualifies(score, mode, duration) {
            return None;
        }
        let ahead = self.board(mode, duration).filter(|e| e.score >= score).count();
        Some(ahead + 1)
    }

    /// Add a score to its board (if it qualifies).
    /// Returns the rank achieved (1-indexed) or None if it didn't qualify
    pub fn add_score(
        &mut self,
        score: u32,
        mode: GameMode,
        duration: u32,
        timestamp: i64,
    ) -> Option<usize> {
        let rank = self.potential_rank(score, mode, duration)?;

        let entry = HighScoreEntry {
            mode,
            duration,
            score,
            timestamp,
        };

        // Insert after every entry on the same board that ranks ahead
        let pos = self
            .entries
            .iter()
            .position(|e| e.mode == mode && e.duration == duration && score > e.score)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, entry);

        // Trim the board to max size
        let mut kept = 0;
        self.entries.retain(|e| {
            if e.mode != mode || e.duration != duration {
                return true;
            }
            kept += 1;
            kept <= MAX_HIGH_SCORES
        });

        Some(rank)
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn load(path: &Path) -> Result<Self, PersistError> {
        let scores: HighScores = persistence::load(path)?;
        log::info!("Loaded {} high scores", scores.entries.len());
        Ok(scores)
    }

    pub fn load_or_default(path: &Path) -> Self {
        persistence::load_or_default(path)
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistError> {
        persistence::save(path, self)?;
        log::info!("High scores saved ({} entries)", self.entries.len());
        Ok(())
    }
}

impl HighscoreStore for HighScores {
    fn best(&self, mode: GameMode, duration: u32) -> u32 {
        self.board(mode, duration).map(|e| e.score).max().unwrap_or(0)
    }

    fn register(&mut self, score: u32, mode: GameMode, duration: u32) {
        let now = Utc::now().timestamp();
        if let Some(rank) = self.add_score(score, mode, duration, now) {
            log::info!("{} {}: {} ranked #{}", mode.name(), duration, score, rank);
        }
    }

    fn mark_daily_played(&mut self) {
        self.last_daily = Some(self.today());
    }

    fn has_played_daily_today(&self) -> bool {
        self.last_daily == Some(self.today())
    }

    fn today(&self) -> NaiveDate {
        self.pinned_today
            .unwrap_or_else(|| Local::now().date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_best_is_per_board() {
        let mut hs = HighScores::new();
        hs.register(5, GameMode::Classic, 10);
        hs.register(9, GameMode::Classic, 30);
        hs.register(3, GameMode::Classic, 10);
        assert_eq!(hs.best(GameMode::Classic, 10), 5);
        assert_eq!(hs.best(GameMode::Classic, 30), 9);
        assert_eq!(hs.best(GameMode::Boppy, 10), 0);
    }

    #[test]
    fn test_zero_score_never_qualifies() {
        let mut hs = HighScores::new();
        assert_eq!(hs.add_score(0, GameMode::Seeky, 0, 0), None);
        assert!(hs.is_empty());
    }

    #[test]
    fn test_board_is_capped_and_sorted() {
        let mut hs = HighScores::new();
        for score in 1..=15 {
            hs.add_score(score, GameMode::Tappy, 0, 0);
        }
        hs.add_score(4, GameMode::Zoomy, 0, 0);
        let tappy: Vec<u32> = hs.board(GameMode::Tappy, 0).map(|e| e.score).collect();
        assert_eq!(tappy, (6..=15).rev().collect::<Vec<_>>());
        assert!(!hs.qualifies(6, GameMode::Tappy, 0));
        assert_eq!(hs.potential_rank(20, GameMode::Tappy, 0), Some(1));
        assert_eq!(hs.best(GameMode::Zoomy, 0), 4);
    }

    #[test]
    fn test_daily_played_tracks_pinned_date() {
        let mut hs = HighScores::new().with_today(day(2026, 10, 17));
        assert!(!hs.has_played_daily_today());
        hs.mark_daily_played();
        assert!(hs.has_played_daily_today());
        assert_eq!(hs.daily_duration_for_today(), daily::duration_for_date(day(2026, 10, 17)));

        let tomorrow = HighScores {
            pinned_today: Some(day(2026, 10, 18)),
            ..hs
        };
        assert!(!tomorrow.has_played_daily_today());
    }
}
