//! Tenpad - round engine for a ten-cell reflex and puzzle game
//!
//! Core modules:
//! - `board`: 3/4/3 cell layout, lit/pressed state, adjacency
//! - `sim`: Deterministic game logic (mode state machines, round controller)
//! - `scheduler`: Named, cancellable timing loops
//! - `engine`: Async single-owner runtime around the controller
//! - `outcome`: Terminal round reports
//! - `highscores`: Best-score lookup and leaderboard
//! - `daily`: Date-seeded Daily challenge parameters
//! - `intents`: Fire-and-forget presentation intents
//! - `persistence`: Versioned JSON save/load

pub mod board;
pub mod daily;
pub mod engine;
pub mod highscores;
pub mod intents;
pub mod outcome;
pub mod persistence;
pub mod scheduler;
pub mod settings;
pub mod sim;

pub use board::{Board, CellId, CellSet};
pub use engine::{Engine, EngineHandle};
pub use highscores::{HighScores, HighscoreStore};
pub use intents::{Intent, IntentSink};
pub use outcome::OutcomeEvent;
pub use settings::Settings;
pub use sim::{GameMode, RoundController, RoundPhase};

/// Timing constants
pub mod consts {
    use std::time::Duration;

    /// Coarse tickers (round clocks, cleanup sweeps, puzzle timers)
    pub const COARSE_TICK: Duration = Duration::from_millis(50);
    /// Smooth position updates (~60 fps)
    pub const FRAME_TICK: Duration = Duration::from_millis(16);

    /// One countdown step
    pub const COUNTDOWN_TICK: Duration = Duration::from_secs(1);
    /// Cooldown before returning to idle
    pub const COOLDOWN_SETTLE: Duration = Duration::from_millis(1000);
    /// New-high banner lifetime
    pub const CELEBRATION: Duration = Duration::from_secs(2);

    /// Theme wave delay per adjacency hop (ms)
    pub const WAVE_STEP_MS: u32 = 60;
}
