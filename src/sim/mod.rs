//! Deterministic game logic
//!
//! All gameplay rules live here. Nothing in this module sleeps or touches a
//! clock directly:
//! - Time arrives as loop events carrying a nominal dt
//! - Seeded RNG only
//! - No presentation or platform dependencies

pub mod boppy;
pub mod classic;
pub mod controller;
pub mod copy;
pub mod difficulty;
pub mod matchy;
pub mod mode;
pub mod seeky;
pub mod state;
pub mod tappy;
pub mod zoomy;

pub use controller::{RoundController, Snapshot};
pub use mode::{CopyDifficulty, GameMode, STARTING_LIVES};
pub use state::{ModeState, RoundCtx, RoundParams, RoundPhase, Step};
