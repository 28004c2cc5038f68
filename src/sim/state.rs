//! Round phase and per-mode state
//!
//! [`ModeState`] is a closed sum over the mode state machines. The controller
//! owns exactly one while a round exists and dispatches every tap and loop
//! event through it.

use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::boppy::BoppyState;
use super::classic::ClassicState;
use super::copy::CopyState;
use super::matchy::MatchyState;
use super::mode::{CopyDifficulty, GameMode};
use super::seeky::SeekyState;
use super::tappy::TappyState;
use super::zoomy::ZoomyState;
use crate::board::{Board, CellId};
use crate::intents::IntentSink;
use crate::scheduler::{LoopControl, LoopName};

/// Lifecycle phase of the round controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// No round; taps are fidgets
    Idle,
    /// Pre-round countdown (ticks remaining)
    Countdown(u8),
    /// Round live; taps go to the mode
    Active,
    /// Settling back to idle
    Cooldown,
    /// Round lost; waiting for dismissal
    GameOver,
}

impl RoundPhase {
    pub fn is_running(&self) -> bool {
        !matches!(self, RoundPhase::Idle)
    }
}

/// What a mode handler decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Keep going
    Continue,
    /// Illegal input; round ends now
    Fault,
    /// Round completed normally (clock ran out, board cleared)
    Finished,
    /// Last life gone
    Exhausted,
}

/// Everything a mode handler may touch besides its own fields
pub struct RoundCtx<'a> {
    pub mode: GameMode,
    pub board: &'a mut Board,
    pub rng: &'a mut Pcg32,
    pub loops: &'a mut dyn LoopControl,
    pub intents: &'a dyn IntentSink,
}

/// Parameters resolved when a round is created
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundParams {
    /// Round clock in seconds for timed modes
    pub duration_secs: u32,
    pub copy_difficulty: CopyDifficulty,
    pub matchy_players: u8,
}

/// Per-mode state, one variant live at a time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ModeState {
    /// Shared by Classic and Daily
    Classic(ClassicState),
    Copy(CopyState),
    Boppy(BoppyState),
    Matchy(MatchyState),
    Zoomy(ZoomyState),
    Tappy(TappyState),
    Seeky(SeekyState),
}

impl ModeState {
    /// Fresh state for `mode`
    pub fn new(mode: GameMode, params: &RoundParams) -> Self {
        match mode {
            GameMode::Classic | GameMode::Daily => {
                ModeState::Classic(ClassicState::new(params.duration_secs))
            }
            GameMode::Copy => ModeState::Copy(CopyState::new(params.copy_difficulty)),
            GameMode::Boppy => ModeState::Boppy(BoppyState::new(params.duration_secs)),
            GameMode::Matchy => ModeState::Matchy(MatchyState::new(params.matchy_players)),
            GameMode::Zoomy => ModeState::Zoomy(ZoomyState::new()),
            GameMode::Tappy => ModeState::Tappy(TappyState::new()),
            GameMode::Seeky => ModeState::Seeky(SeekyState::new()),
        }
    }

    pub fn begin_round(&mut self, ctx: &mut RoundCtx<'_>) {
        match self {
            ModeState::Classic(s) => s.begin_round(ctx),
            ModeState::Copy(s) => s.begin_round(ctx),
            ModeState::Boppy(s) => s.begin_round(ctx),
            ModeState::Matchy(s) => s.begin_round(ctx),
            ModeState::Zoomy(s) => s.begin_round(ctx),
            ModeState::Tappy(s) => s.begin_round(ctx),
            ModeState::Seeky(s) => s.begin_round(ctx),
        }
    }

    pub fn handle_tap(&mut self, cell: CellId, ctx: &mut RoundCtx<'_>) -> Step {
        match self {
            ModeState::Classic(s) => s.handle_tap(cell, ctx),
            ModeState::Copy(s) => s.handle_tap(cell, ctx),
            ModeState::Boppy(s) => s.handle_tap(cell, ctx),
            ModeState::Matchy(s) => s.handle_tap(cell, ctx),
            // Zoomy dots are caught, not tapped
            ModeState::Zoomy(_) => Step::Continue,
            ModeState::Tappy(s) => s.handle_tap(cell, ctx),
            ModeState::Seeky(s) => s.handle_tap(cell, ctx),
        }
    }

    /// A named loop woke with `dt` seconds elapsed
    pub fn on_loop(&mut self, name: LoopName, dt: f64, ctx: &mut RoundCtx<'_>) -> Step {
        match self {
            ModeState::Classic(s) => s.on_loop(name, dt, ctx),
            ModeState::Copy(s) => s.on_loop(name, ctx),
            ModeState::Boppy(s) => s.on_loop(name, dt, ctx),
            ModeState::Matchy(s) => s.on_loop(name, ctx),
            ModeState::Zoomy(s) => s.on_loop(name, dt, ctx),
            ModeState::Tappy(s) => s.on_loop(name, dt, ctx),
            ModeState::Seeky(s) => s.on_loop(name, dt, ctx),
        }
    }

    /// Classic pop action
    pub fn pop(&mut self, ctx: &mut RoundCtx<'_>) -> Step {
        match self {
            ModeState::Classic(s) => s.pop(ctx),
            _ => Step::Continue,
        }
    }

    /// Zoomy catch
    pub fn catch_dot(&mut self, id: u32, ctx: &mut RoundCtx<'_>) -> Step {
        match self {
            ModeState::Zoomy(s) => s.catch_dot(id, ctx),
            _ => Step::Continue,
        }
    }

    /// Value compared against the stored best: points, round reached or
    /// pairs matched depending on mode
    pub fn value(&self) -> u32 {
        match self {
            ModeState::Classic(s) => s.score,
            ModeState::Copy(s) => s.round,
            ModeState::Boppy(s) => s.score,
            ModeState::Matchy(s) => s.best_pairs(),
            ModeState::Zoomy(s) => s.score,
            ModeState::Tappy(s) => s.round,
            ModeState::Seeky(s) => s.round,
        }
    }

    /// Lives left, if the mode has lives
    pub fn lives(&self) -> Option<u32> {
        match self {
            ModeState::Zoomy(s) => Some(s.lives),
            ModeState::Tappy(s) => Some(s.lives),
            ModeState::Seeky(s) => Some(s.lives),
            _ => None,
        }
    }

    /// Seconds left on the round clock, if the mode has one
    pub fn time_remaining(&self) -> Option<f64> {
        match self {
            ModeState::Classic(s) => Some(s.remaining),
            ModeState::Boppy(s) => Some(s.remaining),
            ModeState::Tappy(s) => Some(s.time_remaining),
            ModeState::Seeky(s) => Some(s.time_remaining),
            _ => None,
        }
    }

    /// Whether the outcome of this round may be recorded as a high score
    pub fn is_ranked(&self) -> bool {
        match self {
            ModeState::Matchy(s) => s.players == 1,
            _ => true,
        }
    }

    /// Perfect-round flag (single-player Matchy only)
    pub fn is_perfect(&self) -> bool {
        match self {
            ModeState::Matchy(s) => s.is_perfect(),
            _ => false,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Harness for driving a single mode without the controller

    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use super::RoundCtx;
    use crate::board::Board;
    use crate::intents::IntentLog;
    use crate::scheduler::{LoopName, Loops, ManualScheduler};
    use crate::sim::GameMode;

    pub struct Harness {
        pub mode: GameMode,
        pub board: Board,
        pub rng: Pcg32,
        pub loops: Loops<ManualScheduler>,
        pub intents: IntentLog,
    }

    impl Harness {
        pub fn new(mode: GameMode, seed: u64) -> Self {
            Self {
                mode,
                board: Board::new(),
                rng: Pcg32::seed_from_u64(seed),
                loops: Loops::new(ManualScheduler::new()),
                intents: IntentLog::new(),
            }
        }

        pub fn ctx(&mut self) -> RoundCtx<'_> {
            RoundCtx {
                mode: self.mode,
                board: &mut self.board,
                rng: &mut self.rng,
                loops: &mut self.loops,
                intents: &self.intents,
            }
        }

        /// Wake `name` as the real scheduler would, returning its dt if live
        pub fn fire(&mut self, name: LoopName) -> Option<f64> {
            let fired = self.loops.scheduler_mut().fire(name)?;
            self.loops.accept(&fired).then_some(fired.dt)
        }
    }
}
