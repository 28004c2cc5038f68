//! Tappy: light up a set of cells, tap them all before the window closes
//!
//! Sub-phases cycle waiting -> active -> round complete / failed -> waiting.
//! A timeout costs a life and replays the same round number.

use std::time::Duration;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::difficulty::{tappy_cell_count, tappy_time_limit};
use super::mode::STARTING_LIVES;
use super::state::{RoundCtx, Step};
use crate::board::{CellId, CellSet};
use crate::consts::COARSE_TICK;
use crate::intents::Intent;
use crate::scheduler::{Cadence, LoopName};

/// Dark pause before cells light up
pub const TAPPY_WAIT: Duration = Duration::from_millis(700);
/// How long the complete/failed result stays on show
pub const TAPPY_RESULT_PAUSE: Duration = Duration::from_millis(600);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TappyPhase {
    Waiting,
    Active,
    RoundComplete,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TappyState {
    pub round: u32,
    pub phase: TappyPhase,
    pub target_cells: CellSet,
    pub tapped_cells: CellSet,
    pub time_remaining: f64,
    pub lives: u32,
}

impl Default for TappyState {
    fn default() -> Self {
        Self::new()
    }
}

impl TappyState {
    pub fn new() -> Self {
        Self {
            round: 1,
            phase: TappyPhase::Waiting,
            target_cells: CellSet::empty(),
            tapped_cells: CellSet::empty(),
            time_remaining: tappy_time_limit(1),
            lives: STARTING_LIVES,
        }
    }

    pub fn begin_round(&mut self, ctx: &mut RoundCtx<'_>) {
        self.wait(ctx);
    }

    pub fn handle_tap(&mut self, cell: CellId, ctx: &mut RoundCtx<'_>) -> Step {
        if self.phase != TappyPhase::Active
            || !self.target_cells.contains(cell)
            || self.tapped_cells.contains(cell)
        {
            return Step::Continue;
        }

        self.tapped_cells.insert(cell);
        ctx.board.press(cell);
        ctx.intents.emit(Intent::ScorePoint {
            mode: ctx.mode,
            value: self.tapped_cells.len() as u32,
        });

        if self.tapped_cells == self.target_cells {
            ctx.loops.cancel(LoopName::TappyRoundTimer);
            ctx.intents.emit(Intent::RoundWin {
                mode: ctx.mode,
                round: self.round,
            });
            self.round += 1;
            self.phase = TappyPhase::RoundComplete;
            ctx.loops
                .start(LoopName::ModePause, Cadence::Once(TAPPY_RESULT_PAUSE));
        }
        Step::Continue
    }

    pub fn on_loop(&mut self, name: LoopName, dt: f64, ctx: &mut RoundCtx<'_>) -> Step {
        match (name, self.phase) {
            (LoopName::ModePause, TappyPhase::Waiting) => self.activate(ctx),
            (LoopName::ModePause, TappyPhase::RoundComplete | TappyPhase::Failed) => {
                self.wait(ctx)
            }
            (LoopName::TappyRoundTimer, TappyPhase::Active) => {
                self.time_remaining = (self.time_remaining - dt).max(0.0);
                if self.time_remaining <= 0.0 {
                    return self.time_out(ctx);
                }
            }
            _ => {}
        }
        Step::Continue
    }

    fn wait(&mut self, ctx: &mut RoundCtx<'_>) {
        ctx.board.reset();
        self.target_cells.clear();
        self.tapped_cells.clear();
        self.phase = TappyPhase::Waiting;
        ctx.loops
            .start(LoopName::ModePause, Cadence::Once(TAPPY_WAIT));
    }

    fn activate(&mut self, ctx: &mut RoundCtx<'_>) {
        let mut cells: Vec<CellId> = ctx.board.free().to_vec();
        cells.shuffle(ctx.rng);
        cells.truncate(tappy_cell_count(self.round));

        self.target_cells = cells.into_iter().collect();
        self.tapped_cells.clear();
        ctx.board.set_active(self.target_cells);
        self.time_remaining = tappy_time_limit(self.round);
        self.phase = TappyPhase::Active;
        ctx.loops
            .start(LoopName::TappyRoundTimer, Cadence::Every(COARSE_TICK));
    }

    fn time_out(&mut self, ctx: &mut RoundCtx<'_>) -> Step {
        ctx.loops.cancel(LoopName::TappyRoundTimer);
        ctx.board.reset();
        self.lives = self.lives.saturating_sub(1);
        self.phase = TappyPhase::Failed;
        if self.lives == 0 {
            return Step::Exhausted;
        }
        ctx.intents.emit(Intent::LifeLost {
            mode: ctx.mode,
            lives_left: self.lives,
        });
        // Same round number again after the pause
        ctx.loops
            .start(LoopName::ModePause, Cadence::Once(TAPPY_RESULT_PAUSE));
        Step::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::LoopControl;
    use crate::sim::GameMode;
    use crate::sim::state::test_support::Harness;

    fn active(seed: u64) -> (Harness, TappyState) {
        let mut h = Harness::new(GameMode::Tappy, seed);
        let mut state = TappyState::new();
        state.begin_round(&mut h.ctx());
        h.fire(LoopName::ModePause).unwrap();
        state.on_loop(LoopName::ModePause, 0.0, &mut h.ctx());
        (h, state)
    }

    fn run_out_clock(h: &mut Harness, state: &mut TappyState) -> Step {
        loop {
            let dt = h.fire(LoopName::TappyRoundTimer).expect("timer live");
            let step = state.on_loop(LoopName::TappyRoundTimer, dt, &mut h.ctx());
            if state.phase != TappyPhase::Active {
                return step;
            }
        }
    }

    #[test]
    fn test_taps_ignored_while_waiting() {
        let mut h = Harness::new(GameMode::Tappy, 1);
        let mut state = TappyState::new();
        state.begin_round(&mut h.ctx());
        assert_eq!(state.phase, TappyPhase::Waiting);
        for cell in 0..10 {
            state.handle_tap(cell, &mut h.ctx());
        }
        assert!(state.tapped_cells.is_empty());
    }

    #[test]
    fn test_clearing_targets_advances_round() {
        let (mut h, mut state) = active(2);
        assert_eq!(state.phase, TappyPhase::Active);
        assert_eq!(state.target_cells.len(), 1);
        assert!((state.time_remaining - 2.0).abs() < 1e-12);

        let target = state.target_cells.iter().next().unwrap();
        state.handle_tap(target, &mut h.ctx());
        assert_eq!(state.phase, TappyPhase::RoundComplete);
        assert_eq!(state.round, 2);
        assert!(!h.loops.is_running(LoopName::TappyRoundTimer));

        // Result pause, then waiting, then two cells light up
        h.fire(LoopName::ModePause).unwrap();
        state.on_loop(LoopName::ModePause, 0.0, &mut h.ctx());
        assert_eq!(state.phase, TappyPhase::Waiting);
        h.fire(LoopName::ModePause).unwrap();
        state.on_loop(LoopName::ModePause, 0.0, &mut h.ctx());
        assert_eq!(state.target_cells.len(), 2);
        assert_eq!(h.board.active(), state.target_cells);
    }

    #[test]
    fn test_timeout_retries_same_round() {
        let (mut h, mut state) = active(3);
        state.round = 4;
        let step = run_out_clock(&mut h, &mut state);
        assert_eq!(step, Step::Continue);
        assert_eq!(state.phase, TappyPhase::Failed);
        assert_eq!(state.round, 4);
        assert_eq!(state.lives, STARTING_LIVES - 1);
        assert!(h.board.active().is_empty());
    }

    #[test]
    fn test_last_life_is_terminal() {
        let (mut h, mut state) = active(4);
        state.lives = 1;
        let step = run_out_clock(&mut h, &mut state);
        assert_eq!(step, Step::Exhausted);
        assert_eq!(state.lives, 0);
        assert_eq!(state.round, 1);
        assert!(!h.loops.is_running(LoopName::ModePause));
    }

    #[test]
    fn test_non_target_tap_is_harmless() {
        let (mut h, mut state) = active(5);
        let other = state.target_cells.complement().iter().next().unwrap();
        assert_eq!(state.handle_tap(other, &mut h.ctx()), Step::Continue);
        assert!(state.tapped_cells.is_empty());
        assert_eq!(state.lives, STARTING_LIVES);
    }
}
