//! Seeky: find the one cell whose color is slightly off
//!
//! The saturation gap shrinks every round. A wrong tap or a timeout costs a
//! life and briefly reveals the answer before the next puzzle.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::difficulty::{SEEKY_TIME_LIMIT, seeky_saturation_delta};
use super::mode::STARTING_LIVES;
use super::state::{RoundCtx, Step};
use crate::board::{CELL_COUNT, CellId, CellSet};
use crate::consts::COARSE_TICK;
use crate::intents::Intent;
use crate::scheduler::{Cadence, LoopName};

/// Answer reveal after a wrong tap
pub const REVEAL_AFTER_MISS: Duration = Duration::from_millis(1000);
/// Answer reveal after the clock runs out
pub const REVEAL_AFTER_TIMEOUT: Duration = Duration::from_millis(1500);

/// Hue/saturation/brightness, all in 0..=1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsb {
    pub hue: f64,
    pub saturation: f64,
    pub brightness: f64,
}

impl Hsb {
    pub const BASE_SATURATION: f64 = 0.75;
    pub const BASE_BRIGHTNESS: f64 = 0.9;

    pub fn with_hue(hue: f64) -> Self {
        Self {
            hue: hue.rem_euclid(1.0),
            saturation: Self::BASE_SATURATION,
            brightness: Self::BASE_BRIGHTNESS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeekyState {
    pub odd_cell: CellId,
    pub round: u32,
    pub base_color: Hsb,
    pub saturation_delta: f64,
    pub time_remaining: f64,
    pub revealing_answer: bool,
    pub lives: u32,
    /// Puzzles solved
    pub solved: u32,
}

impl Default for SeekyState {
    fn default() -> Self {
        Self::new()
    }
}

impl SeekyState {
    pub fn new() -> Self {
        Self {
            odd_cell: 0,
            round: 1,
            base_color: Hsb::with_hue(0.0),
            saturation_delta: seeky_saturation_delta(1),
            time_remaining: SEEKY_TIME_LIMIT,
            revealing_answer: false,
            lives: STARTING_LIVES,
            solved: 0,
        }
    }

    /// Color shown on the odd cell
    pub fn odd_color(&self) -> Hsb {
        Hsb {
            saturation: (self.base_color.saturation - self.saturation_delta).clamp(0.0, 1.0),
            ..self.base_color
        }
    }

    pub fn color_of(&self, cell: CellId) -> Hsb {
        if cell == self.odd_cell {
            self.odd_color()
        } else {
            self.base_color
        }
    }

    pub fn begin_round(&mut self, ctx: &mut RoundCtx<'_>) {
        self.new_puzzle(ctx);
    }

    pub fn handle_tap(&mut self, cell: CellId, ctx: &mut RoundCtx<'_>) -> Step {
        if self.revealing_answer || (cell as usize) >= CELL_COUNT {
            return Step::Continue;
        }
        if cell != self.odd_cell {
            self.miss(REVEAL_AFTER_MISS, ctx);
            return Step::Continue;
        }

        self.solved += 1;
        ctx.intents.emit(Intent::ScorePoint {
            mode: ctx.mode,
            value: self.solved,
        });
        self.round += 1;
        self.new_puzzle(ctx);
        Step::Continue
    }

    pub fn on_loop(&mut self, name: LoopName, dt: f64, ctx: &mut RoundCtx<'_>) -> Step {
        match name {
            LoopName::SeekyTimer if !self.revealing_answer => {
                self.time_remaining = (self.time_remaining - dt).max(0.0);
                if self.time_remaining <= 0.0 {
                    self.miss(REVEAL_AFTER_TIMEOUT, ctx);
                }
                Step::Continue
            }
            LoopName::ModePause if self.revealing_answer => {
                self.revealing_answer = false;
                if self.lives == 0 {
                    return Step::Exhausted;
                }
                // Same round, fresh puzzle
                self.new_puzzle(ctx);
                Step::Continue
            }
            _ => Step::Continue,
        }
    }

    fn new_puzzle(&mut self, ctx: &mut RoundCtx<'_>) {
        self.odd_cell = ctx.rng.random_range(0..CELL_COUNT as CellId);
        self.base_color = Hsb::with_hue(ctx.rng.random());
        self.saturation_delta = seeky_saturation_delta(self.round);
        self.time_remaining = SEEKY_TIME_LIMIT;
        self.revealing_answer = false;
        ctx.board.reset();
        ctx.board.set_active(CellSet::all());
        ctx.loops
            .start(LoopName::SeekyTimer, Cadence::Every(COARSE_TICK));
    }

    fn miss(&mut self, reveal: Duration, ctx: &mut RoundCtx<'_>) {
        ctx.loops.cancel(LoopName::SeekyTimer);
        self.lives = self.lives.saturating_sub(1);
        self.revealing_answer = true;
        // Only the answer stays lit during the reveal
        ctx.board.reset();
        ctx.board.activate(self.odd_cell);
        if self.lives > 0 {
            ctx.intents.emit(Intent::LifeLost {
                mode: ctx.mode,
                lives_left: self.lives,
            });
        }
        ctx.loops.start(LoopName::ModePause, Cadence::Once(reveal));
    }
}
