//! Classic and Daily: keep three cells lit, tap them before the clock runs out

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::state::{RoundCtx, Step};
use crate::board::{CELL_COUNT, CellId};
use crate::consts::COARSE_TICK;
use crate::intents::Intent;
use crate::scheduler::{Cadence, LoopName};

/// Cells lit at any moment while unpressed cells remain
pub const ACTIVE_COUNT: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassicState {
    /// Seconds left on the round clock
    pub remaining: f64,
    /// Full round length in seconds
    pub duration_secs: u32,
    pub score: u32,
}

impl ClassicState {
    pub fn new(duration_secs: u32) -> Self {
        Self {
            remaining: duration_secs as f64,
            duration_secs,
            score: 0,
        }
    }

    pub fn begin_round(&mut self, ctx: &mut RoundCtx<'_>) {
        self.remaining = self.duration_secs as f64;
        ctx.board.reset();
        for _ in 0..ACTIVE_COUNT {
            promote(ctx);
        }
        ctx.loops
            .start(LoopName::RoundTicker, Cadence::Every(COARSE_TICK));
    }

    pub fn handle_tap(&mut self, cell: CellId, ctx: &mut RoundCtx<'_>) -> Step {
        if ctx.board.press(cell) {
            self.score += 1;
            ctx.intents.emit(Intent::ScorePoint {
                mode: ctx.mode,
                value: self.score,
            });
            promote(ctx);
            return Step::Continue;
        }
        if ctx.board.is_pressed(cell) {
            return Step::Continue;
        }
        Step::Fault
    }

    /// Reseed after every cell has been pressed
    pub fn pop(&mut self, ctx: &mut RoundCtx<'_>) -> Step {
        if !self.needs_pop(ctx) {
            return Step::Continue;
        }
        ctx.board.reset();
        for _ in 0..ACTIVE_COUNT {
            promote(ctx);
        }
        Step::Continue
    }

    pub fn needs_pop(&self, ctx: &RoundCtx<'_>) -> bool {
        ctx.board.active().is_empty() && ctx.board.pressed().len() == CELL_COUNT
    }

    pub fn on_loop(&mut self, name: LoopName, dt: f64, ctx: &mut RoundCtx<'_>) -> Step {
        if name != LoopName::RoundTicker {
            return Step::Continue;
        }
        self.remaining = (self.remaining - dt).max(0.0);
        if self.remaining <= 0.0 {
            ctx.loops.cancel(LoopName::RoundTicker);
            return Step::Finished;
        }
        Step::Continue
    }
}

/// Light one random cell that is neither lit nor pressed
fn promote(ctx: &mut RoundCtx<'_>) -> Option<CellId> {
    let mut free = ctx.board.free().to_vec();
    free.shuffle(ctx.rng);
    let cell = free.first().copied()?;
    ctx.board.activate(cell);
    Some(cell)
}
