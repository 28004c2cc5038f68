//! Copy: watch a growing sequence, then repeat it
//!
//! Each completed round appends one random cell; the whole sequence replays
//! before the player's turn. Any wrong tap ends the game.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::difficulty::{copy_gap, copy_hold};
use super::mode::CopyDifficulty;
use super::state::{RoundCtx, Step};
use crate::board::CellId;
use crate::intents::Intent;
use crate::scheduler::{Cadence, LoopName};

/// Sequence length on round 1
pub const COPY_START_LENGTH: usize = 3;
/// Pause before playback starts
pub const COPY_LEAD_IN: Duration = Duration::from_millis(600);
/// Pause after a completed round
pub const COPY_ROUND_PAUSE: Duration = Duration::from_millis(800);

/// Playback cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playback {
    /// Sequence index being shown
    pub step: usize,
    /// Whether that entry is currently lit
    pub lit: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyState {
    pub sequence: Vec<CellId>,
    pub player_index: usize,
    pub round: u32,
    pub difficulty: CopyDifficulty,
    pub showing_sequence: bool,
    pub playback: Option<Playback>,
    /// Sequences completed
    pub score: u32,
}

impl CopyState {
    pub fn new(difficulty: CopyDifficulty) -> Self {
        Self {
            sequence: Vec::new(),
            player_index: 0,
            round: 1,
            difficulty,
            showing_sequence: false,
            playback: None,
            score: 0,
        }
    }

    pub fn begin_round(&mut self, ctx: &mut RoundCtx<'_>) {
        ctx.board.reset();
        if self.sequence.is_empty() {
            for _ in 0..COPY_START_LENGTH {
                self.push_random(ctx);
            }
        }
        self.start_playback(ctx);
    }

    pub fn handle_tap(&mut self, cell: CellId, ctx: &mut RoundCtx<'_>) -> Step {
        if self.showing_sequence || cell >= self.difficulty.dot_count() {
            return Step::Continue;
        }
        if self.sequence.get(self.player_index) != Some(&cell) {
            return Step::Fault;
        }

        self.player_index += 1;
        if self.player_index < self.sequence.len() {
            return Step::Continue;
        }

        self.score += 1;
        ctx.intents.emit(Intent::RoundWin {
            mode: ctx.mode,
            round: self.round,
        });
        self.round += 1;
        // Input locked until the next playback finishes
        self.showing_sequence = true;
        ctx.loops
            .start(LoopName::ModePause, Cadence::Once(COPY_ROUND_PAUSE));
        Step::Continue
    }

    pub fn on_loop(&mut self, name: LoopName, ctx: &mut RoundCtx<'_>) -> Step {
        match name {
            LoopName::ModePause => {
                self.push_random(ctx);
                self.start_playback(ctx);
            }
            LoopName::CopyPlayback => self.advance_playback(ctx),
            _ => {}
        }
        Step::Continue
    }

    fn push_random(&mut self, ctx: &mut RoundCtx<'_>) {
        let cell = ctx.rng.random_range(0..self.difficulty.dot_count());
        self.sequence.push(cell);
    }

    fn start_playback(&mut self, ctx: &mut RoundCtx<'_>) {
        self.showing_sequence = true;
        self.player_index = 0;
        self.playback = Some(Playback {
            step: 0,
            lit: false,
        });
        ctx.loops
            .start(LoopName::CopyPlayback, Cadence::Once(COPY_LEAD_IN));
    }

    fn advance_playback(&mut self, ctx: &mut RoundCtx<'_>) {
        let Some(mut cursor) = self.playback else {
            return;
        };

        if !cursor.lit {
            let Some(&cell) = self.sequence.get(cursor.step) else {
                self.finish_playback(ctx);
                return;
            };
            ctx.board.clear_active();
            ctx.board.activate(cell);
            ctx.intents.emit(Intent::SequenceCell { cell });
            cursor.lit = true;
            self.playback = Some(cursor);
            ctx.loops
                .start(LoopName::CopyPlayback, Cadence::Once(copy_hold(self.round)));
            return;
        }

        ctx.board.clear_active();
        cursor.lit = false;
        cursor.step += 1;
        if cursor.step >= self.sequence.len() {
            self.finish_playback(ctx);
            return;
        }
        self.playback = Some(cursor);
        ctx.loops
            .start(LoopName::CopyPlayback, Cadence::Once(copy_gap(self.round)));
    }

    fn finish_playback(&mut self, ctx: &mut RoundCtx<'_>) {
        ctx.board.clear_active();
        self.playback = None;
        self.showing_sequence = false;
        self.player_index = 0;
    }
}
