//! Matchy: memory pairs for one to four players
//!
//! Five colors, two cells each. A match keeps the turn; a miss hides both
//! cells after a delay and passes the turn. The game ends once every cell is
//! matched.

use std::time::Duration;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::state::{RoundCtx, Step};
use crate::board::{CELL_COUNT, CellId, CellSet};
use crate::intents::Intent;
use crate::scheduler::{Cadence, LoopName};

pub const PAIR_COUNT: u32 = (CELL_COUNT / 2) as u32;
pub const MAX_PLAYERS: u8 = 4;
/// How long a mismatched pair stays face up
pub const MISMATCH_HIDE_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchyState {
    /// Color index per cell; each color appears exactly twice
    pub color_of: [u8; CELL_COUNT],
    /// Face-up, not yet matched
    pub revealed: CellSet,
    pub matched: CellSet,
    pub first_pick: Option<CellId>,
    /// Input blocked while a mismatch is on show
    pub locked: bool,
    pub players: u8,
    pub current_player: u8,
    pub scores: Vec<u32>,
    /// Pairs flipped so far
    pub attempts: u32,
    pending_hide: Option<(CellId, CellId)>,
}

impl MatchyState {
    pub fn new(players: u8) -> Self {
        let players = players.clamp(1, MAX_PLAYERS);
        Self {
            color_of: [0; CELL_COUNT],
            revealed: CellSet::empty(),
            matched: CellSet::empty(),
            first_pick: None,
            locked: false,
            players,
            current_player: 0,
            scores: vec![0; players as usize],
            attempts: 0,
            pending_hide: None,
        }
    }

    pub fn begin_round(&mut self, ctx: &mut RoundCtx<'_>) {
        let mut colors: Vec<u8> = (0..CELL_COUNT).map(|i| (i / 2) as u8).collect();
        colors.shuffle(ctx.rng);
        self.color_of.copy_from_slice(&colors);
        self.revealed.clear();
        self.matched.clear();
        self.first_pick = None;
        self.locked = false;
        self.pending_hide = None;
        self.sync_board(ctx);
    }

    pub fn handle_tap(&mut self, cell: CellId, ctx: &mut RoundCtx<'_>) -> Step {
        if (cell as usize) >= CELL_COUNT
            || self.locked
            || self.matched.contains(cell)
            || self.revealed.contains(cell)
        {
            return Step::Continue;
        }

        self.revealed.insert(cell);
        let Some(first) = self.first_pick.take() else {
            self.first_pick = Some(cell);
            self.sync_board(ctx);
            return Step::Continue;
        };

        self.attempts += 1;
        if self.color_of[first as usize] == self.color_of[cell as usize] {
            self.revealed.remove(first);
            self.revealed.remove(cell);
            self.matched.insert(first);
            self.matched.insert(cell);
            let player = self.current_player as usize;
            self.scores[player] += 1;
            ctx.intents.emit(Intent::ScorePoint {
                mode: ctx.mode,
                value: self.scores[player],
            });
            self.sync_board(ctx);

            if self.is_complete() {
                if self.is_perfect() {
                    ctx.intents.emit(Intent::PerfectRound);
                }
                return Step::Finished;
            }
            return Step::Continue;
        }

        self.locked = true;
        self.pending_hide = Some((first, cell));
        self.sync_board(ctx);
        ctx.loops
            .start(LoopName::MatchyHide, Cadence::Once(MISMATCH_HIDE_DELAY));
        Step::Continue
    }

    pub fn on_loop(&mut self, name: LoopName, ctx: &mut RoundCtx<'_>) -> Step {
        if name != LoopName::MatchyHide {
            return Step::Continue;
        }
        if let Some((a, b)) = self.pending_hide.take() {
            self.revealed.remove(a);
            self.revealed.remove(b);
        }
        self.locked = false;
        if self.players > 1 {
            self.current_player = (self.current_player + 1) % self.players;
        }
        self.sync_board(ctx);
        Step::Continue
    }

    pub fn is_complete(&self) -> bool {
        self.matched.len() == CELL_COUNT
    }

    /// Solo game cleared without a single miss
    pub fn is_perfect(&self) -> bool {
        self.players == 1 && self.is_complete() && self.attempts == PAIR_COUNT
    }

    /// Highest pair count among players
    pub fn best_pairs(&self) -> u32 {
        self.scores.iter().copied().max().unwrap_or(0)
    }

    /// Face-up cells are lit; matched cells count as pressed
    fn sync_board(&self, ctx: &mut RoundCtx<'_>) {
        ctx.board.reset();
        for cell in self.matched.iter() {
            ctx.board.mark_pressed(cell);
        }
        for cell in self.revealed.iter() {
            ctx.board.activate(cell);
        }
    }
}
