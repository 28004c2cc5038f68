//! Boppy: whack-a-mole against the round clock
//!
//! Cells pop up in small batches and vanish on their own after a lifetime.
//! Missing one costs nothing; hitting one scores.

use std::collections::BTreeMap;
use std::time::Duration;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::difficulty::{boppy_dot_lifetime, boppy_max_dots, boppy_spawn_interval};
use super::state::{RoundCtx, Step};
use crate::board::CellId;
use crate::consts::COARSE_TICK;
use crate::intents::Intent;
use crate::scheduler::{Cadence, LoopName};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoppyState {
    /// Lit cells and the seconds each has left
    pub active_dots: BTreeMap<CellId, f64>,
    pub dot_lifetime: f64,
    pub spawn_interval: f64,
    pub max_dots: usize,
    pub remaining: f64,
    pub duration_secs: u32,
    pub score: u32,
}

impl BoppyState {
    pub fn new(duration_secs: u32) -> Self {
        Self {
            active_dots: BTreeMap::new(),
            dot_lifetime: boppy_dot_lifetime(0),
            spawn_interval: boppy_spawn_interval(0),
            max_dots: boppy_max_dots(0),
            remaining: duration_secs as f64,
            duration_secs,
            score: 0,
        }
    }

    pub fn begin_round(&mut self, ctx: &mut RoundCtx<'_>) {
        ctx.board.reset();
        self.active_dots.clear();
        self.remaining = self.duration_secs as f64;
        self.spawn_batch(ctx);
        self.schedule_spawn(ctx);
        ctx.loops
            .start(LoopName::BoppyCleanup, Cadence::Every(COARSE_TICK));
        ctx.loops
            .start(LoopName::RoundTicker, Cadence::Every(COARSE_TICK));
    }

    pub fn handle_tap(&mut self, cell: CellId, ctx: &mut RoundCtx<'_>) -> Step {
        // Expired or never-lit cells are harmless
        if self.active_dots.remove(&cell).is_none() {
            return Step::Continue;
        }
        ctx.board.deactivate(cell);
        self.score += 1;
        self.dot_lifetime = boppy_dot_lifetime(self.score);
        self.spawn_interval = boppy_spawn_interval(self.score);
        self.max_dots = boppy_max_dots(self.score);
        ctx.intents.emit(Intent::ScorePoint {
            mode: ctx.mode,
            value: self.score,
        });
        Step::Continue
    }

    pub fn on_loop(&mut self, name: LoopName, dt: f64, ctx: &mut RoundCtx<'_>) -> Step {
        match name {
            LoopName::BoppySpawner => {
                self.spawn_batch(ctx);
                self.schedule_spawn(ctx);
            }
            LoopName::BoppyCleanup => self.expire(dt, ctx),
            LoopName::RoundTicker => {
                self.remaining = (self.remaining - dt).max(0.0);
                if self.remaining <= 0.0 {
                    for name in [
                        LoopName::RoundTicker,
                        LoopName::BoppySpawner,
                        LoopName::BoppyCleanup,
                    ] {
                        ctx.loops.cancel(name);
                    }
                    return Step::Finished;
                }
            }
            _ => {}
        }
        Step::Continue
    }

    fn schedule_spawn(&self, ctx: &mut RoundCtx<'_>) {
        ctx.loops.start(
            LoopName::BoppySpawner,
            Cadence::Once(Duration::from_secs_f64(self.spawn_interval)),
        );
    }

    /// Light 1-3 free cells (15% three, 40% two), capped by `max_dots`
    fn spawn_batch(&mut self, ctx: &mut RoundCtx<'_>) {
        let room = self.max_dots.saturating_sub(self.active_dots.len());
        if room == 0 {
            return;
        }

        let roll: f64 = ctx.rng.random();
        let wanted = if roll < 0.15 {
            3
        } else if roll < 0.55 {
            2
        } else {
            1
        };

        let mut free = ctx.board.free().to_vec();
        free.shuffle(ctx.rng);
        for cell in free.into_iter().take(wanted.min(room)) {
            ctx.board.activate(cell);
            self.active_dots.insert(cell, self.dot_lifetime);
        }
    }

    fn expire(&mut self, dt: f64, ctx: &mut RoundCtx<'_>) {
        for life in self.active_dots.values_mut() {
            *life -= dt;
        }
        let expired: Vec<CellId> = self
            .active_dots
            .iter()
            .filter(|&(_, &life)| life <= 0.0)
            .map(|(&cell, _)| cell)
            .collect();
        for cell in expired {
            self.active_dots.remove(&cell);
            ctx.board.deactivate(cell);
        }
    }
}
