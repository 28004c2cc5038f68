//! Zoomy: catch dots drifting across the play field
//!
//! Positions are normalized to the unit square. A dot enters from one edge,
//! flies straight toward the opposite edge, and costs a life if it leaves the
//! padded field uncaught.

use std::time::Duration;

use glam::DVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::difficulty::{
    ZOOMY_START_INTERVAL, ZOOMY_START_SPEED, zoomy_fast_chance, zoomy_max_dots,
    zoomy_next_interval, zoomy_next_speed,
};
use super::mode::STARTING_LIVES;
use super::state::{RoundCtx, Step};
use crate::consts::FRAME_TICK;
use crate::intents::Intent;
use crate::scheduler::{Cadence, LoopName};

/// Field bounds including the off-screen margin
pub const FIELD_MIN: f64 = -0.15;
pub const FIELD_MAX: f64 = 1.15;
/// Spawn line just outside the visible square
const SPAWN_OFFSET: f64 = 0.1;
/// Fast dots move at this multiple of the base speed
pub const FAST_MULTIPLIER: f64 = 2.0;

/// Screen edges: 0 top, 1 right, 2 bottom, 3 left
pub type Edge = u8;

/// A dot in flight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomyDot {
    pub id: u32,
    pub position: DVec2,
    /// Unit direction of travel
    pub velocity: DVec2,
    pub is_fast: bool,
    pub exit_edge: Edge,
}

impl ZoomyDot {
    /// Spawn on `edge`, heading for a random point on the opposite edge
    pub fn spawn<R: Rng + ?Sized>(id: u32, edge: Edge, is_fast: bool, rng: &mut R) -> Self {
        let start = edge_point(edge, rng.random_range(0.1..0.9));
        let exit_edge = (edge + 2) % 4;
        let target = edge_point(exit_edge, rng.random_range(0.1..0.9));
        Self {
            id,
            position: start,
            velocity: (target - start).normalize(),
            is_fast,
            exit_edge,
        }
    }

    /// Move for `dt` seconds at `speed` field-widths per second
    pub fn advance(&mut self, speed: f64, dt: f64) {
        let multiplier = if self.is_fast { FAST_MULTIPLIER } else { 1.0 };
        self.position += self.velocity * speed * multiplier * dt;
    }

    pub fn has_exited(&self) -> bool {
        let p = self.position;
        p.x < FIELD_MIN || p.x > FIELD_MAX || p.y < FIELD_MIN || p.y > FIELD_MAX
    }
}

/// Point `t` of the way along an edge's spawn line
fn edge_point(edge: Edge, t: f64) -> DVec2 {
    match edge % 4 {
        0 => DVec2::new(t, -SPAWN_OFFSET),
        1 => DVec2::new(1.0 + SPAWN_OFFSET, t),
        2 => DVec2::new(t, 1.0 + SPAWN_OFFSET),
        _ => DVec2::new(-SPAWN_OFFSET, t),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoomyState {
    pub dots: Vec<ZoomyDot>,
    pub lives: u32,
    pub score: u32,
    /// Seconds between spawns
    pub spawn_interval: f64,
    pub dot_speed: f64,
    pub max_dots: usize,
    next_id: u32,
}

impl Default for ZoomyState {
    fn default() -> Self {
        Self::new()
    }
}

impl ZoomyState {
    pub fn new() -> Self {
        Self {
            dots: Vec::new(),
            lives: STARTING_LIVES,
            score: 0,
            spawn_interval: ZOOMY_START_INTERVAL,
            dot_speed: ZOOMY_START_SPEED,
            max_dots: zoomy_max_dots(0),
            next_id: 1,
        }
    }

    pub fn begin_round(&mut self, ctx: &mut RoundCtx<'_>) {
        ctx.board.reset();
        self.dots.clear();
        self.spawn(ctx);
        self.schedule_spawn(ctx);
        ctx.loops
            .start(LoopName::ZoomyUpdate, Cadence::Every(FRAME_TICK));
    }

    pub fn catch_dot(&mut self, id: u32, ctx: &mut RoundCtx<'_>) -> Step {
        let Some(index) = self.dots.iter().position(|d| d.id == id) else {
            return Step::Continue;
        };
        self.dots.remove(index);
        self.score += 1;
        self.dot_speed = zoomy_next_speed(self.dot_speed);
        self.spawn_interval = zoomy_next_interval(self.spawn_interval);
        self.max_dots = zoomy_max_dots(self.score);
        ctx.intents.emit(Intent::ScorePoint {
            mode: ctx.mode,
            value: self.score,
        });
        Step::Continue
    }

    pub fn on_loop(&mut self, name: LoopName, dt: f64, ctx: &mut RoundCtx<'_>) -> Step {
        match name {
            LoopName::ZoomySpawner => {
                if self.dots.len() < self.max_dots {
                    self.spawn(ctx);
                }
                self.schedule_spawn(ctx);
                Step::Continue
            }
            LoopName::ZoomyUpdate => self.update(dt, ctx),
            _ => Step::Continue,
        }
    }

    fn update(&mut self, dt: f64, ctx: &mut RoundCtx<'_>) -> Step {
        for dot in &mut self.dots {
            dot.advance(self.dot_speed, dt);
        }

        let before = self.dots.len();
        self.dots.retain(|d| !d.has_exited());
        let escaped = (before - self.dots.len()) as u32;
        if escaped == 0 {
            return Step::Continue;
        }

        self.lives = self.lives.saturating_sub(escaped);
        if self.lives == 0 {
            ctx.loops.cancel(LoopName::ZoomyUpdate);
            ctx.loops.cancel(LoopName::ZoomySpawner);
            return Step::Exhausted;
        }
        ctx.intents.emit(Intent::LifeLost {
            mode: ctx.mode,
            lives_left: self.lives,
        });
        Step::Continue
    }

    fn spawn(&mut self, ctx: &mut RoundCtx<'_>) {
        let edge = ctx.rng.random_range(0..4);
        let is_fast = ctx.rng.random_bool(zoomy_fast_chance(self.score));
        let dot = ZoomyDot::spawn(self.next_id, edge, is_fast, ctx.rng);
        self.next_id += 1;
        self.dots.push(dot);
    }

    fn schedule_spawn(&self, ctx: &mut RoundCtx<'_>) {
        ctx.loops.start(
            LoopName::ZoomySpawner,
            Cadence::Once(Duration::from_secs_f64(self.spawn_interval)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::LoopControl;
    use crate::sim::GameMode;
    use crate::sim::state::test_support::Harness;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn started(seed: u64) -> (Harness, ZoomyState) {
        let mut h = Harness::new(GameMode::Zoomy, seed);
        let mut state = ZoomyState::new();
        state.begin_round(&mut h.ctx());
        (h, state)
    }

    #[test]
    fn test_spawned_dot_heads_for_opposite_edge() {
        let mut rng = Pcg32::seed_from_u64(3);
        for edge in 0..4 {
            let dot = ZoomyDot::spawn(1, edge, false, &mut rng);
            assert_eq!(dot.exit_edge, (edge + 2) % 4);
            assert!(!dot.has_exited());
            assert!((dot.velocity.length() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_fast_dot_moves_twice_as_far() {
        let mut rng = Pcg32::seed_from_u64(9);
        let mut slow = ZoomyDot::spawn(1, 3, false, &mut rng);
        let mut fast = slow;
        fast.is_fast = true;
        let origin = slow.position;
        slow.advance(0.2, 0.5);
        fast.advance(0.2, 0.5);
        let d_slow = (slow.position - origin).length();
        let d_fast = (fast.position - origin).length();
        assert!((d_fast - 2.0 * d_slow).abs() < 1e-9);
    }

    #[test]
    fn test_escape_costs_exactly_one_life() {
        let (mut h, mut state) = started(5);
        // Stop the spawner so only the first dot is in play
        h.loops.cancel(LoopName::ZoomySpawner);
        assert_eq!(state.dots.len(), 1);

        let mut guard = 0;
        while !state.dots.is_empty() {
            let dt = h.fire(LoopName::ZoomyUpdate).unwrap();
            assert_eq!(state.on_loop(LoopName::ZoomyUpdate, dt, &mut h.ctx()), Step::Continue);
            guard += 1;
            assert!(guard < 10_000);
        }
        assert_eq!(state.lives, STARTING_LIVES - 1);

        // Nothing left to escape, nothing more to lose
        let dt = h.fire(LoopName::ZoomyUpdate).unwrap();
        state.on_loop(LoopName::ZoomyUpdate, dt, &mut h.ctx());
        assert_eq!(state.lives, STARTING_LIVES - 1);
    }

    #[test]
    fn test_catch_ramps_speed_and_interval() {
        let (mut h, mut state) = started(6);
        let id = state.dots[0].id;
        state.catch_dot(id, &mut h.ctx());
        assert_eq!(state.score, 1);
        assert!(state.dots.is_empty());
        assert!((state.dot_speed - ZOOMY_START_SPEED * 1.05).abs() < 1e-12);
        assert!((state.spawn_interval - ZOOMY_START_INTERVAL * 0.95).abs() < 1e-12);

        // Unknown id is ignored
        state.catch_dot(id, &mut h.ctx());
        assert_eq!(state.score, 1);
    }

    #[test]
    fn test_last_life_exhausts() {
        let (mut h, mut state) = started(8);
        state.lives = 1;
        h.loops.cancel(LoopName::ZoomySpawner);
        let mut step = Step::Continue;
        while step == Step::Continue {
            let dt = h.fire(LoopName::ZoomyUpdate).unwrap();
            step = state.on_loop(LoopName::ZoomyUpdate, dt, &mut h.ctx());
        }
        assert_eq!(step, Step::Exhausted);
        assert_eq!(state.lives, 0);
        assert!(!h.loops.is_running(LoopName::ZoomyUpdate));
    }
}
