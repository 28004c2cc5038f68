//! Difficulty curves
//!
//! Pure functions from a mode's progress counter to its tuning values.

use std::time::Duration;

// === Copy ===

/// Base light-up time for one sequence entry
pub const COPY_HOLD_BASE: f64 = 0.5;
/// Base dark gap between entries
pub const COPY_GAP_BASE: f64 = 0.2;

/// Playback speed multiplier: 0.85 per five rounds, never below 0.5
pub fn copy_speed_multiplier(round: u32) -> f64 {
    let steps = round.saturating_sub(1) / 5;
    0.85f64.powi(steps as i32).max(0.5)
}

pub fn copy_hold(round: u32) -> Duration {
    Duration::from_secs_f64(COPY_HOLD_BASE * copy_speed_multiplier(round))
}

pub fn copy_gap(round: u32) -> Duration {
    Duration::from_secs_f64(COPY_GAP_BASE * copy_speed_multiplier(round))
}

// === Boppy ===

/// Points between Boppy speed-ups
pub const BOPPY_STEP_POINTS: u32 = 8;

pub fn boppy_dot_lifetime(score: u32) -> f64 {
    let steps = (score / BOPPY_STEP_POINTS) as f64;
    (1.0 - 0.05 * steps).max(0.5)
}

pub fn boppy_spawn_interval(score: u32) -> f64 {
    let steps = (score / BOPPY_STEP_POINTS) as f64;
    (0.8 - 0.05 * steps).max(0.3)
}

pub fn boppy_max_dots(score: u32) -> usize {
    match score {
        0..16 => 2,
        16..32 => 3,
        _ => 4,
    }
}

// === Zoomy ===

pub const ZOOMY_START_SPEED: f64 = 0.2;
pub const ZOOMY_MAX_SPEED: f64 = 0.35;
pub const ZOOMY_START_INTERVAL: f64 = 1.5;
pub const ZOOMY_MIN_INTERVAL: f64 = 0.35;

/// Score thresholds that each allow one more dot on screen
pub const ZOOMY_DOT_THRESHOLDS: [u32; 6] = [3, 6, 10, 15, 22, 30];

/// Speed after one more catch
pub fn zoomy_next_speed(speed: f64) -> f64 {
    (speed * 1.05).min(ZOOMY_MAX_SPEED)
}

/// Spawn interval after one more catch
pub fn zoomy_next_interval(interval: f64) -> f64 {
    (interval * 0.95).max(ZOOMY_MIN_INTERVAL)
}

pub fn zoomy_max_dots(score: u32) -> usize {
    1 + ZOOMY_DOT_THRESHOLDS.iter().filter(|&&t| score >= t).count()
}

/// Chance a new dot is a fast one
pub fn zoomy_fast_chance(score: u32) -> f64 {
    if score < 5 { 0.0 } else { 0.2 }
}

// === Tappy ===

pub fn tappy_cell_count(round: u32) -> usize {
    round.clamp(1, 10) as usize
}

/// Time window for a Tappy round: 2.0s at round 1, 1.5s at round 6,
/// 0.7s from round 11 on.
pub fn tappy_time_limit(round: u32) -> f64 {
    let r = round.max(1) as f64;
    if r <= 6.0 {
        2.0 - 0.1 * (r - 1.0)
    } else {
        (1.5 - 0.16 * (r - 6.0)).max(0.7)
    }
}

// === Seeky ===

pub const SEEKY_TIME_LIMIT: f64 = 5.0;
pub const SEEKY_MIN_DELTA: f64 = 0.04;

/// Saturation gap between the odd cell and the rest
pub fn seeky_saturation_delta(round: u32) -> f64 {
    let steps = round.saturating_sub(1) as i32;
    (0.35 * 0.85f64.powi(steps)).max(SEEKY_MIN_DELTA)
}
