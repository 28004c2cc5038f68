//! Daily challenge seeding
//!
//! The board RNG is seeded from a hash of the date string, so everyone gets
//! the same Daily board on the same day. The round length comes from a
//! per-year shuffle of 10..=60 seconds indexed by day of year, so no length
//! repeats within a 51-day cycle.

use chrono::{Datelike, NaiveDate};

/// Shortest Daily round in seconds
pub const MIN_DURATION: u32 = 10;
/// Longest Daily round in seconds
pub const MAX_DURATION: u32 = 60;
/// Distinct durations in one cycle
pub const CYCLE_LEN: usize = (MAX_DURATION - MIN_DURATION + 1) as usize;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a
pub fn fnv1a64(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, &b| {
        (hash ^ b as u64).wrapping_mul(FNV_PRIME)
    })
}

/// Marsaglia xorshift64
#[derive(Debug, Clone)]
pub struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    pub fn new(seed: u64) -> Self {
        // Zero is a fixed point of xorshift
        let state = if seed == 0 { FNV_OFFSET } else { seed };
        Self { state }
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}

/// `YYYY-MM-DD`
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// RNG seed for the Daily board on `date`
pub fn seed_for_date(date: NaiveDate) -> u64 {
    fnv1a64(day_key(date).as_bytes())
}

/// This year's order of Daily durations
pub fn yearly_durations(year: i32) -> Vec<u32> {
    let mut durations: Vec<u32> = (MIN_DURATION..=MAX_DURATION).collect();
    let mut rng = XorShift64::new(fnv1a64(year.to_string().as_bytes()));
    // Fisher-Yates
    for i in (1..durations.len()).rev() {
        let j = (rng.next_u64() % (i as u64 + 1)) as usize;
        durations.swap(i, j);
    }
    durations
}

/// Daily round length for `date`
pub fn duration_for_date(date: NaiveDate) -> u32 {
    let durations = yearly_durations(date.year());
    durations[date.ordinal0() as usize % CYCLE_LEN]
}
