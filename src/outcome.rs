//! Terminal round reports
//!
//! The reporter looks up the stored best when a round starts, then turns the
//! round's final value into exactly one [`OutcomeEvent`]. Early-ended rounds
//! are disarmed and never report.

use serde::{Deserialize, Serialize};

use crate::highscores::HighscoreStore;
use crate::sim::GameMode;

/// How the round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeKind {
    /// Clock ran out or the board was cleared
    Finished,
    /// Fault or last life lost
    GameOver,
}

/// Result of one round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeEvent {
    pub mode: GameMode,
    /// Points, round reached or pairs matched, depending on mode
    pub score_or_round: u32,
    /// Round length for timed modes, board size for Copy, else 0
    pub duration_or_zero: u32,
    pub is_new_high: bool,
    pub kind: OutcomeKind,
    /// Single-player Matchy cleared without a miss
    pub perfect: bool,
}

/// Arms at round start, fires once at round end
#[derive(Debug, Clone, Default)]
pub struct OutcomeReporter {
    armed: Option<Armed>,
}

#[derive(Debug, Clone, Copy)]
struct Armed {
    mode: GameMode,
    duration: u32,
    best: u32,
    ranked: bool,
}

impl OutcomeReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the high-score threshold for a new round and return it
    pub fn arm<H: HighscoreStore + ?Sized>(
        &mut self,
        store: &H,
        mode: GameMode,
        duration: u32,
        ranked: bool,
    ) -> u32 {
        let best = store.best(mode, duration);
        self.armed = Some(Armed {
            mode,
            duration,
            best,
            ranked,
        });
        best
    }

    /// Stored best for the armed round
    pub fn threshold(&self) -> Option<u32> {
        self.armed.map(|a| a.best)
    }

    /// Drop the pending report (early end)
    pub fn disarm(&mut self) {
        self.armed = None;
    }

    /// Produce the round's report and record it with the store.
    ///
    /// Returns None if the reporter was not armed, so a round can report at
    /// most once.
    pub fn report<H: HighscoreStore + ?Sized>(
        &mut self,
        store: &mut H,
        value: u32,
        kind: OutcomeKind,
        perfect: bool,
    ) -> Option<OutcomeEvent> {
        let armed = self.armed.take()?;
        let is_new_high = armed.ranked && value > armed.best;
        if armed.ranked {
            store.register(value, armed.mode, armed.duration);
        }

        let event = OutcomeEvent {
            mode: armed.mode,
            score_or_round: value,
            duration_or_zero: armed.duration,
            is_new_high,
            kind,
            perfect,
        };
        log::info!(
            "{} round over: {} (best {}, new high: {})",
            armed.mode.name(),
            value,
            armed.best,
            is_new_high
        );
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highscores::HighScores;

    #[test]
    fn test_reports_once() {
        let mut store = HighScores::new();
        let mut reporter = OutcomeReporter::new();
        reporter.arm(&store, GameMode::Classic, 10, true);

        let event = reporter
            .report(&mut store, 4, OutcomeKind::Finished, false)
            .unwrap();
        assert!(event.is_new_high);
        assert_eq!(event.duration_or_zero, 10);
        assert!(reporter
            .report(&mut store, 9, OutcomeKind::Finished, false)
            .is_none());
        assert_eq!(store.best(GameMode::Classic, 10), 4);
    }

    #[test]
    fn test_disarmed_round_never_reports() {
        let mut store = HighScores::new();
        let mut reporter = OutcomeReporter::new();
        reporter.arm(&store, GameMode::Boppy, 30, true);
        reporter.disarm();
        assert!(reporter
            .report(&mut store, 50, OutcomeKind::Finished, false)
            .is_none());
        assert_eq!(store.best(GameMode::Boppy, 30), 0);
    }

    #[test]
    fn test_tie_is_not_new_high() {
        let mut store = HighScores::new();
        store.register(7, GameMode::Seeky, 0);
        let mut reporter = OutcomeReporter::new();
        assert_eq!(reporter.arm(&store, GameMode::Seeky, 0, true), 7);
        let event = reporter
            .report(&mut store, 7, OutcomeKind::GameOver, false)
            .unwrap();
        assert!(!event.is_new_high);
    }

    #[test]
    fn test_unranked_round_not_recorded() {
        let mut store = HighScores::new();
        let mut reporter = OutcomeReporter::new();
        reporter.arm(&store, GameMode::Matchy, 0, false);
        let event = reporter
            .report(&mut store, 5, OutcomeKind::Finished, false)
            .unwrap();
        assert!(!event.is_new_high);
        assert_eq!(store.best(GameMode::Matchy, 0), 0);
    }
}
