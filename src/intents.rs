//! Presentation intents
//!
//! The engine never plays sounds, fires haptics or animates anything itself.
//! It emits fire-and-forget intents through an injected [`IntentSink`];
//! consuming them is optional and never feeds back into game state.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::board::CellId;
use crate::outcome::OutcomeEvent;
use crate::sim::GameMode;

/// Intent types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Intent {
    /// Countdown advanced (3, 2, 1)
    CountdownTick { remaining: u8 },
    /// Round went live
    RoundStarted { mode: GameMode },
    /// Correct tap / catch / match
    ScorePoint { mode: GameMode, value: u32 },
    /// Fatal tap or final life lost
    Fault { mode: GameMode },
    /// Non-fatal life loss
    LifeLost { mode: GameMode, lives_left: u32 },
    /// Sub-round cleared (Copy sequence, Tappy round)
    RoundWin { mode: GameMode, round: u32 },
    /// Live value passed the stored best
    NewHighCrossed { mode: GameMode, best: u32 },
    /// Single-player Matchy cleared with no misses
    PerfectRound,
    /// Copy playback lit a cell
    SequenceCell { cell: CellId },
    /// One cell of a theme-change wave
    ThemeWaveTick { cell: CellId, delay_ms: u32 },
    /// Tap on the idle board
    Fidget { cell: CellId, ripple: Vec<CellId> },
    /// Terminal report
    RoundOver(OutcomeEvent),
}

/// Capability the engine calls through to surface intents
pub trait IntentSink: Send {
    fn emit(&self, intent: Intent);
}

/// Drops every intent
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl IntentSink for NullSink {
    fn emit(&self, _intent: Intent) {}
}

/// Records intents in memory; clones share the same log
#[derive(Debug, Clone, Default)]
pub struct IntentLog {
    entries: Arc<Mutex<Vec<Intent>>>,
}

impl IntentLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far
    pub fn entries(&self) -> Vec<Intent> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Take and clear the recorded intents
    pub fn drain(&self) -> Vec<Intent> {
        self.entries
            .lock()
            .map(|mut e| std::mem::take(&mut *e))
            .unwrap_or_default()
    }

    pub fn count(&self, pred: impl Fn(&Intent) -> bool) -> usize {
        self.entries
            .lock()
            .map(|e| e.iter().filter(|i| pred(i)).count())
            .unwrap_or(0)
    }
}

impl IntentSink for IntentLog {
    fn emit(&self, intent: Intent) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(intent);
        }
    }
}

impl IntentSink for tokio::sync::mpsc::UnboundedSender<Intent> {
    fn emit(&self, intent: Intent) {
        // Receiver gone means nobody is presenting; that's fine
        let _ = self.send(intent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_clones_share_entries() {
        let log = IntentLog::new();
        let sink: Box<dyn IntentSink> = Box::new(log.clone());
        sink.emit(Intent::PerfectRound);
        sink.emit(Intent::CountdownTick { remaining: 2 });

        assert_eq!(log.count(|i| matches!(i, Intent::CountdownTick { .. })), 1);
        assert_eq!(log.drain().len(), 2);
        assert!(log.entries().is_empty());
    }

    #[test]
    fn test_channel_sink_ignores_closed_receiver() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        drop(rx);
        tx.emit(Intent::PerfectRound);
    }
}
