//! Named, cancellable timing loops
//!
//! Every time-driven transition in a round comes from a named loop. At most one
//! instance per [`LoopName`] is alive at a time: starting a name again replaces
//! the previous instance. Each instance carries a generation number, and the
//! owner discards any event whose generation is no longer live, so a loop that
//! fires after being cancelled has no effect.
//!
//! [`Loops`] is the owner-side registry. The actual sleeping is delegated to a
//! [`Scheduler`]: [`TokioScheduler`] for real time, [`ManualScheduler`] for
//! tests and deterministic replays.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Loop identities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LoopName {
    /// Pre-round 3-2-1
    Countdown,
    /// Round clock for timed modes
    RoundTicker,
    BoppySpawner,
    BoppyCleanup,
    ZoomySpawner,
    ZoomyUpdate,
    TappyRoundTimer,
    SeekyTimer,
    /// Copy sequence playback steps
    CopyPlayback,
    /// Matchy mismatch re-hide
    MatchyHide,
    /// Transitional pause inside a mode (between sub-rounds, answer reveal)
    ModePause,
    /// Cooldown back to idle
    Settle,
    /// New-high banner dismissal
    Celebration,
}

impl LoopName {
    /// Loops that survive mode-level cleanup and are only cancelled by the
    /// controller itself
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            LoopName::Countdown | LoopName::Settle | LoopName::Celebration
        )
    }
}

/// How a loop fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Repeatedly, every period
    Every(Duration),
    /// Once, after a delay
    Once(Duration),
}

impl Cadence {
    pub fn period(&self) -> Duration {
        match *self {
            Cadence::Every(d) | Cadence::Once(d) => d,
        }
    }

    pub fn is_once(&self) -> bool {
        matches!(self, Cadence::Once(_))
    }
}

/// A request to run one loop instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSpec {
    pub name: LoopName,
    pub generation: u64,
    pub cadence: Cadence,
}

/// Event delivered to the owner when a loop wakes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopFired {
    pub name: LoopName,
    pub generation: u64,
    /// Nominal seconds covered by this wake-up
    pub dt: f64,
}

impl LoopSpec {
    pub fn fired(&self) -> LoopFired {
        LoopFired {
            name: self.name,
            generation: self.generation,
            dt: self.cadence.period().as_secs_f64(),
        }
    }
}

/// Backend that actually sleeps and wakes loops
pub trait Scheduler: Send {
    /// Run `spec`, replacing any instance with the same name
    fn spawn(&mut self, spec: LoopSpec);
    /// Stop the named loop; it must not deliver further events
    fn cancel(&mut self, name: LoopName);
}

/// Loop control as seen by mode state machines
pub trait LoopControl {
    fn start(&mut self, name: LoopName, cadence: Cadence);
    fn cancel(&mut self, name: LoopName);
    fn is_running(&self, name: LoopName) -> bool;
}

/// Owner-side registry of live loop generations
#[derive(Debug)]
pub struct Loops<S: Scheduler> {
    scheduler: S,
    live: HashMap<LoopName, (u64, Cadence)>,
    next_generation: u64,
}

impl<S: Scheduler> Loops<S> {
    pub fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            live: HashMap::new(),
            next_generation: 1,
        }
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Names currently alive, sorted
    pub fn running(&self) -> Vec<LoopName> {
        let mut names: Vec<LoopName> = self.live.keys().copied().collect();
        names.sort();
        names
    }

    /// Cancel every live loop
    pub fn cancel_all(&mut self) {
        for name in self.running() {
            self.cancel(name);
        }
    }

    /// Cancel every loop except the lifecycle ones
    pub fn cancel_mode_loops(&mut self) {
        for name in self.running() {
            if !name.is_lifecycle() {
                self.cancel(name);
            }
        }
    }

    /// Check an incoming event against the registry.
    ///
    /// Returns false for stale events (cancelled or replaced instances).
    /// A one-shot loop is retired by its first accepted event.
    pub fn accept(&mut self, fired: &LoopFired) -> bool {
        match self.live.get(&fired.name) {
            Some(&(generation, cadence)) if generation == fired.generation => {
                if cadence.is_once() {
                    self.live.remove(&fired.name);
                }
                true
            }
            _ => false,
        }
    }
}

impl<S: Scheduler> LoopControl for Loops<S> {
    fn start(&mut self, name: LoopName, cadence: Cadence) {
        let generation = self.next_generation;
        self.next_generation += 1;
        self.live.insert(name, (generation, cadence));
        self.scheduler.spawn(LoopSpec {
            name,
            generation,
            cadence,
        });
    }

    fn cancel(&mut self, name: LoopName) {
        if self.live.remove(&name).is_some() {
            self.scheduler.cancel(name);
        }
    }

    fn is_running(&self, name: LoopName) -> bool {
        self.live.contains_key(&name)
    }
}

/// Real-time scheduler backed by tokio tasks.
///
/// Each loop is a task that sleeps, re-checks its cancellation flag, then
/// forwards a [`LoopFired`] to the owner. Must be used inside a tokio runtime.
pub struct TokioScheduler {
    tx: mpsc::UnboundedSender<LoopFired>,
    tasks: HashMap<LoopName, (JoinHandle<()>, Arc<AtomicBool>)>,
}

impl TokioScheduler {
    pub fn new(tx: mpsc::UnboundedSender<LoopFired>) -> Self {
        Self {
            tx,
            tasks: HashMap::new(),
        }
    }

    /// Number of task handles still held
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }
}

impl Scheduler for TokioScheduler {
    fn spawn(&mut self, spec: LoopSpec) {
        self.cancel(spec.name);

        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();
        let tx = self.tx.clone();

        let handle = tokio::spawn(async move {
            match spec.cadence {
                Cadence::Once(delay) => {
                    tokio::time::sleep(delay).await;
                    if !flag.load(Ordering::Acquire) {
                        let _ = tx.send(spec.fired());
                    }
                }
                Cadence::Every(period) => {
                    let start = tokio::time::Instant::now() + period;
                    let mut interval = tokio::time::interval_at(start, period);
                    loop {
                        interval.tick().await;
                        if flag.load(Ordering::Acquire) {
                            break;
                        }
                        if tx.send(spec.fired()).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        self.tasks.insert(spec.name, (handle, cancelled));
    }

    fn cancel(&mut self, name: LoopName) {
        if let Some((handle, flag)) = self.tasks.remove(&name) {
            flag.store(true, Ordering::Release);
            handle.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, (handle, flag)) in self.tasks.drain() {
            flag.store(true, Ordering::Release);
            handle.abort();
        }
    }
}

/// Scheduler that never sleeps; tests fire loops by name.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    pending: HashMap<LoopName, LoopSpec>,
    spawned: u64,
    cancelled: u64,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spec of the live instance for `name`
    pub fn pending(&self, name: LoopName) -> Option<LoopSpec> {
        self.pending.get(&name).copied()
    }

    pub fn is_pending(&self, name: LoopName) -> bool {
        self.pending.contains_key(&name)
    }

    /// Wake the named loop once. One-shot loops are consumed.
    pub fn fire(&mut self, name: LoopName) -> Option<LoopFired> {
        let spec = *self.pending.get(&name)?;
        if spec.cadence.is_once() {
            self.pending.remove(&name);
        }
        Some(spec.fired())
    }

    /// Total spawn requests seen
    pub fn spawned(&self) -> u64 {
        self.spawned
    }

    /// Total cancel requests seen
    pub fn cancelled(&self) -> u64 {
        self.cancelled
    }
}

impl Scheduler for ManualScheduler {
    fn spawn(&mut self, spec: LoopSpec) {
        self.spawned += 1;
        self.pending.insert(spec.name, spec);
    }

    fn cancel(&mut self, name: LoopName) {
        self.cancelled += 1;
        self.pending.remove(&name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(50);

    #[test]
    fn test_restart_replaces_generation() {
        let mut loops = Loops::new(ManualScheduler::new());
        loops.start(LoopName::RoundTicker, Cadence::Every(TICK));
        let stale = loops.scheduler_mut().fire(LoopName::RoundTicker).unwrap();

        loops.start(LoopName::RoundTicker, Cadence::Every(TICK));
        let fresh = loops.scheduler_mut().fire(LoopName::RoundTicker).unwrap();

        assert!(!loops.accept(&stale));
        assert!(loops.accept(&fresh));
        assert_eq!(loops.running(), vec![LoopName::RoundTicker]);
    }

    #[test]
    fn test_cancelled_loop_is_discarded() {
        let mut loops = Loops::new(ManualScheduler::new());
        loops.start(LoopName::SeekyTimer, Cadence::Every(TICK));
        let fired = loops.scheduler_mut().fire(LoopName::SeekyTimer).unwrap();
        loops.cancel(LoopName::SeekyTimer);

        assert!(!loops.accept(&fired));
        assert!(!loops.scheduler().is_pending(LoopName::SeekyTimer));
    }

    #[test]
    fn test_once_retires_after_first_accept() {
        let mut loops = Loops::new(ManualScheduler::new());
        loops.start(LoopName::MatchyHide, Cadence::Once(Duration::from_secs(1)));
        let fired = loops.scheduler_mut().fire(LoopName::MatchyHide).unwrap();

        assert!(loops.accept(&fired));
        assert!(!loops.is_running(LoopName::MatchyHide));
        assert!(!loops.accept(&fired));
        assert!(loops.scheduler_mut().fire(LoopName::MatchyHide).is_none());
    }

    #[test]
    fn test_cancel_mode_loops_keeps_lifecycle() {
        let mut loops = Loops::new(ManualScheduler::new());
        loops.start(LoopName::Celebration, Cadence::Once(Duration::from_secs(2)));
        loops.start(LoopName::BoppySpawner, Cadence::Once(TICK));
        loops.start(LoopName::BoppyCleanup, Cadence::Every(TICK));

        loops.cancel_mode_loops();
        assert_eq!(loops.running(), vec![LoopName::Celebration]);

        loops.cancel_all();
        assert!(loops.running().is_empty());
    }

    #[test]
    fn test_fired_carries_nominal_dt() {
        let spec = LoopSpec {
            name: LoopName::ZoomyUpdate,
            generation: 7,
            cadence: Cadence::Every(Duration::from_millis(16)),
        };
        let fired = spec.fired();
        assert_eq!(fired.generation, 7);
        assert!((fired.dt - 0.016).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_scheduler_stops_after_cancel() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = TokioScheduler::new(tx);
        scheduler.spawn(LoopSpec {
            name: LoopName::RoundTicker,
            generation: 1,
            cadence: Cadence::Every(TICK),
        });

        let first = rx.recv().await.unwrap();
        assert_eq!(first.name, LoopName::RoundTicker);

        scheduler.cancel(LoopName::RoundTicker);
        assert_eq!(scheduler.task_count(), 0);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(rx.try_recv().is_err());
    }
}
