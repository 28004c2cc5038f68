//! Round lifecycle controller
//!
//! Owns the phase, the board, the live mode state and every loop. All
//! mutations go through `&mut self`, so taps and loop events are naturally
//! serialized: once a transition leaves `Active`, later taps are no-ops.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::mode::{CopyDifficulty, GameMode};
use super::state::{ModeState, RoundCtx, RoundParams, RoundPhase, Step};
use crate::board::{self, Board, CELL_COUNT, CellId};
use crate::consts::{CELEBRATION, COOLDOWN_SETTLE, COUNTDOWN_TICK, WAVE_STEP_MS};
use crate::daily;
use crate::highscores::HighscoreStore;
use crate::intents::{Intent, IntentSink};
use crate::outcome::{OutcomeEvent, OutcomeKind, OutcomeReporter};
use crate::scheduler::{Cadence, LoopControl, LoopFired, LoopName, Loops, Scheduler};
use crate::settings::Settings;

/// Presentation view of the controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub phase: RoundPhase,
    pub mode: Option<GameMode>,
    pub board: Board,
    pub mode_state: Option<ModeState>,
    /// Live score, round or pairs
    pub value: u32,
    pub lives: Option<u32>,
    pub time_remaining: Option<f64>,
    /// Stored best captured at round start
    pub best: Option<u32>,
    pub celebrating: bool,
    pub last_outcome: Option<OutcomeEvent>,
}

/// Top-level game state machine
pub struct RoundController<S: Scheduler, H: HighscoreStore> {
    settings: Settings,
    phase: RoundPhase,
    mode: Option<GameMode>,
    board: Board,
    mode_state: Option<ModeState>,
    loops: Loops<S>,
    highscores: H,
    reporter: OutcomeReporter,
    /// Stored best captured at start, kept until the next reset
    round_best: Option<u32>,
    intents: Box<dyn IntentSink>,
    /// Seeds each round's RNG
    seed_rng: Pcg32,
    rng: Pcg32,
    /// New-high banner already shown this round
    crossed: bool,
    celebrating: bool,
    last_outcome: Option<OutcomeEvent>,
}

impl<S: Scheduler, H: HighscoreStore> RoundController<S, H> {
    pub fn new(
        settings: Settings,
        highscores: H,
        intents: Box<dyn IntentSink>,
        scheduler: S,
        seed: u64,
    ) -> Self {
        Self {
            settings: settings.sanitized(),
            phase: RoundPhase::Idle,
            mode: None,
            board: Board::new(),
            mode_state: None,
            loops: Loops::new(scheduler),
            highscores,
            reporter: OutcomeReporter::new(),
            round_best: None,
            intents,
            seed_rng: Pcg32::seed_from_u64(seed),
            rng: Pcg32::seed_from_u64(seed),
            crossed: false,
            celebrating: false,
            last_outcome: None,
        }
    }

    // === Accessors ===

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn mode(&self) -> Option<GameMode> {
        self.mode
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn mode_state(&self) -> Option<&ModeState> {
        self.mode_state.as_ref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn highscores(&self) -> &H {
        &self.highscores
    }

    pub fn highscores_mut(&mut self) -> &mut H {
        &mut self.highscores
    }

    pub fn into_highscores(self) -> H {
        self.highscores
    }

    pub fn scheduler(&self) -> &S {
        self.loops.scheduler()
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        self.loops.scheduler_mut()
    }

    /// Loops currently alive, sorted
    pub fn running_loops(&self) -> Vec<LoopName> {
        self.loops.running()
    }

    pub fn is_celebrating(&self) -> bool {
        self.celebrating
    }

    pub fn last_outcome(&self) -> Option<&OutcomeEvent> {
        self.last_outcome.as_ref()
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = self.mode_state.as_ref();
        Snapshot {
            phase: self.phase,
            mode: self.mode,
            board: self.board.clone(),
            mode_state: state.cloned(),
            value: state.map(|s| s.value()).unwrap_or(0),
            lives: state.and_then(|s| s.lives()),
            time_remaining: state.and_then(|s| s.time_remaining()),
            best: self.round_best,
            celebrating: self.celebrating,
            last_outcome: self.last_outcome,
        }
    }

    // === Settings (between rounds only) ===

    pub fn set_round_length(&mut self, secs: u32) -> bool {
        self.when_idle("set_round_length", |s| s.set_round_length(secs))
    }

    pub fn set_copy_difficulty(&mut self, difficulty: CopyDifficulty) -> bool {
        self.when_idle("set_copy_difficulty", |s| s.copy_difficulty = difficulty)
    }

    pub fn set_matchy_players(&mut self, players: u8) -> bool {
        self.when_idle("set_matchy_players", |s| s.set_matchy_players(players))
    }

    fn when_idle(&mut self, what: &str, f: impl FnOnce(&mut Settings)) -> bool {
        if self.phase.is_running() {
            log::debug!("Ignoring {} while {:?}", what, self.phase);
            return false;
        }
        f(&mut self.settings);
        true
    }

    // === Lifecycle ===

    /// Begin the countdown for a new round of `mode`
    pub fn start(&mut self, mode: GameMode) {
        if self.phase.is_running() {
            log::debug!("Ignoring start({}) while {:?}", mode.name(), self.phase);
            return;
        }
        if mode == GameMode::Daily && self.highscores.has_played_daily_today() {
            log::debug!("Daily already played today");
            return;
        }

        self.loops.cancel_all();
        self.board.reset();
        self.crossed = false;
        self.celebrating = false;
        self.last_outcome = None;

        let daily_duration = self.highscores.daily_duration_for_today();
        let params = RoundParams {
            duration_secs: if mode == GameMode::Daily {
                daily_duration
            } else {
                self.settings.round_length_secs
            },
            copy_difficulty: self.settings.copy_difficulty,
            matchy_players: self.settings.matchy_players,
        };
        let state = ModeState::new(mode, &params);

        let duration_key = match mode {
            GameMode::Classic | GameMode::Daily | GameMode::Boppy => params.duration_secs,
            GameMode::Copy => params.copy_difficulty.dot_count() as u32,
            _ => 0,
        };
        let best = self
            .reporter
            .arm(&self.highscores, mode, duration_key, state.is_ranked());
        self.round_best = Some(best);

        self.rng = if mode == GameMode::Daily {
            self.highscores.mark_daily_played();
            Pcg32::seed_from_u64(daily::seed_for_date(self.highscores.today()))
        } else {
            Pcg32::seed_from_u64(self.seed_rng.random())
        };

        self.mode = Some(mode);
        self.mode_state = Some(state);

        let ticks = self.settings.countdown_ticks.max(1);
        self.phase = RoundPhase::Countdown(ticks);
        self.intents.emit(Intent::CountdownTick { remaining: ticks });
        self.loops
            .start(LoopName::Countdown, Cadence::Every(COUNTDOWN_TICK));

        log::info!(
            "Starting {} (duration key {}, best {})",
            mode.name(),
            duration_key,
            best
        );
    }

    /// One countdown step; the last one makes the round live
    pub fn tick(&mut self) {
        let RoundPhase::Countdown(remaining) = self.phase else {
            return;
        };

        let remaining = remaining.saturating_sub(1);
        if remaining > 0 {
            self.phase = RoundPhase::Countdown(remaining);
            self.intents.emit(Intent::CountdownTick { remaining });
            return;
        }

        self.loops.cancel(LoopName::Countdown);
        self.phase = RoundPhase::Active;
        if let Some(mode) = self.mode {
            self.intents.emit(Intent::RoundStarted { mode });
        }
        self.drive(|state, ctx| {
            state.begin_round(ctx);
            Step::Continue
        });
    }

    pub fn tap(&mut self, cell: CellId) {
        if (cell as usize) >= CELL_COUNT {
            log::debug!("Ignoring tap on unknown cell {}", cell);
            return;
        }
        match self.phase {
            RoundPhase::Idle => self.intents.emit(Intent::Fidget {
                cell,
                ripple: board::neighbors(cell),
            }),
            RoundPhase::Active => {
                let step = self.drive(|state, ctx| state.handle_tap(cell, ctx));
                self.after_step(step);
            }
            phase => log::debug!("Ignoring tap({}) while {:?}", cell, phase),
        }
    }

    /// Reseed an exhausted Classic/Daily board
    pub fn pop(&mut self) {
        if self.phase != RoundPhase::Active || !self.mode.is_some_and(|m| m.shows_pop_action()) {
            log::debug!("Ignoring pop while {:?}", self.phase);
            return;
        }
        let step = self.drive(|state, ctx| state.pop(ctx));
        self.after_step(step);
    }

    /// Catch a Zoomy dot by id
    pub fn catch_dot(&mut self, id: u32) {
        if self.phase != RoundPhase::Active {
            log::debug!("Ignoring catch_dot({}) while {:?}", id, self.phase);
            return;
        }
        let step = self.drive(|state, ctx| state.catch_dot(id, ctx));
        self.after_step(step);
    }

    /// Abandon the live round without a result
    pub fn end_early(&mut self) {
        if self.phase != RoundPhase::Active {
            log::debug!("Ignoring end_early while {:?}", self.phase);
            return;
        }
        self.loops.cancel_all();
        self.board.reset();
        self.reporter.disarm();
        self.crossed = false;
        self.celebrating = false;
        self.enter_cooldown();
        log::info!("Round ended early");
    }

    pub fn dismiss_game_over(&mut self) {
        if self.phase == RoundPhase::GameOver {
            self.reset_to_idle();
        }
    }

    /// Drop everything and return to Idle from any phase
    pub fn reset_to_idle(&mut self) {
        self.loops.cancel_all();
        self.board.reset();
        self.reporter.disarm();
        self.mode_state = None;
        self.mode = None;
        self.round_best = None;
        self.last_outcome = None;
        self.crossed = false;
        self.celebrating = false;
        self.phase = RoundPhase::Idle;
    }

    /// Emit a closest-first wave from `origin` across the board
    pub fn theme_wave(&mut self, origin: CellId) {
        for (cell, distance) in board::wave_order(origin) {
            self.intents.emit(Intent::ThemeWaveTick {
                cell,
                delay_ms: distance * WAVE_STEP_MS,
            });
        }
    }

    /// Handle a loop wake-up from the scheduler
    pub fn on_loop(&mut self, fired: LoopFired) {
        if !self.loops.accept(&fired) {
            log::trace!("Discarding stale {:?}#{}", fired.name, fired.generation);
            return;
        }

        match fired.name {
            LoopName::Countdown => self.tick(),
            LoopName::Settle => {
                if self.phase == RoundPhase::Cooldown {
                    self.reset_to_idle();
                }
            }
            LoopName::Celebration => self.celebrating = false,
            name if self.phase == RoundPhase::Active => {
                let step = self.drive(|state, ctx| state.on_loop(name, fired.dt, ctx));
                self.after_step(step);
            }
            name => log::trace!("Dropping {:?} while {:?}", name, self.phase),
        }
    }

    // === Internals ===

    /// Run a mode handler with a context over the controller's resources
    fn drive(&mut self, f: impl FnOnce(&mut ModeState, &mut RoundCtx<'_>) -> Step) -> Step {
        let (Some(mode), Some(state)) = (self.mode, self.mode_state.as_mut()) else {
            return Step::Continue;
        };
        let mut ctx = RoundCtx {
            mode,
            board: &mut self.board,
            rng: &mut self.rng,
            loops: &mut self.loops,
            intents: self.intents.as_ref(),
        };
        f(state, &mut ctx)
    }

    fn after_step(&mut self, step: Step) {
        match step {
            Step::Continue => self.check_new_high(),
            Step::Finished => self.finish_round(),
            Step::Fault | Step::Exhausted => self.trigger_game_over(),
        }
    }

    fn check_new_high(&mut self) {
        if self.crossed {
            return;
        }
        let (Some(mode), Some(state), Some(best)) =
            (self.mode, self.mode_state.as_ref(), self.reporter.threshold())
        else {
            return;
        };
        if best == 0 || !state.is_ranked() || state.value() <= best {
            return;
        }

        self.crossed = true;
        self.celebrating = true;
        self.intents.emit(Intent::NewHighCrossed { mode, best });
        self.loops
            .start(LoopName::Celebration, Cadence::Once(CELEBRATION));
    }

    /// Normal end: clock ran out or the board was cleared
    fn finish_round(&mut self) {
        self.conclude(OutcomeKind::Finished);
        self.enter_cooldown();
    }

    /// Fatal end: illegal tap or last life gone
    fn trigger_game_over(&mut self) {
        if let Some(mode) = self.mode {
            self.intents.emit(Intent::Fault { mode });
        }
        self.conclude(OutcomeKind::GameOver);
        self.phase = RoundPhase::GameOver;
    }

    /// Report the round. A pending new-high banner keeps its dismissal loop.
    fn conclude(&mut self, kind: OutcomeKind) {
        self.loops.cancel_mode_loops();
        self.board.reset();
        let (value, perfect) = self
            .mode_state
            .as_ref()
            .map(|s| (s.value(), s.is_perfect()))
            .unwrap_or((0, false));
        if let Some(event) = self
            .reporter
            .report(&mut self.highscores, value, kind, perfect)
        {
            self.last_outcome = Some(event);
            self.intents.emit(Intent::RoundOver(event));
        }
    }

    fn enter_cooldown(&mut self) {
        self.phase = RoundPhase::Cooldown;
        self.loops
            .start(LoopName::Settle, Cadence::Once(COOLDOWN_SETTLE));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highscores::HighScores;
    use crate::intents::IntentLog;
    use crate::scheduler::ManualScheduler;

    type Controller = RoundController<ManualScheduler, HighScores>;

    fn controller() -> (Controller, IntentLog) {
        let log = IntentLog::new();
        let c = RoundController::new(
            Settings::default(),
            HighScores::new(),
            Box::new(log.clone()),
            ManualScheduler::new(),
            42,
        );
        (c, log)
    }

    fn fire(c: &mut Controller, name: LoopName) {
        let fired = c.scheduler_mut().fire(name).expect("loop pending");
        c.on_loop(fired);
    }

    fn count_down(c: &mut Controller) {
        while matches!(c.phase(), RoundPhase::Countdown(_)) {
            fire(c, LoopName::Countdown);
        }
    }

    #[test]
    fn test_countdown_goes_live() {
        let (mut c, log) = controller();
        c.start(GameMode::Classic);
        assert_eq!(c.phase(), RoundPhase::Countdown(3));
        fire(&mut c, LoopName::Countdown);
        assert_eq!(c.phase(), RoundPhase::Countdown(2));
        count_down(&mut c);
        assert_eq!(c.phase(), RoundPhase::Active);
        assert_eq!(c.board().active().len(), 3);
        assert!(!c.running_loops().contains(&LoopName::Countdown));
        let ticks: Vec<u8> = log
            .entries()
            .iter()
            .filter_map(|i| match i {
                Intent::CountdownTick { remaining } => Some(*remaining),
                _ => None,
            })
            .collect();
        assert_eq!(ticks, vec![3, 2, 1]);
    }

    #[test]
    fn test_idle_tap_is_fidget() {
        let (mut c, log) = controller();
        c.tap(0);
        assert_eq!(
            log.entries(),
            vec![Intent::Fidget {
                cell: 0,
                ripple: board::neighbors(0)
            }]
        );
        assert_eq!(c.phase(), RoundPhase::Idle);
    }

    #[test]
    fn test_settings_locked_while_running() {
        let (mut c, _) = controller();
        assert!(c.set_round_length(10));
        c.start(GameMode::Boppy);
        assert!(!c.set_round_length(60));
        assert!(!c.set_matchy_players(2));
        assert_eq!(c.settings().round_length_secs, 10);
    }

    #[test]
    fn test_theme_wave_is_closest_first() {
        let (mut c, log) = controller();
        c.theme_wave(4);
        let ticks: Vec<(CellId, u32)> = log
            .entries()
            .iter()
            .filter_map(|i| match i {
                Intent::ThemeWaveTick { cell, delay_ms } => Some((*cell, *delay_ms)),
                _ => None,
            })
            .collect();
        assert_eq!(ticks.len(), CELL_COUNT);
        assert_eq!(ticks[0], (4, 0));
        assert!(ticks.windows(2).all(|w| w[0].1 <= w[1].1));
        assert!(ticks.iter().all(|&(_, d)| d % WAVE_STEP_MS == 0));
    }

    #[test]
    fn test_reset_clears_everything() {
        let (mut c, _) = controller();
        c.start(GameMode::Seeky);
        count_down(&mut c);
        c.reset_to_idle();
        assert_eq!(c.phase(), RoundPhase::Idle);
        assert!(c.running_loops().is_empty());
        assert!(c.mode_state().is_none());
        assert_eq!(c.board(), &Board::new());
    }

    #[test]
    fn test_new_high_celebration() {
        let (mut c, log) = controller();
        c.highscores_mut().register(1, GameMode::Classic, 30);
        c.start(GameMode::Classic);
        count_down(&mut c);

        for _ in 0..2 {
            let cell = c.board().active().iter().next().unwrap();
            c.tap(cell);
        }
        assert!(c.is_celebrating());
        assert_eq!(
            log.count(|i| matches!(i, Intent::NewHighCrossed { best: 1, .. })),
            1
        );

        // Only once per round
        let cell = c.board().active().iter().next().unwrap();
        c.tap(cell);
        assert_eq!(log.count(|i| matches!(i, Intent::NewHighCrossed { .. })), 1);

        fire(&mut c, LoopName::Celebration);
        assert!(!c.is_celebrating());
    }

    #[test]
    fn test_first_score_does_not_celebrate() {
        let (mut c, _) = controller();
        c.start(GameMode::Classic);
        count_down(&mut c);
        let cell = c.board().active().iter().next().unwrap();
        c.tap(cell);
        assert!(!c.is_celebrating());
    }

    #[test]
    fn test_snapshot_reflects_round() {
        let (mut c, _) = controller();
        c.start(GameMode::Tappy);
        count_down(&mut c);
        let snap = c.snapshot();
        assert_eq!(snap.phase, RoundPhase::Active);
        assert_eq!(snap.mode, Some(GameMode::Tappy));
        assert_eq!(snap.lives, Some(3));
        assert_eq!(snap.value, 1);
        assert_eq!(snap.best, Some(0));
        assert!(serde_json::to_string(&snap).is_ok());
    }
}
