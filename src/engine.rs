//! Async engine runtime
//!
//! Runs a [`RoundController`] inside one tokio task. UI commands and loop
//! wake-ups arrive on two channels and are applied one at a time, so the
//! controller never sees concurrent mutation. [`EngineHandle`] methods only
//! enqueue and return immediately.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::board::CellId;
use crate::highscores::HighscoreStore;
use crate::intents::IntentSink;
use crate::scheduler::{LoopFired, TokioScheduler};
use crate::settings::Settings;
use crate::sim::{CopyDifficulty, GameMode, RoundController, Snapshot};

/// Command delivered to the engine task
#[derive(Debug)]
pub enum Command {
    Start(GameMode),
    Tap(CellId),
    Pop,
    CatchDot(u32),
    EndEarly,
    DismissGameOver,
    ResetToIdle,
    ThemeWave(CellId),
    SetRoundLength(u32),
    SetCopyDifficulty(CopyDifficulty),
    SetMatchyPlayers(u8),
    Snapshot(oneshot::Sender<Snapshot>),
    Shutdown,
}

/// Cheap, cloneable front door to a running engine
#[derive(Debug, Clone)]
pub struct EngineHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl EngineHandle {
    pub fn send(&self, command: Command) {
        // Engine gone means the game is shutting down
        let _ = self.tx.send(command);
    }

    pub fn start(&self, mode: GameMode) {
        self.send(Command::Start(mode));
    }

    pub fn tap(&self, cell: CellId) {
        self.send(Command::Tap(cell));
    }

    pub fn pop(&self) {
        self.send(Command::Pop);
    }

    pub fn catch_dot(&self, id: u32) {
        self.send(Command::CatchDot(id));
    }

    pub fn end_early(&self) {
        self.send(Command::EndEarly);
    }

    pub fn dismiss_game_over(&self) {
        self.send(Command::DismissGameOver);
    }

    pub fn reset_to_idle(&self) {
        self.send(Command::ResetToIdle);
    }

    pub fn theme_wave(&self, origin: CellId) {
        self.send(Command::ThemeWave(origin));
    }

    /// Current controller state, or None if the engine has stopped
    pub async fn snapshot(&self) -> Option<Snapshot> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(Command::Snapshot(reply)).ok()?;
        rx.await.ok()
    }

    pub fn shutdown(&self) {
        self.send(Command::Shutdown);
    }
}

/// Spawner for the engine task
pub struct Engine;

impl Engine {
    /// Start the engine on the current tokio runtime.
    ///
    /// The join handle yields the high-score store once the engine shuts
    /// down, so the caller can persist it.
    pub fn spawn<H>(
        settings: Settings,
        highscores: H,
        intents: Box<dyn IntentSink>,
        seed: u64,
    ) -> (EngineHandle, JoinHandle<H>)
    where
        H: HighscoreStore + Send + 'static,
    {
        let (tx, mut commands) = mpsc::unbounded_channel::<Command>();
        let (loop_tx, mut wakeups) = mpsc::unbounded_channel::<LoopFired>();

        let task = tokio::spawn(async move {
            let scheduler = TokioScheduler::new(loop_tx);
            let mut controller = RoundController::new(settings, highscores, intents, scheduler, seed);
            log::info!("Engine started");

            loop {
                tokio::select! {
                    command = commands.recv() => match command {
                        Some(Command::Shutdown) | None => break,
                        Some(command) => apply(&mut controller, command),
                    },
                    Some(fired) = wakeups.recv() => controller.on_loop(fired),
                }
            }

            controller.reset_to_idle();
            log::info!("Engine stopped");
            controller.into_highscores()
        });

        (EngineHandle { tx }, task)
    }
}

fn apply<H: HighscoreStore>(controller: &mut RoundController<TokioScheduler, H>, command: Command) {
    match command {
        Command::Start(mode) => controller.start(mode),
        Command::Tap(cell) => controller.tap(cell),
        Command::Pop => controller.pop(),
        Command::CatchDot(id) => controller.catch_dot(id),
        Command::EndEarly => controller.end_early(),
        Command::DismissGameOver => controller.dismiss_game_over(),
        Command::ResetToIdle => controller.reset_to_idle(),
        Command::ThemeWave(origin) => controller.theme_wave(origin),
        Command::SetRoundLength(secs) => {
            controller.set_round_length(secs);
        }
        Command::SetCopyDifficulty(difficulty) => {
            controller.set_copy_difficulty(difficulty);
        }
        Command::SetMatchyPlayers(players) => {
            controller.set_matchy_players(players);
        }
        Command::Snapshot(reply) => {
            let _ = reply.send(controller.snapshot());
        }
        Command::Shutdown => {}
    }
}
