//! Tenpad headless demo
//!
//! Autoplays one mode against the real-time engine and logs every intent.
//! Usage: `tenpad [mode] [seconds]` (defaults: classic, 20).

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;

use tenpad::sim::ModeState;
use tenpad::{Engine, EngineHandle, GameMode, HighScores, Intent, RoundPhase, Settings};

/// Bot reaction time between moves
const THINK: Duration = Duration::from_millis(250);

#[tokio::main]
async fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let mode = args
        .next()
        .and_then(|s| GameMode::from_str(&s))
        .unwrap_or(GameMode::Classic);
    let seconds: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(20);

    let data_dir = std::env::var_os("TENPAD_DATA")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let settings_path = data_dir.join("tenpad-settings.json");
    let scores_path = data_dir.join("tenpad-highscores.json");

    let settings = Settings::load_or_default(&settings_path);
    let highscores = HighScores::load_or_default(&scores_path);
    log::info!("Tenpad demo: {} for up to {}s", mode.name(), seconds);

    let (intent_tx, mut intent_rx) = mpsc::unbounded_channel::<Intent>();
    let (engine, task) = Engine::spawn(settings, highscores, Box::new(intent_tx), rand::random());

    let printer = tokio::spawn(async move {
        while let Some(intent) = intent_rx.recv().await {
            match &intent {
                Intent::RoundOver(outcome) => log::info!(
                    "Round over: {} {} (new high: {})",
                    outcome.mode.name(),
                    outcome.score_or_round,
                    outcome.is_new_high
                ),
                other => log::debug!("{:?}", other),
            }
        }
    });

    engine.start(mode);
    if tokio::time::timeout(Duration::from_secs(seconds), autoplay(&engine))
        .await
        .is_err()
    {
        log::info!("Time's up, ending early");
        engine.end_early();
    }

    engine.shutdown();
    match task.await {
        Ok(highscores) => {
            if let Err(e) = highscores.save(&scores_path) {
                log::error!("Failed to save high scores: {}", e);
            }
        }
        Err(e) => log::error!("Engine task failed: {}", e),
    }
    if let Err(e) = settings.save(&settings_path) {
        log::error!("Failed to save settings: {}", e);
    }
    let _ = printer.await;
}

/// Play until the round is over
async fn autoplay(engine: &EngineHandle) {
    let mut seen_running = false;
    loop {
        tokio::time::sleep(THINK).await;
        let Some(snap) = engine.snapshot().await else {
            return;
        };

        match snap.phase {
            RoundPhase::Idle if seen_running => return,
            RoundPhase::GameOver => {
                engine.dismiss_game_over();
                return;
            }
            RoundPhase::Active => seen_running = true,
            RoundPhase::Countdown(_) | RoundPhase::Cooldown => {
                seen_running = true;
                continue;
            }
            RoundPhase::Idle => continue,
        }

        let Some(state) = snap.mode_state else {
            continue;
        };
        let first_active = snap.board.active().iter().next();
        match state {
            ModeState::Classic(_) => match first_active {
                Some(cell) => engine.tap(cell),
                None => engine.pop(),
            },
            ModeState::Boppy(_) | ModeState::Tappy(_) => {
                if let Some(cell) = first_active {
                    engine.tap(cell);
                }
            }
            ModeState::Copy(s) => {
                if !s.showing_sequence {
                    // Enter the whole sequence from where the player is
                    for &cell in s.sequence.iter().skip(s.player_index) {
                        engine.tap(cell);
                    }
                }
            }
            ModeState::Matchy(s) => {
                if s.locked {
                    continue;
                }
                let hidden = |c: &u8| !s.matched.contains(*c) && !s.revealed.contains(*c);
                let pick = match s.first_pick {
                    Some(first) => (0..10u8)
                        .filter(hidden)
                        .find(|&c| s.color_of[c as usize] == s.color_of[first as usize]),
                    None => (0..10u8).find(hidden),
                };
                if let Some(cell) = pick {
                    engine.tap(cell);
                }
            }
            ModeState::Zoomy(s) => {
                if let Some(dot) = s.dots.first() {
                    engine.catch_dot(dot.id);
                }
            }
            ModeState::Seeky(s) => {
                if !s.revealing_answer {
                    engine.tap(s.odd_cell);
                }
            }
        }
    }
}
