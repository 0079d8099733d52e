//! Cubetrix headless host
//!
//! Runs a session at a fixed step with scripted input and logs the result.

use std::path::PathBuf;

use clap::Parser;
use glam::Vec2;

use cubetrix::audio::{AudioManager, NullBackend};
use cubetrix::consts::*;
use cubetrix::narration::{LogVoice, Narrator};
use cubetrix::renderer::HeadlessRenderer;
use cubetrix::sim::{GameEvent, GamePhase, Services, Session, TickInput, tick};
use cubetrix::{Settings, Tuning};

/// Host frame length fed into the accumulator (30 fps display)
const FRAME_DT: f32 = 1.0 / 30.0;

/// Headless Cubetrix run with scripted input
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Player settings file; defaults are used if it is missing
    #[arg(long, value_name = "PATH", default_value = Settings::FILE_NAME)]
    settings: PathBuf,
    /// Optional gameplay tuning overrides
    #[arg(long, value_name = "PATH")]
    tuning: Option<PathBuf>,
    /// World seed for terrain and spawns
    #[arg(long, value_name = "SEED", default_value_t = 0xC0BE)]
    seed: u64,
    /// Simulated run length
    #[arg(long, value_name = "SECONDS", default_value_t = 60.0, value_parser = parse_seconds)]
    seconds: f32,
}

fn parse_seconds(raw: &str) -> Result<f32, String> {
    let seconds: f32 = raw.parse().map_err(|e| format!("{e}"))?;
    if seconds.is_finite() && seconds > 0.0 {
        Ok(seconds)
    } else {
        Err(format!("expected a positive duration, got {raw}"))
    }
}

/// Wander in a slow circle, hop now and then, click four times a second
fn scripted_input(frame: u64) -> TickInput {
    TickInput {
        move_forward: 1.0,
        move_right: 0.0,
        run: frame % 600 < 120,
        jump: frame % 120 == 0,
        fire: frame % 15 == 0,
        pointer_delta: Vec2::new(0.02, 0.0),
        pointer_locked: true,
        ..Default::default()
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    log::info!("Cubetrix (headless) starting, seed {:#x}", args.seed);

    let settings = Settings::load_or_default(&args.settings);
    let tuning = match &args.tuning {
        Some(path) => Tuning::load_or_default(path),
        None => Tuning::default(),
    };

    let services = Services {
        audio: AudioManager::new(Box::new(NullBackend::new()), &settings),
        narrator: Box::new(Narrator::spawn(
            Some(Box::new(LogVoice)),
            tuning.narration_queue,
        )),
        renderer: Box::new(HeadlessRenderer::new()),
    };
    let mut session = Session::new(args.seed, tuning, settings, services);
    session.start_game();

    let mut accumulator = 0.0_f32;
    let mut elapsed = 0.0_f32;
    let mut frame: u64 = 0;
    let mut restarts = 0;

    while elapsed < args.seconds {
        elapsed += FRAME_DT;
        accumulator += FRAME_DT;

        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let mut input = scripted_input(frame);
            // Give the end screen a moment, then go again
            if session.phase() == GamePhase::GameOver && frame % 90 == 0 {
                input.restart = true;
                restarts += 1;
            }
            tick(&mut session, &input, SIM_DT);
            accumulator -= SIM_DT;
            substeps += 1;
            frame += 1;
        }

        for event in session.drain_events() {
            match event {
                GameEvent::PhaseChanged { from, to } => log::info!("{:?} -> {:?}", from, to),
                GameEvent::EnemyKilled { id, .. } => log::debug!("Killed {:?}", id),
                GameEvent::PlayerDied => {
                    let s = session.summary();
                    log::info!(
                        "Died: score {}, kills {}, survived {:.1}s",
                        s.score,
                        s.kills,
                        s.survived
                    );
                }
                _ => {}
            }
        }
    }

    let summary = session.summary();
    log::info!(
        "Finished after {:.0}s: phase {:?}, score {}, kills {}, health {:.0}, armor {:.0}, restarts {}",
        elapsed,
        session.phase(),
        summary.score,
        summary.kills,
        session.health(),
        session.armor(),
        restarts
    );

    session.quit();
}
