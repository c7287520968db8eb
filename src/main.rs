//! Lighthouse Rider entry point
//!
//! Headless runner: builds a session from the bundled (or given) NPC feed and
//! drives it with a simple autopilot, logging messages as they happen.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use glam::Vec2;

use lighthouse_rider::consts::FRAME_MS;
use lighthouse_rider::npc_data::{BUNDLED_NPCS, load_npcs_from_json, parse_npcs};
use lighthouse_rider::persistence::{FileStore, KeyValueStore, MemoryStore};
use lighthouse_rider::platform::LogSink;
use lighthouse_rider::sim::{DialogState, MoveIntent, Session, TickInput};
use lighthouse_rider::{Game, GameError, Settings};

const VIEWPORT: Vec2 = Vec2::new(1280.0, 720.0);

#[derive(Debug, Parser)]
#[command(name = "lighthouse-rider")]
#[command(about = "Headless Lighthouse Rider runner")]
#[command(version)]
struct Args {
    /// NPC feed JSON (defaults to the bundled feed)
    #[arg(long)]
    feed: Option<PathBuf>,

    /// World seed
    #[arg(long)]
    seed: Option<u64>,

    /// Frames to simulate
    #[arg(long, default_value_t = 3600)]
    frames: usize,

    /// Directory for saved upgrades and settings (in-memory if omitted)
    #[arg(long)]
    save: Option<PathBuf>,
}

/// Head for the nearest uncollected item, accept every quest
fn autopilot(session: &Session) -> TickInput {
    let mut input = TickInput::default();
    match session.dialog.state() {
        DialogState::Presenting { .. } => input.advance_dialog = true,
        DialogState::Choosing { .. } => input.choice = Some(0),
        DialogState::Idle => {}
    }

    let here = session.player.rect().center();
    let target = session
        .world
        .items
        .iter()
        .filter(|i| !i.collected)
        .map(|i| i.rect.center())
        .min_by(|a, b| a.distance_squared(here).total_cmp(&b.distance_squared(here)));

    if let Some(target) = target {
        input.intent = MoveIntent::from_drag(target - here);
    }
    input.ring_bell = session.time_ticks % 600 == 0;
    input
}

fn run<S: KeyValueStore>(store: S, args: &Args) -> Result<(), GameError> {
    let records = match &args.feed {
        Some(path) => load_npcs_from_json(path)?,
        None => parse_npcs(BUNDLED_NPCS)?,
    };

    let mut game = Game::new(store, records, VIEWPORT);
    let mut sink = LogSink;
    game.new_game()?;

    for frame in 0..args.frames {
        let Some(session) = game.session() else {
            break;
        };
        let input = autopilot(session);
        if !game.frame(FRAME_MS, &input, &mut sink) {
            log::info!("Stopped after {frame} frames");
            break;
        }
    }

    if let Some(session) = game.session() {
        log::info!("Final score {}", session.score);
        for entry in session.quest_log() {
            log::info!(
                "  {}{}{}",
                entry.description,
                entry.progress,
                if entry.completed { " ✔" } else { "" }
            );
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();
    log::info!("Lighthouse Rider (headless) starting...");

    let args = Args::parse();
    let result = match &args.save {
        Some(dir) => FileStore::open(dir).and_then(|mut store| {
            seed_settings(&mut store, args.seed)?;
            run(store, &args)
        }),
        None => {
            let mut store = MemoryStore::default();
            seed_settings(&mut store, args.seed).and_then(|_| run(store, &args))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Pin the seed from the command line into stored settings
fn seed_settings(store: &mut impl KeyValueStore, seed: Option<u64>) -> Result<(), GameError> {
    let Some(seed) = seed else {
        return Ok(());
    };
    let mut settings = Settings::load(&*store);
    settings.seed = Some(seed);
    settings.save(store)
}
