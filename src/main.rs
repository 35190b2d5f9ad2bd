/// Entry point and frame loop.
///
/// Usage: fire-and-water [MAP]   (default: mapa.txt)

mod config;
mod domain;
mod engine;
mod logging;
mod sim;
mod ui;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{error, info};

use config::GameConfig;
use engine::Engine;
use sim::level::load_map;
use ui::gamepad::Gamepads;
use ui::input::{drain_keys, InputEvent};
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const DEFAULT_MAP: &str = "mapa.txt";

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let config = GameConfig::load();
    if let Err(e) = logging::setup_logging(&config.log_dir) {
        eprintln!("Logging disabled: {e:#}");
    }

    let map_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_MAP));
    let init = load_map(&map_path)?;
    let engine = Engine::start(init, &config).context("cannot start game threads")?;

    let mut renderer = Renderer::new();
    renderer.init().context("terminal init failed")?;

    let sound = SoundEngine::new();
    let mut pads = Gamepads::new(&config.gamepad);

    let result = game_loop(&engine, &mut renderer, sound.as_ref(), &mut pads, config.speed.frame());

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    result.context("render failed")?;

    info!("player quit");
    println!("Thanks for playing Fire and Water!");
    Ok(())
}

/// Input, sound and drawing at a fixed frame rate. Returns on quit.
fn game_loop(
    engine: &Engine,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    pads: &mut Gamepads,
    frame: Duration,
) -> io::Result<()> {
    let mut inputs = Vec::with_capacity(16);
    loop {
        let frame_start = Instant::now();

        drain_keys(&mut inputs);
        pads.drain(&mut inputs);
        for ev in inputs.drain(..) {
            match ev {
                InputEvent::Quit => return Ok(()),
                InputEvent::Interact => engine.interact(),
                InputEvent::Move(player, dir) => engine.send_move(player, dir),
            }
        }

        for ev in engine.events().try_iter() {
            if let Some(s) = sound {
                s.play_event(&ev);
            }
        }

        renderer.render(engine.view())?;

        let elapsed = frame_start.elapsed();
        if elapsed < frame {
            thread::sleep(frame - elapsed);
        }
    }
}
