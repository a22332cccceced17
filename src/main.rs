use std::{env, fs::File, str::FromStr};

use anyhow::{Context, Result};
use log::info;
use simplelog::{Config, LevelFilter, WriteLogger};

use tsnake::game::{self, SnakeGame, HEIGHT, WIDTH};
use tsnake::snake::GameState;
use tsnake::term::TermManager;

fn main() -> Result<()> {
    init_logging()?;

    let term = TermManager::setup().context("Could not set up the terminal")?;
    let events = game::spawn_input_thread()?;

    // The terminal is restored when `game` drops, before any error is reported
    let mut game = SnakeGame::new(GameState::new(WIDTH, HEIGHT), term);
    game.run(events)
}

/// Logs go to the file named by SNAKE_LOG, never to the screen we draw on.
fn init_logging() -> Result<()> {
    let path = match env::var("SNAKE_LOG") {
        Ok(path) => path,
        Err(_) => return Ok(()),
    };

    let level = env::var("SNAKE_LOG_LEVEL")
        .ok()
        .and_then(|l| LevelFilter::from_str(&l).ok())
        .unwrap_or(LevelFilter::Info);

    let file = File::create(&path).with_context(|| format!("Could not create log file {}", path))?;
    WriteLogger::init(level, Config::default(), file).context("Could not initialize logger")?;

    info!("Logging at {} to {}", level, path);
    Ok(())
}
