//! Polysnake headless entry point
//!
//! Runs the game loop without a window, steering the snake along a fixed
//! square pattern until it dies or the time limit is reached.
//!
//! Usage: `polysnake [settings.json]`

use std::time::{Duration, Instant};

use polysnake::sim::Heading;
use polysnake::{Game, Settings};

/// Seconds the demo runs before stopping the loop itself
const DEMO_DURATION: Duration = Duration::from_secs(30);

/// Time spent on each side of the square
const LEG_DURATION: Duration = Duration::from_millis(800);

fn main() {
    env_logger::init();
    log::info!("Polysnake (headless) starting...");

    let settings = match std::env::args().nth(1) {
        Some(path) => match Settings::load(&path) {
            Ok(settings) => settings,
            Err(err) => {
                log::error!("Could not load settings from {path}: {err}");
                std::process::exit(1);
            }
        },
        None => Settings::default(),
    };

    let game = match Game::new(&settings) {
        Ok(game) => game,
        Err(err) => {
            log::error!("Invalid settings: {err}");
            std::process::exit(1);
        }
    };

    let pattern = [Heading::Right, Heading::Down, Heading::Left, Heading::Up];
    let started = Instant::now();
    let mut leg = 0;

    // Steering starts the loop
    game.steer(pattern[leg]);
    let report = loop {
        if let Some(report) = game.wait_game_over(LEG_DURATION) {
            break report;
        }
        if started.elapsed() >= DEMO_DURATION {
            game.stop();
            match game.wait_game_over(Duration::from_secs(1)) {
                Some(report) => break report,
                None => {
                    log::error!("Game loop did not stop");
                    std::process::exit(1);
                }
            }
        }
        leg = (leg + 1) % pattern.len();
        game.steer(pattern[leg]);
        log::debug!("Steering {:?}", pattern[leg]);
    };

    log::info!(
        "{} Score: {} ({} frames)",
        report.message(),
        report.score,
        report.frames
    );
    game.acknowledge_game_over();
}
