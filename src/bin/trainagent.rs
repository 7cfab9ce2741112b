use std::error::Error;
use std::fs;
use std::path::Path;

use tracing::{error, info};

use snakeq::agent::{Agent, AgentConfig, EpisodeStats, TrainingConfig};
use snakeq::approximator::{DEFAULT_HIDDEN, DEFAULT_LEARNING_RATE};
use snakeq::game::{Board, FEATURES};
use snakeq::sequential::Sequential;

const BOARD_ROWS: i32 = 20;
const BOARD_COLS: i32 = 20;
const STATS_PATH: &str = "output/training_stats.csv";

fn write_stats(path: &Path, episodes: &[EpisodeStats]) -> Result<(), Box<dyn Error>> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    for stats in episodes {
        writer.serialize(stats)?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    info!(rows = BOARD_ROWS, cols = BOARD_COLS, "initializing board and agent");

    let mut board = Board::new_game(BOARD_ROWS, BOARD_COLS);
    let q = Sequential::value_network(FEATURES, &DEFAULT_HIDDEN, DEFAULT_LEARNING_RATE, &mut rand::rng());
    let mut agent = Agent::new(q, AgentConfig::default());

    let config = TrainingConfig::default();
    info!(episodes = config.episodes, games = config.games_per_episode, "starting training");

    let report = match agent.train(&mut board, &config) {
        Ok(report) => report,
        Err(aborted) => {
            error!(episode = aborted.episode, max_score = aborted.report.max_score, "{}", aborted);
            write_stats(Path::new(STATS_PATH), &aborted.report.episodes)?;
            return Err(aborted.into());
        }
    };

    info!(max_score = report.max_score, memories = agent.memory().len(), "training finished");

    write_stats(Path::new(STATS_PATH), &report.episodes)?;
    info!(path = STATS_PATH, "saved training stats");

    Ok(())
}
