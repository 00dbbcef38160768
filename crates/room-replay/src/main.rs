//! Room replay
//!
//! Reads a JSON-lines action log, folds it through the room reducers and
//! prints the stored state plus its read-time view as JSON.

use room_replay::config::ReplayConfig;
use room_replay::log::read_log_file;
use room_replay::replay::replay;

use chess_core::ShakmatyRules;
use room_state::RoomReducer;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Logs go to stderr; stdout carries the JSON report
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let config = ReplayConfig::from_env()?;
    info!(path = %config.log_path.display(), "Replaying action log");

    let actions = read_log_file(&config.log_path)?;
    let report = replay(&RoomReducer::new(ShakmatyRules), &config, &actions);

    let json = if config.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");

    Ok(())
}
