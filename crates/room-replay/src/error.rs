//! Replay error types

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("Configuration error: {0}")]
    Config(&'static str),

    #[error("Invalid REPLAY_NOW value: {0}")]
    InvalidNow(String),

    #[error("Unknown activity: {0}")]
    UnknownActivity(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
