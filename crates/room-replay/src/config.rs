//! Replay configuration from environment variables

use std::env;
use std::path::PathBuf;

use chrono::DateTime;
use room_state::{
    ActivityConfig, MatchConfig, MatchType, Millis, PlayConfig, Players, TimeClass,
};

use crate::error::ReplayError;

#[derive(Clone, Debug)]
pub struct ReplayConfig {
    /// JSON-lines action log to replay
    pub log_path: PathBuf,

    /// Read time for the transformed view; defaults to the last action timestamp
    pub now: Option<Millis>,

    /// Activity the room starts in, before the first action
    pub initial_activity: ActivityConfig,

    /// Pretty-print the JSON output
    pub pretty: bool,
}

impl ReplayConfig {
    /// Load configuration from the environment. The log path may also be
    /// passed as the first CLI argument, which wins over `REPLAY_LOG`.
    pub fn from_env() -> Result<Self, ReplayError> {
        Self::from_vars(|key| env::var(key).ok(), env::args().nth(1))
    }

    pub fn from_vars<F>(var: F, first_arg: Option<String>) -> Result<Self, ReplayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let log_path = first_arg
            .or_else(|| var("REPLAY_LOG"))
            .map(PathBuf::from)
            .ok_or(ReplayError::Config("REPLAY_LOG not set and no log path given"))?;

        let now = var("REPLAY_NOW").map(|raw| parse_now(&raw)).transpose()?;

        let initial_activity = match var("REPLAY_ACTIVITY") {
            Some(kind) => parse_activity(&kind)?,
            None => ActivityConfig::None,
        };

        let pretty = var("REPLAY_PRETTY")
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            log_path,
            now,
            initial_activity,
            pretty,
        })
    }
}

/// Epoch milliseconds or an RFC 3339 timestamp.
pub fn parse_now(raw: &str) -> Result<Millis, ReplayError> {
    let raw = raw.trim();
    if let Ok(millis) = raw.parse::<Millis>() {
        return Ok(millis);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.timestamp_millis())
        .map_err(|_| ReplayError::InvalidNow(raw.to_string()))
}

/// Starting activity by name. Play and match rooms get placeholder seats;
/// logs that care about players start with their own `activity:start`.
pub fn parse_activity(kind: &str) -> Result<ActivityConfig, ReplayError> {
    let players = || Players::new("white", "black");
    match kind.trim().to_ascii_lowercase().as_str() {
        "none" | "" => Ok(ActivityConfig::None),
        "learn" => Ok(ActivityConfig::Learn),
        "play" => Ok(ActivityConfig::Play(PlayConfig {
            time_class: TimeClass::Blitz,
            players: players(),
        })),
        "match" => Ok(ActivityConfig::Match(MatchConfig {
            match_type: MatchType::BestOf,
            rounds: 3,
            time_class: TimeClass::Blitz,
            players: players(),
        })),
        _ => Err(ReplayError::UnknownActivity(kind.to_string())),
    }
}
