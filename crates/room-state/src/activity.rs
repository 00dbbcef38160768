//! Room-level dispatch: one activity at a time, each with its own reducer.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use chess_core::{ChessRules, ShakmatyRules, Side};

use crate::action::Action;
use crate::game::{GameState, Millis, TimeClass};
use crate::learn::{reduce_learn, LearnState};
use crate::matches::{reduce_match, transform_match, MatchState, MatchType};
use crate::play::{reduce_play, transform_play, PlayState, Players};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "activityType", content = "activityState", rename_all = "lowercase")]
pub enum ActivityState {
    #[default]
    None,
    Learn(LearnState),
    Play(PlayState),
    Match(MatchState),
}

impl ActivityState {
    pub fn kind(&self) -> &'static str {
        match self {
            ActivityState::None => "none",
            ActivityState::Learn(_) => "learn",
            ActivityState::Play(_) => "play",
            ActivityState::Match(_) => "match",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayConfig {
    #[serde(default)]
    pub time_class: TimeClass,
    pub players: Players,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchConfig {
    pub match_type: MatchType,
    pub rounds: u32,
    #[serde(default)]
    pub time_class: TimeClass,
    pub players: Players,
}

/// Payload of `activity:start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "activityType", rename_all = "lowercase")]
pub enum ActivityConfig {
    None,
    Learn,
    Play(PlayConfig),
    Match(MatchConfig),
}

impl ActivityConfig {
    pub fn create(&self) -> ActivityState {
        match self {
            ActivityConfig::None => ActivityState::None,
            ActivityConfig::Learn => ActivityState::Learn(LearnState::default()),
            ActivityConfig::Play(config) => ActivityState::Play(PlayState::new(
                config.players.clone(),
                GameState::pending(config.time_class, Side::White),
            )),
            ActivityConfig::Match(config) => ActivityState::Match(MatchState::new(
                config.match_type,
                config.rounds,
                config.time_class,
                config.players.clone(),
            )),
        }
    }
}

/// What the reader brings to a state read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterContext {
    pub request_at: Millis,
}

pub struct RoomReducer<R: ChessRules> {
    rules: R,
}

impl Default for RoomReducer<ShakmatyRules> {
    fn default() -> Self {
        RoomReducer::new(ShakmatyRules)
    }
}

impl<R: ChessRules> RoomReducer<R> {
    pub fn new(rules: R) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    pub fn reduce(&self, prev: &ActivityState, action: &Action) -> ActivityState {
        if let Action::StartActivity(config) = action {
            let next = config.create();
            info!(from = prev.kind(), to = next.kind(), "activity started");
            return next;
        }

        match prev {
            ActivityState::None => {
                debug!(action = action.kind(), "no activity running");
                ActivityState::None
            }
            ActivityState::Learn(state) => ActivityState::Learn(reduce_learn(&self.rules, state, action)),
            ActivityState::Play(state) => ActivityState::Play(reduce_play(&self.rules, state, action)),
            ActivityState::Match(state) => ActivityState::Match(reduce_match(&self.rules, state, action)),
        }
    }

    /// Applies every action in order, starting from `initial`.
    pub fn replay<'a>(&self, initial: ActivityState, actions: impl IntoIterator<Item = &'a Action>) -> ActivityState {
        actions
            .into_iter()
            .fold(initial, |state, action| self.reduce(&state, action))
    }

    /// Time-derived view of `state` for a reader at `context.request_at`.
    /// Never stored; re-deriving from the same inputs gives the same result.
    pub fn transform_state(&self, state: &ActivityState, context: &MasterContext) -> ActivityState {
        match state {
            ActivityState::Play(play) => ActivityState::Play(transform_play(play, context.request_at)),
            ActivityState::Match(state) => ActivityState::Match(transform_match(state, context.request_at)),
            ActivityState::None | ActivityState::Learn(_) => state.clone(),
        }
    }
}
