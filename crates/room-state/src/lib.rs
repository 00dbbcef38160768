//! Room state reducers.
//!
//! Every reducer is a pure `(state, action) -> state` function. Actions that
//! do not apply, or that the rules refuse, leave the state unchanged and are
//! logged. Time only enters through action timestamps and the read-time
//! transform, so a room can be rebuilt exactly from its action log.

pub mod action;
pub mod activity;
pub mod display;
pub mod error;
pub mod game;
pub mod learn;
pub mod matches;
pub mod offer;
pub mod play;

pub use action::{Action, MovePayload, SendOfferPayload};
pub use activity::{ActivityConfig, ActivityState, MasterContext, MatchConfig, PlayConfig, RoomReducer};
pub use display::{game_display_state, GameDisplayState};
pub use error::Rejection;
pub use game::{calculate_time_left_at, GameState, GameStatus, GameWinner, Millis, TimeClass, TimeLeft};
pub use learn::{Chapter, ChapterId, ChapterState, LearnState};
pub use matches::{MatchState, MatchStatus, MatchType, MATCH_TIME_TO_ABORT};
pub use offer::{check_offer, LocalOfferTracker, Offer, OfferDenied, OfferStatus, OfferType};
pub use play::{PlayState, PlayerId, Players};
