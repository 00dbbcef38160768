use chess_core::{PgnError, RulesError};
use tracing::{debug, warn};

use crate::action::Action;
use crate::game::GameStatus;
use crate::offer::OfferDenied;

/// Why a reducer left the state untouched. Never crosses the reducer
/// boundary; it only feeds the log line.
#[derive(Debug, thiserror::Error)]
pub enum Rejection {
    #[error("action does not apply to this activity")]
    NotApplicable,

    #[error("cannot {action} while the game is {status:?}")]
    GameStatus {
        action: &'static str,
        status: GameStatus,
    },

    #[error("{0} is not on the clock")]
    NotOnClock(chess_core::Side),

    #[error("no pending offer to {0}")]
    NoPendingOffer(&'static str),

    #[error("offer refused: {0}")]
    Offer(#[from] OfferDenied),

    #[error("no move to take back")]
    NothingToTakeBack,

    #[error("match is already {0}")]
    MatchOver(&'static str),

    #[error("previous game is still being played")]
    PlayInProgress,

    #[error("no game in progress")]
    NoOngoingPlay,

    #[error("chapter {0} not found")]
    ChapterNotFound(u32),

    #[error("no move at index {0}")]
    NoMoveAtIndex(chess_core::HistoryIndex),

    #[error("no variation can start before the first move")]
    NoBranchPoint,

    #[error(transparent)]
    Rules(#[from] RulesError),

    #[error(transparent)]
    Pgn(#[from] PgnError),
}

/// Rejections are expected traffic (every activity sees every action), so
/// only the interesting ones reach `warn`.
pub(crate) fn log_rejection(action: &Action, rejection: &Rejection) {
    match rejection {
        Rejection::NotApplicable => debug!(action = action.kind(), "ignored"),
        other => warn!(action = action.kind(), reason = %other, "action rejected"),
    }
}
