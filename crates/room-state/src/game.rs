//! Single game lifecycle and clocks.

use serde::{Deserialize, Serialize};
use tracing::debug;

use chess_core::{pgn, ChessRules, MoveRequest, PositionOutcome, Side};

use crate::error::Rejection;

pub type Millis = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Pending,
    Idling,
    Ongoing,
    Complete,
    Aborted,
}

impl GameStatus {
    pub fn is_over(self) -> bool {
        matches!(self, GameStatus::Complete | GameStatus::Aborted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeClass {
    #[default]
    Untimed,
    Bullet,
    Blitz,
    Rapid,
}

impl TimeClass {
    /// Starting clock per side; `None` for untimed games.
    pub fn starting_time(self) -> Option<Millis> {
        match self {
            TimeClass::Untimed => None,
            TimeClass::Bullet => Some(60_000),
            TimeClass::Blitz => Some(5 * 60_000),
            TimeClass::Rapid => Some(15 * 60_000),
        }
    }

    pub fn is_timed(self) -> bool {
        self.starting_time().is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeLeft {
    pub white: Millis,
    pub black: Millis,
}

impl TimeLeft {
    pub fn for_class(time_class: TimeClass) -> Self {
        let start = time_class.starting_time().unwrap_or(0);
        Self {
            white: start,
            black: start,
        }
    }

    pub fn get(&self, side: Side) -> Millis {
        match side {
            Side::White => self.white,
            Side::Black => self.black,
        }
    }

    pub fn set(&mut self, side: Side, value: Millis) {
        match side {
            Side::White => self.white = value,
            Side::Black => self.black = value,
        }
    }
}

/// `"white"`, `"black"` or `"1/2"` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameWinner {
    #[serde(rename = "white")]
    White,
    #[serde(rename = "black")]
    Black,
    #[serde(rename = "1/2")]
    Draw,
}

impl From<Side> for GameWinner {
    fn from(side: Side) -> Self {
        match side {
            Side::White => GameWinner::White,
            Side::Black => GameWinner::Black,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameOverReason {
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    Timeout,
    Resignation,
    AcceptedDraw,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub status: GameStatus,
    pub pgn: String,
    pub orientation: Side,
    pub last_move_by: Side,
    #[serde(default)]
    pub last_move_at: Option<Millis>,
    #[serde(default)]
    pub started_at: Option<Millis>,
    pub time_class: TimeClass,
    pub time_left: TimeLeft,
    #[serde(default)]
    pub winner: Option<GameWinner>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_over_reason: Option<GameOverReason>,
}

impl GameState {
    /// A game nobody has touched yet. White moves first, so the last mover
    /// is black.
    pub fn pending(time_class: TimeClass, orientation: Side) -> Self {
        Self {
            status: GameStatus::Pending,
            pgn: String::new(),
            orientation,
            last_move_by: Side::Black,
            last_move_at: None,
            started_at: None,
            time_class,
            time_left: TimeLeft::for_class(time_class),
            winner: None,
            game_over_reason: None,
        }
    }

    /// Side whose clock is running.
    pub fn turn(&self) -> Side {
        self.last_move_by.swap()
    }

    fn complete(mut self, winner: GameWinner, reason: GameOverReason) -> Self {
        self.status = GameStatus::Complete;
        self.winner = Some(winner);
        self.game_over_reason = Some(reason);
        self
    }

    fn require(&self, action: &'static str, allowed: &[GameStatus]) -> Result<(), Rejection> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(Rejection::GameStatus {
                action,
                status: self.status,
            })
        }
    }

    /// Starts the idle timer for white's first move.
    pub fn start(&self, at: Millis) -> Result<GameState, Rejection> {
        self.require("start", &[GameStatus::Pending])?;
        Ok(GameState {
            status: GameStatus::Idling,
            started_at: Some(at),
            ..self.clone()
        })
    }

    pub fn apply_move<R: ChessRules>(
        &self,
        rules: &R,
        request: &MoveRequest,
        move_at: Millis,
    ) -> Result<GameState, Rejection> {
        self.require(
            "move",
            &[GameStatus::Pending, GameStatus::Idling, GameStatus::Ongoing],
        )?;

        let fen = rules.pgn_fen(&self.pgn)?;
        let played = rules.play(&fen, request)?;
        let mover = played.mv.color;
        let mut next = self.clone();

        if self.status == GameStatus::Ongoing && self.time_class.is_timed() {
            let since = self.last_move_at.or(self.started_at).unwrap_or(move_at);
            let remaining = self.time_left.get(mover) - (move_at - since);
            if remaining <= 0 {
                debug!(%mover, remaining, "move arrived after the flag fell");
                next.time_left.set(mover, 0);
                return Ok(next.complete(mover.swap().into(), GameOverReason::Timeout));
            }
            next.time_left.set(mover, remaining);
        }

        next.status = GameStatus::Ongoing;
        next.started_at = next.started_at.or(Some(move_at));
        next.pgn = pgn::push_san(&self.pgn, &played.mv.san)?;
        next.last_move_by = mover;
        next.last_move_at = Some(move_at);

        Ok(match played.outcome {
            Some(PositionOutcome::Checkmate { winner }) => {
                next.complete(winner.into(), GameOverReason::Checkmate)
            }
            Some(PositionOutcome::Stalemate) => next.complete(GameWinner::Draw, GameOverReason::Stalemate),
            Some(PositionOutcome::InsufficientMaterial) => {
                next.complete(GameWinner::Draw, GameOverReason::InsufficientMaterial)
            }
            None => next,
        })
    }

    /// Flag fall reported for `color`. Only the side on the clock can run out.
    pub fn timeout(&self, color: Side) -> Result<GameState, Rejection> {
        self.require("time out", &[GameStatus::Ongoing])?;
        if color != self.turn() {
            return Err(Rejection::NotOnClock(color));
        }
        let mut next = self.clone();
        next.time_left.set(color, 0);
        Ok(next.complete(color.swap().into(), GameOverReason::Timeout))
    }

    pub fn resign(&self, color: Side) -> Result<GameState, Rejection> {
        self.require("resign", &[GameStatus::Ongoing])?;
        Ok(self.clone().complete(color.swap().into(), GameOverReason::Resignation))
    }

    pub fn accept_draw(&self) -> Result<GameState, Rejection> {
        self.require("accept a draw", &[GameStatus::Ongoing])?;
        Ok(self.clone().complete(GameWinner::Draw, GameOverReason::AcceptedDraw))
    }

    /// Removes the last move and hands the turn back to whoever made it.
    pub fn take_back(&self) -> Result<GameState, Rejection> {
        self.require("take back", &[GameStatus::Ongoing])?;
        if pgn::extract_moves(&self.pgn)?.is_empty() {
            return Err(Rejection::NothingToTakeBack);
        }
        Ok(GameState {
            pgn: pgn::pop_san(&self.pgn)?,
            last_move_by: self.last_move_by.swap(),
            ..self.clone()
        })
    }

    pub fn abort(&self) -> Result<GameState, Rejection> {
        self.require("abort", &[GameStatus::Pending, GameStatus::Idling])?;
        Ok(GameState {
            status: GameStatus::Aborted,
            ..self.clone()
        })
    }
}

/// Remaining time on both clocks as of `now`.
///
/// Stored `timeLeft` is exact only at the last move; the running side has
/// lost whatever elapsed since. Games that are not ongoing, or untimed, keep
/// their stored clocks.
pub fn calculate_time_left_at(now: Millis, game: &GameState) -> TimeLeft {
    if game.status != GameStatus::Ongoing || !game.time_class.is_timed() {
        return game.time_left;
    }
    let Some(since) = game.last_move_at.or(game.started_at) else {
        return game.time_left;
    };

    let turn = game.turn();
    let mut time_left = game.time_left;
    time_left.set(turn, game.time_left.get(turn) - (now - since));
    time_left
}
