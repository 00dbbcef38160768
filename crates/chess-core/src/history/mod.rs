//! Branching move history (a PGN-style variation tree).
//!
//! A [`History`] is a list of turns, each holding a white move and optionally
//! a black one. Any move may carry alternative continuations in
//! `branched_histories`, each a full `History` of its own. Turns are shared
//! behind `Arc`s so that editing one line rebuilds only the turns on the path
//! to the edit.

mod index;
mod ops;

pub use index::{BranchIndex, HalfMove, HistoryIndex, IndexFormatError};
pub use ops::{
    add_move, calculate_linear_history_at_index, delete_move, find_move_at_index,
    find_next_valid_move_index, history_to_linear, is_last_index_in_branch, last_index,
    linear_to_history, remove_trailing_non_moves, slice_history, Direction,
};

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::side::{PieceKind, Side};

pub const NON_MOVE_SAN: &str = "...";

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChessMove {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promote_to: Option<PieceKind>,
    pub san: String,
    pub color: Side,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_non_move: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branched_histories: Vec<History>,
}

impl ChessMove {
    pub fn new(from: impl Into<String>, to: impl Into<String>, san: impl Into<String>, color: Side) -> Self {
        Self {
            from: Some(from.into()),
            to: Some(to.into()),
            promote_to: None,
            san: san.into(),
            color,
            is_non_move: false,
            branched_histories: Vec::new(),
        }
    }

    /// Placeholder for a half-move nobody played.
    pub fn non_move(color: Side) -> Self {
        Self {
            from: None,
            to: None,
            promote_to: None,
            san: NON_MOVE_SAN.to_string(),
            color,
            is_non_move: true,
            branched_histories: Vec::new(),
        }
    }

    pub fn with_promotion(mut self, promote_to: Option<PieceKind>) -> Self {
        self.promote_to = promote_to;
        self
    }

    /// Copy of the move without its variations, as used in linear histories.
    pub fn without_branches(&self) -> Self {
        Self {
            branched_histories: Vec::new(),
            ..self.clone()
        }
    }
}

/// One move number: `[white]` or `[white, black]` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<ChessMove>", try_from = "Vec<ChessMove>")]
pub enum Turn {
    Half(ChessMove),
    Full(ChessMove, ChessMove),
}

#[derive(Debug, thiserror::Error)]
#[error("a turn holds one or two moves, got {0}")]
pub struct TurnShapeError(usize);

impl Turn {
    pub fn get(&self, half: HalfMove) -> Option<&ChessMove> {
        match (self, half) {
            (Turn::Half(white), HalfMove::White) | (Turn::Full(white, _), HalfMove::White) => Some(white),
            (Turn::Full(_, black), HalfMove::Black) => Some(black),
            (Turn::Half(_), HalfMove::Black) => None,
        }
    }

    pub fn white(&self) -> &ChessMove {
        match self {
            Turn::Half(white) | Turn::Full(white, _) => white,
        }
    }

    pub fn black(&self) -> Option<&ChessMove> {
        self.get(HalfMove::Black)
    }

    pub fn is_half(&self) -> bool {
        matches!(self, Turn::Half(_))
    }

    pub fn last_half(&self) -> HalfMove {
        if self.is_half() {
            HalfMove::White
        } else {
            HalfMove::Black
        }
    }

    pub fn moves(&self) -> impl Iterator<Item = &ChessMove> {
        std::iter::once(self.white()).chain(self.black())
    }

    fn with_move(&self, half: HalfMove, mv: ChessMove) -> Turn {
        match (self, half) {
            (Turn::Half(_), HalfMove::White) => Turn::Half(mv),
            (Turn::Full(_, black), HalfMove::White) => Turn::Full(mv, black.clone()),
            (Turn::Half(white), HalfMove::Black) | (Turn::Full(white, _), HalfMove::Black) => {
                Turn::Full(white.clone(), mv)
            }
        }
    }
}

impl From<Turn> for Vec<ChessMove> {
    fn from(turn: Turn) -> Self {
        match turn {
            Turn::Half(white) => vec![white],
            Turn::Full(white, black) => vec![white, black],
        }
    }
}

impl TryFrom<Vec<ChessMove>> for Turn {
    type Error = TurnShapeError;

    fn try_from(moves: Vec<ChessMove>) -> Result<Self, Self::Error> {
        let len = moves.len();
        let mut moves = moves.into_iter();
        match (moves.next(), moves.next(), moves.next()) {
            (Some(white), None, None) => Ok(Turn::Half(white)),
            (Some(white), Some(black), None) => Ok(Turn::Full(white, black)),
            _ => Err(TurnShapeError(len)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    turns: Vec<Arc<Turn>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_turns(turns: impl IntoIterator<Item = Turn>) -> Self {
        Self {
            turns: turns.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter().map(|turn| turn.as_ref())
    }

    pub fn turn(&self, turn: i32) -> Option<&Turn> {
        let turn = usize::try_from(turn).ok()?;
        self.turns.get(turn).map(|turn| turn.as_ref())
    }

    pub fn last_turn(&self) -> Option<&Turn> {
        self.turns.last().map(|turn| turn.as_ref())
    }

    /// Top-level lookup; does not descend into branches.
    pub fn move_at(&self, turn: i32, half: HalfMove) -> Option<&ChessMove> {
        self.turn(turn)?.get(half)
    }

    /// True when both histories hold the very same allocation for `turn`.
    pub fn shares_turn(&self, other: &History, turn: usize) -> bool {
        match (self.turns.get(turn), other.turns.get(turn)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// New history with the move at `turn`/`half` replaced; other turns are shared.
    fn with_move(&self, turn: i32, half: HalfMove, mv: ChessMove) -> History {
        let mut turns = self.turns.clone();
        if let Some(slot) = usize::try_from(turn).ok().and_then(|turn| turns.get_mut(turn)) {
            *slot = Arc::new(slot.with_move(half, mv));
        }
        History { turns }
    }
}
