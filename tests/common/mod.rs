#![allow(dead_code)]

use chess_core::history::{ChessMove, HalfMove, History, HistoryIndex};
use chess_core::{ShakmatyRules, Side};
use room_state::{Action, ActivityState, Millis, MovePayload, RoomReducer};

pub const T0: Millis = 1_700_000_000_000;

pub fn white(from: &str, to: &str, san: &str) -> ChessMove {
    ChessMove::new(from, to, san, Side::White)
}

pub fn black(from: &str, to: &str, san: &str) -> ChessMove {
    ChessMove::new(from, to, san, Side::Black)
}

pub fn idx(turn: i32, half: u8) -> HistoryIndex {
    HistoryIndex::new(turn, if half == 0 { HalfMove::White } else { HalfMove::Black })
}

/// Builds a main line by appending moves in order.
pub fn line(moves: &[ChessMove]) -> History {
    moves.iter().fold(History::new(), |history, mv| {
        chess_core::history::add_move(&history, mv.clone(), None).0
    })
}

pub fn mv(from: &str, to: &str, move_at: Millis) -> Action {
    Action::Move(MovePayload {
        from: from.to_string(),
        to: to.to_string(),
        promote_to: None,
        move_at,
    })
}

pub fn action(json: &str) -> Action {
    serde_json::from_str(json).unwrap()
}

pub fn reducer() -> RoomReducer<ShakmatyRules> {
    RoomReducer::new(ShakmatyRules)
}

pub fn replay(actions: &[Action]) -> ActivityState {
    reducer().replay(ActivityState::None, actions)
}
