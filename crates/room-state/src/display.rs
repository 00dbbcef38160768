//! What a board showing a game should render, optionally rewound to a
//! focused move.

use serde::Serialize;

use chess_core::history::{self, ChessMove, History, HistoryIndex};
use chess_core::{pgn, ChessRules, RulesError, Side, STARTING_FEN};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameDisplayState {
    pub fen: String,
    /// The whole game, regardless of focus.
    pub history: History,
    pub focused_index: HistoryIndex,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_move: Option<ChessMove>,
    pub turn: Side,
}

fn last_real_move(history: &History, index: &HistoryIndex) -> Option<ChessMove> {
    history::find_move_at_index(history, index)
        .filter(|mv| !mv.is_non_move)
        .map(ChessMove::without_branches)
}

pub fn game_display_state<R: ChessRules>(
    rules: &R,
    game_pgn: &str,
    focused_index: Option<&HistoryIndex>,
) -> Result<GameDisplayState, RulesError> {
    let history = rules.pgn_to_history(game_pgn)?;

    let Some(focused_index) = focused_index else {
        let fen = rules.pgn_fen(game_pgn)?;
        let focused_index = history::last_index(&history);
        return Ok(GameDisplayState {
            turn: rules.turn(&fen)?,
            last_move: last_real_move(&history, &focused_index),
            fen,
            history,
            focused_index,
        });
    };

    let (visible, focused_index) = history::slice_history(&history, &focused_index.increment());
    let starting_fen = pgn::starting_fen(game_pgn).unwrap_or_else(|| STARTING_FEN.to_string());
    let fen = rules.fen_after(&starting_fen, &history::history_to_linear(&visible))?;

    Ok(GameDisplayState {
        turn: rules.turn(&fen)?,
        last_move: last_real_move(&visible, &focused_index),
        fen,
        history,
        focused_index,
    })
}

/// Side to move at the end of `game_pgn`.
pub fn game_turn<R: ChessRules>(rules: &R, game_pgn: &str) -> Result<Side, RulesError> {
    rules.turn(&rules.pgn_fen(game_pgn)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::history::HalfMove;
    use chess_core::ShakmatyRules;

    const PGN: &str = "1. e4 e5 2. Nf3";

    #[test]
    fn test_unfocused_shows_final_position() {
        let state = game_display_state(&ShakmatyRules, PGN, None).unwrap();
        assert_eq!(state.focused_index, HistoryIndex::new(1, HalfMove::White));
        assert_eq!(state.turn, Side::Black);
        assert_eq!(state.last_move.map(|mv| mv.san), Some("Nf3".to_string()));
        assert_eq!(state.history.len(), 2);
    }

    #[test]
    fn test_focus_rewinds_the_board() {
        let focus = HistoryIndex::new(0, HalfMove::White);
        let state = game_display_state(&ShakmatyRules, PGN, Some(&focus)).unwrap();
        assert_eq!(state.focused_index, focus);
        assert_eq!(state.fen, "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1");
        assert_eq!(state.turn, Side::Black);
        assert_eq!(state.last_move.map(|mv| mv.san), Some("e4".to_string()));
        // History is never truncated for display.
        assert_eq!(state.history.len(), 2);
    }

    #[test]
    fn test_focus_on_start() {
        let state = game_display_state(&ShakmatyRules, PGN, Some(&HistoryIndex::start())).unwrap();
        assert_eq!(state.fen, STARTING_FEN);
        assert_eq!(state.last_move, None);
        assert_eq!(state.turn, Side::White);
    }

    #[test]
    fn test_empty_game() {
        let state = game_display_state(&ShakmatyRules, "", None).unwrap();
        assert_eq!(state.focused_index, HistoryIndex::start());
        assert_eq!(state.fen, STARTING_FEN);
        assert_eq!(game_turn(&ShakmatyRules, "").unwrap(), Side::White);
    }
}
