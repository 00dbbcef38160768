//! Chess vocabulary shared by the room reducers: the branching move history,
//! PGN movetext helpers and the rules collaborator.

pub mod error;
pub mod history;
pub mod pgn;
pub mod rules;
pub mod side;

pub use error::{PgnError, RulesError};
pub use history::{ChessMove, History, HistoryIndex};
pub use rules::{ChessRules, MoveRequest, PlayedMove, PositionOutcome, ShakmatyRules, STARTING_FEN};
pub use side::{PieceKind, Side};
