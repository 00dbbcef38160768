use thiserror::Error;

#[derive(Debug, Error)]
pub enum PgnError {
    #[error("invalid movetext pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("no move to take back")]
    Empty,
}

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("invalid FEN {fen:?}")]
    InvalidFen { fen: String },

    #[error("invalid square {0:?}")]
    InvalidSquare(String),

    #[error("no piece at {0}")]
    NoPieceAt(String),

    #[error("illegal move {from}{to}")]
    IllegalMove { from: String, to: String },

    #[error("invalid SAN {0:?}")]
    InvalidSan(String),

    #[error("illegal SAN {san:?} at ply {ply}")]
    IllegalSan { san: String, ply: usize },

    #[error("cannot promote to {0:?}")]
    InvalidPromotion(crate::side::PieceKind),

    #[error(transparent)]
    Pgn(#[from] PgnError),
}
