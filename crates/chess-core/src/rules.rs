//! Chess rules collaborator.
//!
//! Reducers never look at boards themselves; they hand FENs and move requests
//! to a [`ChessRules`] implementation and get SAN, FEN and game outcome back.
//! [`ShakmatyRules`] is the default, backed by shakmaty.

use serde::{Deserialize, Serialize};
use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::{CastlingMode, Chess, EnPassantMode, File, Move, Piece, Position, Role, Setup, Square};

use crate::error::RulesError;
use crate::history::{linear_to_history, ChessMove, History};
use crate::pgn;
use crate::side::{PieceKind, Side};

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A move as submitted by a player: squares plus an optional promotion piece.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promote_to: Option<PieceKind>,
}

impl MoveRequest {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            promote_to: None,
        }
    }

    pub fn promoting(mut self, kind: PieceKind) -> Self {
        self.promote_to = Some(kind);
        self
    }
}

/// Terminal state of the position reached after a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionOutcome {
    Checkmate { winner: Side },
    Stalemate,
    InsufficientMaterial,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayedMove {
    pub mv: ChessMove,
    pub fen: String,
    pub outcome: Option<PositionOutcome>,
}

pub trait ChessRules {
    /// Plays a legal move on `fen`.
    fn play(&self, fen: &str, request: &MoveRequest) -> Result<PlayedMove, RulesError>;

    /// Free-board move: the legal move when there is one, otherwise the piece
    /// is simply relocated (analysis boards allow arbitrary edits).
    fn place(&self, fen: &str, request: &MoveRequest) -> Result<PlayedMove, RulesError>;

    /// Replays `moves` from `fen` with [`ChessRules::place`], skipping non-moves.
    fn fen_after(&self, fen: &str, moves: &[ChessMove]) -> Result<String, RulesError> {
        let mut current = fen.to_string();
        for mv in moves.iter().filter(|mv| !mv.is_non_move) {
            let (Some(from), Some(to)) = (&mv.from, &mv.to) else {
                continue;
            };
            let request = MoveRequest {
                from: from.clone(),
                to: to.clone(),
                promote_to: mv.promote_to,
            };
            current = self.place(&current, &request)?.fen;
        }
        Ok(current)
    }

    /// Parses a PGN into a branch-free history.
    fn pgn_to_history(&self, pgn: &str) -> Result<History, RulesError>;

    /// Position reached at the end of a PGN.
    fn pgn_fen(&self, pgn: &str) -> Result<String, RulesError>;

    /// Side to move in `fen`.
    fn turn(&self, fen: &str) -> Result<Side, RulesError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ShakmatyRules;

fn parse_fen(fen: &str) -> Result<Fen, RulesError> {
    fen.parse::<Fen>().map_err(|_| RulesError::InvalidFen { fen: fen.to_string() })
}

fn parse_square(square: &str) -> Result<Square, RulesError> {
    square
        .parse::<Square>()
        .map_err(|_| RulesError::InvalidSquare(square.to_string()))
}

fn to_fen(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

fn position_at(fen: &str) -> Result<Chess, RulesError> {
    parse_fen(fen)?
        .into_position::<Chess>(CastlingMode::Standard)
        .map_err(|_| RulesError::InvalidFen { fen: fen.to_string() })
}

/// Destination square as players see it; shakmaty encodes castling as
/// king-takes-rook.
fn king_target(mv: &Move) -> Square {
    match mv {
        Move::Castle { king, rook } => {
            let file = if rook.file() > king.file() { File::G } else { File::C };
            Square::from_coords(file, king.rank())
        }
        other => other.to(),
    }
}

fn matches_request(mv: &Move, from: Square, to: Square, promotion: Option<Role>) -> bool {
    mv.from() == Some(from) && (king_target(mv) == to || mv.to() == to) && mv.promotion() == promotion
}

fn find_legal(pos: &Chess, request: &MoveRequest) -> Result<Move, RulesError> {
    let from = parse_square(&request.from)?;
    let to = parse_square(&request.to)?;
    if let Some(kind) = request.promote_to {
        if !kind.is_promotable() {
            return Err(RulesError::InvalidPromotion(kind));
        }
    }
    let promotion = request.promote_to.map(Role::from);

    let legals = pos.legal_moves();
    let found = legals
        .iter()
        .find(|m| matches_request(m, from, to, promotion))
        .or_else(|| {
            // Pawn reaching the last rank without an explicit piece.
            promotion
                .is_none()
                .then(|| legals.iter().find(|m| matches_request(m, from, to, Some(Role::Queen))))
                .flatten()
        });

    found.cloned().ok_or_else(|| RulesError::IllegalMove {
        from: request.from.clone(),
        to: request.to.clone(),
    })
}

fn outcome_of(pos: &Chess) -> Option<PositionOutcome> {
    if pos.is_checkmate() {
        Some(PositionOutcome::Checkmate {
            winner: Side::from(pos.turn()).swap(),
        })
    } else if pos.is_stalemate() {
        Some(PositionOutcome::Stalemate)
    } else if pos.is_insufficient_material() {
        Some(PositionOutcome::InsufficientMaterial)
    } else {
        None
    }
}

fn play_legal(mut pos: Chess, mv: &Move) -> PlayedMove {
    let color = Side::from(pos.turn());
    let from = mv.from().map(|sq| sq.to_string());
    let to = king_target(mv).to_string();
    let san = SanPlus::from_move_and_play_unchecked(&mut pos, mv.clone()).to_string();

    PlayedMove {
        fen: to_fen(&pos),
        outcome: outcome_of(&pos),
        mv: ChessMove {
            from,
            to: Some(to),
            promote_to: mv.promotion().map(PieceKind::from),
            san,
            color,
            is_non_move: false,
            branched_histories: Vec::new(),
        },
    }
}

/// Relocates a piece without any legality check, keeping the FEN fields
/// (turn, castling rights, clocks) plausible.
fn free_place(setup: &mut Setup, request: &MoveRequest) -> Result<ChessMove, RulesError> {
    let from = parse_square(&request.from)?;
    let to = parse_square(&request.to)?;
    let piece = setup
        .board
        .remove_piece_at(from)
        .ok_or_else(|| RulesError::NoPieceAt(request.from.clone()))?;
    let captured = setup.board.remove_piece_at(to).is_some();

    let promotion = match request.promote_to {
        Some(kind) if !kind.is_promotable() => return Err(RulesError::InvalidPromotion(kind)),
        Some(kind) if piece.role == Role::Pawn => Some(kind),
        _ => None,
    };
    let placed = Piece {
        color: piece.color,
        role: promotion.map(Role::from).unwrap_or(piece.role),
    };
    setup.board.set_piece_at(to, placed);

    setup.castling_rights.discard(from);
    setup.castling_rights.discard(to);
    setup.ep_square = None;
    setup.turn = !piece.color;
    if piece.role == Role::Pawn || captured {
        setup.halfmoves = 0;
    } else {
        setup.halfmoves = setup.halfmoves.saturating_add(1);
    }
    if piece.color.is_black() {
        setup.fullmoves = setup.fullmoves.saturating_add(1);
    }

    let mut san = String::new();
    match PieceKind::from(piece.role).san_letter() {
        Some(letter) => {
            san.push(letter);
            if captured {
                san.push('x');
            }
        }
        None if captured => {
            san.push(from.file().char());
            san.push('x');
        }
        None => {}
    }
    san.push_str(&to.to_string());
    if let Some(letter) = promotion.and_then(PieceKind::san_letter) {
        san.push('=');
        san.push(letter);
    }

    let mut mv = ChessMove::new(request.from.clone(), request.to.clone(), san, Side::from(piece.color));
    mv.promote_to = promotion;
    Ok(mv)
}

impl ChessRules for ShakmatyRules {
    fn play(&self, fen: &str, request: &MoveRequest) -> Result<PlayedMove, RulesError> {
        let pos = position_at(fen)?;
        let mv = find_legal(&pos, request)?;
        Ok(play_legal(pos, &mv))
    }

    fn place(&self, fen: &str, request: &MoveRequest) -> Result<PlayedMove, RulesError> {
        let parsed = parse_fen(fen)?;
        if let Ok(pos) = parsed.clone().into_position::<Chess>(CastlingMode::Standard) {
            if let Ok(mv) = find_legal(&pos, request) {
                return Ok(play_legal(pos, &mv));
            }
        }

        let mut setup = parsed.into_setup();
        let mv = free_place(&mut setup, request)?;
        let placed = Fen::try_from_setup(setup).map_err(|_| RulesError::InvalidFen { fen: fen.to_string() })?;
        Ok(PlayedMove {
            mv,
            fen: placed.to_string(),
            outcome: None,
        })
    }

    fn pgn_to_history(&self, pgn: &str) -> Result<History, RulesError> {
        let start = pgn::starting_fen(pgn).unwrap_or_else(|| STARTING_FEN.to_string());
        let mut pos = position_at(&start)?;
        let mut moves = Vec::new();

        for (ply, token) in pgn::extract_moves(pgn)?.iter().enumerate() {
            let san = token
                .parse::<SanPlus>()
                .map_err(|_| RulesError::InvalidSan(token.clone()))?
                .san;
            let mv = san.to_move(&pos).map_err(|_| RulesError::IllegalSan {
                san: token.clone(),
                ply,
            })?;
            let played = play_legal(pos.clone(), &mv);
            pos.play_unchecked(mv);
            moves.push(played.mv);
        }

        Ok(linear_to_history(&moves))
    }

    fn pgn_fen(&self, pgn: &str) -> Result<String, RulesError> {
        let start = pgn::starting_fen(pgn).unwrap_or_else(|| STARTING_FEN.to_string());
        let mut pos = position_at(&start)?;

        for (ply, token) in pgn::extract_moves(pgn)?.iter().enumerate() {
            let san = token
                .parse::<SanPlus>()
                .map_err(|_| RulesError::InvalidSan(token.clone()))?
                .san;
            let mv = san.to_move(&pos).map_err(|_| RulesError::IllegalSan {
                san: token.clone(),
                ply,
            })?;
            pos.play_unchecked(mv);
        }

        Ok(to_fen(&pos))
    }

    fn turn(&self, fen: &str) -> Result<Side, RulesError> {
        Ok(Side::from(parse_fen(fen)?.into_setup().turn))
    }
}
