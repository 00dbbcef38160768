use std::sync::Arc;

use super::{BranchIndex, ChessMove, HalfMove, History, HistoryIndex, Turn};
use crate::side::Side;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

/// Index of the last half-move in `history`; the start index when empty.
pub fn last_index(history: &History) -> HistoryIndex {
    match history.last_turn() {
        Some(turn) => HistoryIndex::new(history.len() as i32 - 1, turn.last_half()),
        None => HistoryIndex::start(),
    }
}

/// Whether `index` is the tip of the line it points into. For nested indices
/// that line is the addressed branch, not the main line.
pub fn is_last_index_in_branch(history: &History, index: &HistoryIndex) -> bool {
    if index.is_start() {
        return false;
    }
    match index.resolve(history) {
        HistoryIndex::Base { turn, half } => HistoryIndex::new(turn, half) == last_index(history),
        HistoryIndex::Nested {
            turn,
            half,
            child,
            branch,
        } => {
            let branch_history = history
                .move_at(turn, half)
                .and_then(|mv| mv.branched_histories.get(branch));
            match (branch_history, child.as_ref()) {
                (Some(branch_history), BranchIndex::Resolved(child)) => {
                    is_last_index_in_branch(branch_history, child)
                }
                _ => false,
            }
        }
    }
}

/// Looks a move up by index, descending into branches. Unresolved branch
/// indices address the branch tip.
pub fn find_move_at_index<'a>(history: &'a History, index: &HistoryIndex) -> Option<&'a ChessMove> {
    match index {
        HistoryIndex::Base { turn, half } => history.move_at(*turn, *half),
        HistoryIndex::Nested {
            turn,
            half,
            child,
            branch,
        } => {
            let branch_history = history.move_at(*turn, *half)?.branched_histories.get(*branch)?;
            match child.as_ref() {
                BranchIndex::Resolved(child) => find_move_at_index(branch_history, child),
                BranchIndex::Unresolved => find_move_at_index(branch_history, &last_index(branch_history)),
            }
        }
    }
}

/// Adds `mv` to the history.
///
/// Without `at`, or when `at` addresses no move, the move is appended to the
/// main line. When `at` addresses a top-level move, the move goes into one of
/// that move's branches: a nested `at` recurses into the named branch, a plain
/// `at` opens a new branch. Returns the index of the inserted move.
pub fn add_move(history: &History, mv: ChessMove, at: Option<&HistoryIndex>) -> (History, HistoryIndex) {
    let Some(at) = at else {
        return append_linear(history, mv);
    };
    let (turn, half) = (at.turn(), at.half());
    let Some(parent) = history.move_at(turn, half) else {
        return append_linear(history, mv);
    };

    let mut branches = parent.branched_histories.clone();
    let inserted_at = match at {
        HistoryIndex::Nested { child, branch, .. } if *branch < branches.len() => {
            let child_at = match child.as_ref() {
                BranchIndex::Resolved(child) => Some(child),
                BranchIndex::Unresolved => None,
            };
            let (next_branch, child_index) = add_move(&branches[*branch], mv, child_at);
            branches[*branch] = next_branch;
            HistoryIndex::nested(turn, half, child_index, *branch)
        }
        _ => {
            let first_turn = match mv.color {
                Side::White => Turn::Half(mv),
                Side::Black => Turn::Full(ChessMove::non_move(Side::White), mv),
            };
            let branch_history = History::from_turns([first_turn]);
            let child_index = last_index(&branch_history);
            branches.push(branch_history);
            HistoryIndex::nested(turn, half, child_index, branches.len() - 1)
        }
    };

    let next_parent = ChessMove {
        branched_histories: branches,
        ..parent.clone()
    };
    (history.with_move(turn, half, next_parent), inserted_at)
}

/// Appends to the end of the main line, padding with non-moves so that
/// every turn starts with white.
fn append_linear(history: &History, mv: ChessMove) -> (History, HistoryIndex) {
    let mut turns = history.turns.clone();
    let open_white = match turns.last().map(|turn| turn.as_ref()) {
        Some(Turn::Half(white)) => Some(white.clone()),
        _ => None,
    };

    match (open_white, mv.color) {
        (Some(white), Side::Black) => {
            turns.pop();
            turns.push(Arc::new(Turn::Full(white, mv)));
        }
        (Some(white), Side::White) => {
            turns.pop();
            turns.push(Arc::new(Turn::Full(white, ChessMove::non_move(Side::Black))));
            turns.push(Arc::new(Turn::Half(mv)));
        }
        (None, Side::White) => turns.push(Arc::new(Turn::Half(mv))),
        (None, Side::Black) => {
            turns.push(Arc::new(Turn::Full(ChessMove::non_move(Side::White), mv)));
        }
    }

    let next = History { turns };
    let index = last_index(&next);
    (next, index)
}

/// The line of real moves from the start up to and including `index`, with
/// branches stripped from each move.
pub fn calculate_linear_history_at_index(history: &History, index: &HistoryIndex) -> Vec<ChessMove> {
    let mut moves = Vec::new();
    let mut cursor = index.resolve(history);

    while !cursor.is_start() {
        let Some(mv) = find_move_at_index(history, &cursor) else {
            break;
        };
        if !mv.is_non_move {
            moves.push(mv.without_branches());
        }
        cursor = cursor.decrement();
    }

    moves.reverse();
    moves
}

/// Drops trailing non-move placeholders from the main line.
pub fn remove_trailing_non_moves(history: &History) -> History {
    let mut turns = history.turns.clone();

    while let Some(last) = turns.last().cloned() {
        match last.as_ref() {
            Turn::Full(white, black) if black.is_non_move => {
                turns.pop();
                turns.push(Arc::new(Turn::Half(white.clone())));
            }
            Turn::Half(white) if white.is_non_move => {
                turns.pop();
            }
            _ => break,
        }
    }

    History { turns }
}

/// Truncates the history before `to_index` (exclusive).
///
/// A nested index truncates inside the addressed branch, leaving the main
/// line alone; a branch left empty is removed. Returns the truncated history
/// and the last index remaining on the truncated line.
pub fn slice_history(history: &History, to_index: &HistoryIndex) -> (History, HistoryIndex) {
    match to_index.resolve(history) {
        HistoryIndex::Base { turn, half } => {
            let sliced = slice_main_line(history, turn, half);
            let index = last_index(&sliced);
            (sliced, index)
        }
        HistoryIndex::Nested {
            turn,
            half,
            child,
            branch,
        } => {
            let Some(parent) = history.move_at(turn, half) else {
                return (history.clone(), last_index(history));
            };
            let (Some(branch_history), BranchIndex::Resolved(child)) =
                (parent.branched_histories.get(branch), child.as_ref())
            else {
                return (history.clone(), last_index(history));
            };

            let (sliced_branch, branch_last) = slice_history(branch_history, child);
            let mut branches = parent.branched_histories.clone();
            let index = if sliced_branch.is_empty() {
                branches.remove(branch);
                HistoryIndex::new(turn, half)
            } else {
                branches[branch] = sliced_branch;
                HistoryIndex::nested(turn, half, branch_last, branch)
            };

            let next_parent = ChessMove {
                branched_histories: branches,
                ..parent.clone()
            };
            (history.with_move(turn, half, next_parent), index)
        }
    }
}

fn slice_main_line(history: &History, turn: i32, half: HalfMove) -> History {
    let Ok(turn) = usize::try_from(turn) else {
        return History::new();
    };
    if turn >= history.len() {
        return remove_trailing_non_moves(history);
    }

    let mut turns: Vec<Arc<Turn>> = history.turns[..turn].to_vec();
    if half == HalfMove::Black {
        let white = history.turns[turn].white().clone();
        turns.push(Arc::new(Turn::Half(white)));
    }
    remove_trailing_non_moves(&History { turns })
}

/// Clamps an index that runs past the end of its line onto that line's tip.
fn clamp_index(history: &History, index: &HistoryIndex) -> HistoryIndex {
    match index {
        HistoryIndex::Base { turn, half } => {
            if find_move_at_index(history, index).is_some() || index.is_start() || *turn < 0 {
                return HistoryIndex::new((*turn).max(-1), *half);
            }
            last_index(history)
        }
        HistoryIndex::Nested {
            turn,
            half,
            child,
            branch,
        } => {
            let root = HistoryIndex::new(*turn, *half);
            let branch_history = history
                .move_at(*turn, *half)
                .and_then(|mv| mv.branched_histories.get(*branch));
            match (branch_history, child.as_ref()) {
                (Some(branch_history), BranchIndex::Resolved(child)) => {
                    let child = clamp_index(branch_history, child);
                    if child.turn() < 0 {
                        root
                    } else {
                        HistoryIndex::nested(*turn, *half, child, *branch)
                    }
                }
                (Some(branch_history), BranchIndex::Unresolved) => {
                    HistoryIndex::nested(*turn, *half, last_index(branch_history), *branch)
                }
                (None, _) => clamp_index(history, &root),
            }
        }
    }
}

/// Nearest index at or beyond `index` in `direction` that holds a real move.
///
/// Going left ends at the start index when nothing is found. Going right
/// falls back to searching left once the line runs out.
pub fn find_next_valid_move_index(history: &History, index: &HistoryIndex, direction: Direction) -> HistoryIndex {
    let clamped = clamp_index(history, &index.resolve(history));
    match direction {
        Direction::Left => {
            let mut cursor = clamped;
            while !cursor.is_start() && cursor.turn() >= 0 {
                match find_move_at_index(history, &cursor) {
                    Some(mv) if !mv.is_non_move => return cursor,
                    _ => cursor = cursor.decrement(),
                }
            }
            HistoryIndex::start()
        }
        Direction::Right => {
            let mut cursor = if clamped.is_start() {
                clamped.increment()
            } else {
                clamped.clone()
            };
            loop {
                match find_move_at_index(history, &cursor) {
                    Some(mv) if !mv.is_non_move => return cursor,
                    Some(_) => cursor = cursor.increment(),
                    None => return find_next_valid_move_index(history, &clamped, Direction::Left),
                }
            }
        }
    }
}

/// Removes the move at `at` together with everything that follows it on its
/// line. Returns the new history and the index focus should move to, or
/// `None` when `at` does not address a move.
pub fn delete_move(history: &History, at: &HistoryIndex) -> Option<(History, HistoryIndex)> {
    find_move_at_index(history, at)?;
    let (sliced, last) = slice_history(history, at);
    let focus = find_next_valid_move_index(&sliced, &last, Direction::Left);
    Some((sliced, focus))
}

/// Builds a branch-free history from a flat move list. A black first move
/// gets a white non-move in front of it.
pub fn linear_to_history(moves: &[ChessMove]) -> History {
    moves.iter().fold(History::new(), |history, mv| {
        append_linear(&history, mv.without_branches()).0
    })
}

/// Real moves of the main line in order, without branches.
pub fn history_to_linear(history: &History) -> Vec<ChessMove> {
    history
        .turns()
        .flat_map(|turn| turn.moves())
        .filter(|mv| !mv.is_non_move)
        .map(ChessMove::without_branches)
        .collect()
}
