//! Recursive addressing into a branching move history.
//!
//! An index names a half-move by turn number and color. When the move lives
//! inside a variation, the index also carries the branch ordinal and an index
//! into that branch, recursively. The branch index may be left unresolved,
//! meaning "whatever the last move of that branch is", so that appending to a
//! variation does not invalidate indices stored elsewhere.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{last_index, History};

/// Which half of a turn a move occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HalfMove {
    White = 0,
    Black = 1,
}

impl HalfMove {
    pub fn as_usize(self) -> usize {
        self as usize
    }

    fn from_wire(value: u8) -> Option<HalfMove> {
        match value {
            0 => Some(HalfMove::White),
            1 => Some(HalfMove::Black),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "WireIndex", try_from = "WireIndex")]
pub enum HistoryIndex {
    Base {
        turn: i32,
        half: HalfMove,
    },
    Nested {
        turn: i32,
        half: HalfMove,
        child: Box<BranchIndex>,
        branch: usize,
    },
}

/// Position inside a variation. `Unresolved` stands for the tip of the branch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BranchIndex {
    Resolved(HistoryIndex),
    Unresolved,
}

impl BranchIndex {
    fn resolved(&self, op: &str) -> &HistoryIndex {
        match self {
            BranchIndex::Resolved(index) => index,
            BranchIndex::Unresolved => {
                panic!("cannot {op} an unresolved branch index; resolve it against its history first")
            }
        }
    }
}

impl HistoryIndex {
    pub fn new(turn: i32, half: HalfMove) -> Self {
        HistoryIndex::Base { turn, half }
    }

    /// The index before any move has been played: `[-1, 1]`.
    pub fn start() -> Self {
        HistoryIndex::new(-1, HalfMove::Black)
    }

    pub fn nested(turn: i32, half: HalfMove, child: HistoryIndex, branch: usize) -> Self {
        HistoryIndex::Nested {
            turn,
            half,
            child: Box::new(BranchIndex::Resolved(child)),
            branch,
        }
    }

    /// Points at the last move of `branch`, whatever it is at lookup time.
    pub fn branch_tip(turn: i32, half: HalfMove, branch: usize) -> Self {
        HistoryIndex::Nested {
            turn,
            half,
            child: Box::new(BranchIndex::Unresolved),
            branch,
        }
    }

    pub fn turn(&self) -> i32 {
        match self {
            HistoryIndex::Base { turn, .. } | HistoryIndex::Nested { turn, .. } => *turn,
        }
    }

    pub fn half(&self) -> HalfMove {
        match self {
            HistoryIndex::Base { half, .. } | HistoryIndex::Nested { half, .. } => *half,
        }
    }

    pub fn is_start(&self) -> bool {
        *self == HistoryIndex::start()
    }

    pub fn is_nested(&self) -> bool {
        matches!(self, HistoryIndex::Nested { .. })
    }

    /// The top-level part of the index, dropping any branch address.
    pub fn root(&self) -> HistoryIndex {
        HistoryIndex::new(self.turn(), self.half())
    }

    /// Advances one half-move along the deepest line the index points into.
    ///
    /// Panics on an unresolved branch index.
    pub fn increment(&self) -> HistoryIndex {
        match self {
            HistoryIndex::Base { turn, half } => match half {
                HalfMove::White => HistoryIndex::new(*turn, HalfMove::Black),
                HalfMove::Black => HistoryIndex::new(turn + 1, HalfMove::White),
            },
            HistoryIndex::Nested {
                turn,
                half,
                child,
                branch,
            } => HistoryIndex::nested(*turn, *half, child.resolved("increment").increment(), *branch),
        }
    }

    /// Steps back one half-move. Stepping back from the first move of a branch
    /// lands on the move the branch hangs from.
    ///
    /// Panics on an unresolved branch index.
    pub fn decrement(&self) -> HistoryIndex {
        match self {
            HistoryIndex::Base { turn, half } => match half {
                HalfMove::Black => HistoryIndex::new(*turn, HalfMove::White),
                HalfMove::White => HistoryIndex::new(turn - 1, HalfMove::Black),
            },
            HistoryIndex::Nested {
                turn,
                half,
                child,
                branch,
            } => {
                let previous = child.resolved("decrement").decrement();
                if previous.turn() == -1 {
                    return HistoryIndex::new(*turn, *half);
                }
                HistoryIndex::nested(*turn, *half, previous, *branch)
            }
        }
    }

    /// Replaces every unresolved branch index with the concrete index of that
    /// branch's last move. Branches that do not exist are left untouched.
    pub fn resolve(&self, history: &History) -> HistoryIndex {
        match self {
            HistoryIndex::Base { .. } => self.clone(),
            HistoryIndex::Nested {
                turn,
                half,
                child,
                branch,
            } => {
                let branch_history = history
                    .move_at(*turn, *half)
                    .and_then(|mv| mv.branched_histories.get(*branch));
                let Some(branch_history) = branch_history else {
                    return self.clone();
                };
                let child = match child.as_ref() {
                    BranchIndex::Resolved(index) => index.resolve(branch_history),
                    BranchIndex::Unresolved => last_index(branch_history),
                };
                HistoryIndex::nested(*turn, *half, child, *branch)
            }
        }
    }
}

impl Default for HistoryIndex {
    fn default() -> Self {
        HistoryIndex::start()
    }
}

impl fmt::Display for HistoryIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryIndex::Base { turn, half } => write!(f, "[{}, {}]", turn, half.as_usize()),
            HistoryIndex::Nested {
                turn,
                half,
                child,
                branch,
            } => {
                write!(f, "[{}, {}", turn, half.as_usize())?;
                match child.as_ref() {
                    BranchIndex::Unresolved => write!(f, " -1")?,
                    BranchIndex::Resolved(index) => write!(f, ", {}", index)?,
                }
                if *branch > 0 {
                    write!(f, ":{}", branch)?;
                }
                write!(f, "]")
            }
        }
    }
}

// Wire format: `[turn, half]` or `[turn, half, [child | -1, branch?]]`.
// A missing branch ordinal means the first branch.

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireIndex {
    Base(i32, u8),
    Nested(i32, u8, WireBranch),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireBranch {
    Ordinal(WireChild, usize),
    First((WireChild,)),
}

impl WireBranch {
    fn into_parts(self) -> (WireChild, usize) {
        match self {
            WireBranch::Ordinal(child, branch) => (child, branch),
            WireBranch::First((child,)) => (child, 0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireChild {
    Tip(i32),
    Index(Box<WireIndex>),
}

#[derive(Debug, thiserror::Error)]
pub enum IndexFormatError {
    #[error("half-move must be 0 or 1, got {0}")]
    Half(u8),
    #[error("unresolved branch marker must be -1, got {0}")]
    Marker(i32),
}

impl From<HistoryIndex> for WireIndex {
    fn from(index: HistoryIndex) -> Self {
        match index {
            HistoryIndex::Base { turn, half } => WireIndex::Base(turn, half as u8),
            HistoryIndex::Nested {
                turn,
                half,
                child,
                branch,
            } => {
                let child = match *child {
                    BranchIndex::Unresolved => WireChild::Tip(-1),
                    BranchIndex::Resolved(index) => WireChild::Index(Box::new(index.into())),
                };
                WireIndex::Nested(turn, half as u8, WireBranch::Ordinal(child, branch))
            }
        }
    }
}

impl TryFrom<WireIndex> for HistoryIndex {
    type Error = IndexFormatError;

    fn try_from(wire: WireIndex) -> Result<Self, Self::Error> {
        match wire {
            WireIndex::Base(turn, half) => {
                let half = HalfMove::from_wire(half).ok_or(IndexFormatError::Half(half))?;
                Ok(HistoryIndex::new(turn, half))
            }
            WireIndex::Nested(turn, half, tail) => {
                let (child, branch) = tail.into_parts();
                let half = HalfMove::from_wire(half).ok_or(IndexFormatError::Half(half))?;
                let child = match child {
                    WireChild::Tip(-1) => BranchIndex::Unresolved,
                    WireChild::Tip(marker) => return Err(IndexFormatError::Marker(marker)),
                    WireChild::Index(index) => BranchIndex::Resolved(HistoryIndex::try_from(*index)?),
                };
                Ok(HistoryIndex::Nested {
                    turn,
                    half,
                    child: Box::new(child),
                    branch,
                })
            }
        }
    }
}
