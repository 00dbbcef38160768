//! Learn activity: a set of analysis chapters, each with its own branching
//! notation and board annotations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use chess_core::history::{self, ChessMove, HalfMove, History, HistoryIndex};
use chess_core::{ChessRules, MoveRequest, Side, STARTING_FEN};

use crate::action::Action;
use crate::error::{log_rejection, Rejection};

pub type ChapterId = u32;

pub const DEFAULT_CHAPTER_ID: ChapterId = 0;

/// `[from, to, hex?]` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ArrowDraw {
    pub from: String,
    pub to: String,
    pub hex: Option<String>,
}

impl TryFrom<Vec<String>> for ArrowDraw {
    type Error = String;

    fn try_from(parts: Vec<String>) -> Result<Self, Self::Error> {
        let len = parts.len();
        let mut parts = parts.into_iter();
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(from), Some(to), hex, None) => Ok(ArrowDraw { from, to, hex }),
            _ => Err(format!("arrow must have 2 or 3 elements, got {len}")),
        }
    }
}

impl From<ArrowDraw> for Vec<String> {
    fn from(arrow: ArrowDraw) -> Self {
        let mut parts = vec![arrow.from, arrow.to];
        parts.extend(arrow.hex);
        parts
    }
}

/// `[square, hex]` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct CircleDraw {
    pub at: String,
    pub hex: String,
}

impl From<(String, String)> for CircleDraw {
    fn from((at, hex): (String, String)) -> Self {
        CircleDraw { at, hex }
    }
}

impl From<CircleDraw> for (String, String) {
    fn from(circle: CircleDraw) -> Self {
        (circle.at, circle.hex)
    }
}

pub type ArrowsMap = BTreeMap<String, ArrowDraw>;
pub type CirclesMap = BTreeMap<String, CircleDraw>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notation {
    pub history: History,
    pub focused_index: HistoryIndex,
    pub starting_fen: String,
}

impl Notation {
    pub fn starting_at(fen: impl Into<String>) -> Self {
        Self {
            history: History::new(),
            focused_index: HistoryIndex::start(),
            starting_fen: fen.into(),
        }
    }
}

impl Default for Notation {
    fn default() -> Self {
        Notation::starting_at(STARTING_FEN)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChapterState {
    pub name: String,
    pub display_fen: String,
    pub arrows_map: ArrowsMap,
    pub circles_map: CirclesMap,
    pub orientation: Side,
    pub notation: Notation,
}

impl Default for ChapterState {
    fn default() -> Self {
        Self {
            name: "New Chapter".to_string(),
            display_fen: STARTING_FEN.to_string(),
            arrows_map: ArrowsMap::new(),
            circles_map: CirclesMap::new(),
            orientation: Side::White,
            notation: Notation::default(),
        }
    }
}

/// Board fields an `updateChapter` may overwrite. Notation is only ever
/// edited through the move actions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChapterUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_fen: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrows_map: Option<ArrowsMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circles_map: Option<CirclesMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Side>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: ChapterId,
    #[serde(flatten)]
    pub state: ChapterState,
}

impl Chapter {
    pub fn default_chapter() -> Self {
        Chapter {
            id: DEFAULT_CHAPTER_ID,
            state: ChapterState {
                name: "Chapter 1".to_string(),
                ..ChapterState::default()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnState {
    pub loaded_chapter_id: ChapterId,
    pub chapters_map: BTreeMap<ChapterId, Chapter>,
    /// Last id handed out.
    pub chapters_index: ChapterId,
}

impl Default for LearnState {
    fn default() -> Self {
        let chapter = Chapter::default_chapter();
        Self {
            loaded_chapter_id: chapter.id,
            chapters_map: BTreeMap::from([(chapter.id, chapter)]),
            chapters_index: 1,
        }
    }
}

impl LearnState {
    pub fn loaded_chapter(&self) -> Option<&Chapter> {
        self.chapters_map.get(&self.loaded_chapter_id)
    }

    fn with_chapter(&self, chapter: Chapter) -> LearnState {
        let mut next = self.clone();
        next.chapters_map.insert(chapter.id, chapter);
        next
    }

    fn update_loaded<F>(&self, edit: F) -> Result<LearnState, Rejection>
    where
        F: FnOnce(&ChapterState) -> Result<ChapterState, Rejection>,
    {
        let chapter = self
            .loaded_chapter()
            .ok_or(Rejection::ChapterNotFound(self.loaded_chapter_id))?;
        let state = edit(&chapter.state)?;
        Ok(self.with_chapter(Chapter {
            id: chapter.id,
            state,
        }))
    }
}

fn same_move(a: &ChessMove, b: &ChessMove) -> bool {
    !a.is_non_move && a.from == b.from && a.to == b.to && a.promote_to == b.promote_to
}

/// Where a new move lands given the current focus.
///
/// Inside a branch the move continues the branch from its tip, or opens a
/// sub-branch when the focus sits earlier in it. On the main line a focus
/// short of the tip opens a branch at the focused move. Branches continue
/// the line after the move they hang on, so from the start of a non-empty
/// history only the existing first move can be replayed.
fn insert_move(notation: &Notation, mv: ChessMove) -> Result<(History, HistoryIndex), Rejection> {
    let history = &notation.history;
    let focus = &notation.focused_index;

    if focus.is_start() && !history.is_empty() {
        let first = HistoryIndex::new(0, HalfMove::White);
        return match history::find_move_at_index(history, &first) {
            Some(existing) if same_move(existing, &mv) => Ok((history.clone(), first)),
            _ => Err(Rejection::NoBranchPoint),
        };
    }

    let at_tip = focus.is_start() || history::is_last_index_in_branch(history, focus);
    let inserted = if focus.is_nested() {
        let at = if at_tip { focus.increment() } else { focus.clone() };
        history::add_move(history, mv, Some(&at))
    } else if at_tip {
        history::add_move(history, mv, None)
    } else {
        history::add_move(history, mv, Some(focus))
    };
    Ok(inserted)
}

fn add_move<R: ChessRules>(rules: &R, chapter: &ChapterState, request: &MoveRequest) -> Result<ChapterState, Rejection> {
    let played = rules.place(&chapter.display_fen, request)?;
    let (history, focused_index) = insert_move(&chapter.notation, played.mv)?;
    debug!(%focused_index, san = ?history::find_move_at_index(&history, &focused_index).map(|mv| &mv.san), "move added");

    Ok(ChapterState {
        display_fen: played.fen,
        arrows_map: ArrowsMap::new(),
        circles_map: CirclesMap::new(),
        notation: Notation {
            history,
            focused_index,
            ..chapter.notation.clone()
        },
        ..chapter.clone()
    })
}

fn fen_at<R: ChessRules>(rules: &R, notation: &Notation, index: &HistoryIndex) -> Result<String, Rejection> {
    let line = history::calculate_linear_history_at_index(&notation.history, index);
    Ok(rules.fen_after(&notation.starting_fen, &line)?)
}

fn focus<R: ChessRules>(rules: &R, chapter: &ChapterState, index: &HistoryIndex) -> Result<ChapterState, Rejection> {
    let notation = &chapter.notation;
    let index = index.resolve(&notation.history);
    if !index.is_start() && history::find_move_at_index(&notation.history, &index).is_none() {
        return Err(Rejection::NoMoveAtIndex(index));
    }

    Ok(ChapterState {
        display_fen: fen_at(rules, notation, &index)?,
        notation: Notation {
            focused_index: index,
            ..notation.clone()
        },
        ..chapter.clone()
    })
}

fn delete_move<R: ChessRules>(rules: &R, chapter: &ChapterState, index: &HistoryIndex) -> Result<ChapterState, Rejection> {
    let (history, focused_index) = history::delete_move(&chapter.notation.history, index)
        .ok_or_else(|| Rejection::NoMoveAtIndex(index.clone()))?;
    let notation = Notation {
        history,
        focused_index,
        ..chapter.notation.clone()
    };

    Ok(ChapterState {
        display_fen: fen_at(rules, &notation, &notation.focused_index)?,
        arrows_map: ArrowsMap::new(),
        circles_map: CirclesMap::new(),
        notation,
        ..chapter.clone()
    })
}

fn toggle_circle(chapter: &ChapterState, circle: &CircleDraw) -> ChapterState {
    let mut circles_map = chapter.circles_map.clone();
    if circles_map.remove(&circle.at).is_none() {
        circles_map.insert(circle.at.clone(), circle.clone());
    }
    ChapterState {
        circles_map,
        ..chapter.clone()
    }
}

fn apply_learn_action<R: ChessRules>(rules: &R, prev: &LearnState, action: &Action) -> Result<LearnState, Rejection> {
    match action {
        Action::CreateChapter(state) => {
            let id = prev.chapters_index + 1;
            let mut next = prev.with_chapter(Chapter {
                id,
                state: state.clone(),
            });
            next.loaded_chapter_id = id;
            next.chapters_index = id;
            Ok(next)
        }
        Action::UpdateChapter { id, state: update } => {
            let chapter = prev.chapters_map.get(id).ok_or(Rejection::ChapterNotFound(*id))?;
            let display_fen = update.display_fen.clone().unwrap_or_else(|| chapter.state.display_fen.clone());
            rules.turn(&display_fen)?;

            let state = ChapterState {
                name: update.name.clone().unwrap_or_else(|| chapter.state.name.clone()),
                arrows_map: update.arrows_map.clone().unwrap_or_else(|| chapter.state.arrows_map.clone()),
                circles_map: update.circles_map.clone().unwrap_or_else(|| chapter.state.circles_map.clone()),
                orientation: update.orientation.unwrap_or(chapter.state.orientation),
                notation: Notation::starting_at(display_fen.clone()),
                display_fen,
            };
            let mut next = prev.with_chapter(Chapter { id: *id, state });
            next.loaded_chapter_id = *id;
            Ok(next)
        }
        Action::DeleteChapter { id } => {
            let mut next = prev.clone();
            if next.chapters_map.remove(id).is_none() {
                return Err(Rejection::ChapterNotFound(*id));
            }
            if next.chapters_map.is_empty() {
                let chapter = Chapter::default_chapter();
                next.chapters_map.insert(chapter.id, chapter);
            }
            if !next.chapters_map.contains_key(&next.loaded_chapter_id) {
                if let Some(&first) = next.chapters_map.keys().next() {
                    next.loaded_chapter_id = first;
                }
            }
            Ok(next)
        }
        Action::LoadChapter { id } => {
            if !prev.chapters_map.contains_key(id) {
                return Err(Rejection::ChapterNotFound(*id));
            }
            Ok(LearnState {
                loaded_chapter_id: *id,
                ..prev.clone()
            })
        }
        Action::AddMove(request) => prev.update_loaded(|chapter| add_move(rules, chapter, request)),
        Action::FocusHistoryIndex(index) => prev.update_loaded(|chapter| focus(rules, chapter, index)),
        Action::DeleteHistoryMove(index) => prev.update_loaded(|chapter| delete_move(rules, chapter, index)),
        Action::DrawCircle(circle) => prev.update_loaded(|chapter| Ok(toggle_circle(chapter, circle))),
        Action::ClearCircles => prev.update_loaded(|chapter| {
            Ok(ChapterState {
                circles_map: CirclesMap::new(),
                ..chapter.clone()
            })
        }),
        Action::SetArrows(arrows_map) => prev.update_loaded(|chapter| {
            Ok(ChapterState {
                arrows_map: arrows_map.clone(),
                ..chapter.clone()
            })
        }),
        Action::SetOrientation(orientation) => prev.update_loaded(|chapter| {
            Ok(ChapterState {
                orientation: *orientation,
                ..chapter.clone()
            })
        }),
        Action::UpdateFen(fen) => prev.update_loaded(|chapter| {
            rules.turn(fen)?;
            Ok(ChapterState {
                display_fen: fen.clone(),
                arrows_map: ArrowsMap::new(),
                circles_map: CirclesMap::new(),
                notation: Notation::starting_at(fen.clone()),
                ..chapter.clone()
            })
        }),
        _ => Err(Rejection::NotApplicable),
    }
}

/// Learn reducer. Rejected actions are logged and leave the state as it was.
pub fn reduce_learn<R: ChessRules>(rules: &R, prev: &LearnState, action: &Action) -> LearnState {
    match apply_learn_action(rules, prev, action) {
        Ok(next) => next,
        Err(rejection) => {
            log_rejection(action, &rejection);
            prev.clone()
        }
    }
}
