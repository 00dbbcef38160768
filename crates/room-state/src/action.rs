//! Wire protocol: every action is `{ "type": ..., "payload": ... }`.

use serde::{Deserialize, Serialize};

use chess_core::{HistoryIndex, MoveRequest, PieceKind, Side};

use crate::activity::ActivityConfig;
use crate::game::Millis;
use crate::learn::{ArrowsMap, ChapterId, ChapterState, ChapterUpdate, CircleDraw};
use crate::offer::OfferType;
use crate::play::PlayerId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovePayload {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promote_to: Option<PieceKind>,
    pub move_at: Millis,
}

impl MovePayload {
    pub fn request(&self) -> MoveRequest {
        MoveRequest {
            from: self.from.clone(),
            to: self.to.clone(),
            promote_to: self.promote_to,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOfferPayload {
    pub by_player: PlayerId,
    pub offer_type: OfferType,
    pub timestamp: Millis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Action {
    #[serde(rename = "activity:start")]
    StartActivity(ActivityConfig),

    #[serde(rename = "play:startWhitePlayerIdlingTimer")]
    StartWhitePlayerIdlingTimer { at: Millis },
    #[serde(rename = "play:move")]
    Move(MovePayload),
    #[serde(rename = "play:timeout")]
    Timeout { color: Side },
    #[serde(rename = "play:resignGame")]
    ResignGame { color: Side },
    #[serde(rename = "play:sendOffer")]
    SendOffer(SendOfferPayload),
    #[serde(rename = "play:acceptOfferDraw")]
    AcceptOfferDraw,
    #[serde(rename = "play:acceptTakeBack")]
    AcceptTakeBack,
    #[serde(rename = "play:denyOffer")]
    DenyOffer,
    #[serde(rename = "play:cancelOffer")]
    CancelOffer,
    #[serde(rename = "play:abortGame")]
    AbortGame,

    #[serde(rename = "match:startNewGame")]
    StartNewGame,

    #[serde(rename = "createChapter")]
    CreateChapter(ChapterState),
    #[serde(rename = "updateChapter")]
    UpdateChapter { id: ChapterId, state: ChapterUpdate },
    #[serde(rename = "deleteChapter")]
    DeleteChapter { id: ChapterId },
    #[serde(rename = "loadChapter")]
    LoadChapter { id: ChapterId },
    #[serde(rename = "loadedChapter:addMove")]
    AddMove(MoveRequest),
    #[serde(rename = "loadedChapter:focusHistoryIndex")]
    FocusHistoryIndex(HistoryIndex),
    #[serde(rename = "loadedChapter:deleteHistoryMove")]
    DeleteHistoryMove(HistoryIndex),
    #[serde(rename = "loadedChapter:drawCircle")]
    DrawCircle(CircleDraw),
    #[serde(rename = "loadedChapter:clearCircles")]
    ClearCircles,
    #[serde(rename = "loadedChapter:setArrows")]
    SetArrows(ArrowsMap),
    #[serde(rename = "loadedChapter:setOrientation")]
    SetOrientation(Side),
    #[serde(rename = "loadedChapter:updateFen")]
    UpdateFen(String),
}

impl Action {
    /// The wire `type` string, for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::StartActivity(_) => "activity:start",
            Action::StartWhitePlayerIdlingTimer { .. } => "play:startWhitePlayerIdlingTimer",
            Action::Move(_) => "play:move",
            Action::Timeout { .. } => "play:timeout",
            Action::ResignGame { .. } => "play:resignGame",
            Action::SendOffer(_) => "play:sendOffer",
            Action::AcceptOfferDraw => "play:acceptOfferDraw",
            Action::AcceptTakeBack => "play:acceptTakeBack",
            Action::DenyOffer => "play:denyOffer",
            Action::CancelOffer => "play:cancelOffer",
            Action::AbortGame => "play:abortGame",
            Action::StartNewGame => "match:startNewGame",
            Action::CreateChapter(_) => "createChapter",
            Action::UpdateChapter { .. } => "updateChapter",
            Action::DeleteChapter { .. } => "deleteChapter",
            Action::LoadChapter { .. } => "loadChapter",
            Action::AddMove(_) => "loadedChapter:addMove",
            Action::FocusHistoryIndex(_) => "loadedChapter:focusHistoryIndex",
            Action::DeleteHistoryMove(_) => "loadedChapter:deleteHistoryMove",
            Action::DrawCircle(_) => "loadedChapter:drawCircle",
            Action::ClearCircles => "loadedChapter:clearCircles",
            Action::SetArrows(_) => "loadedChapter:setArrows",
            Action::SetOrientation(_) => "loadedChapter:setOrientation",
            Action::UpdateFen(_) => "loadedChapter:updateFen",
        }
    }

    /// Timestamp carried by the payload, if any.
    pub fn timestamp(&self) -> Option<Millis> {
        match self {
            Action::StartWhitePlayerIdlingTimer { at } => Some(*at),
            Action::Move(payload) => Some(payload.move_at),
            Action::SendOffer(payload) => Some(payload.timestamp),
            _ => None,
        }
    }
}
