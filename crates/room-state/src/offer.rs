//! Draw and takeback offers, and the rules deciding when a player may send one.

use serde::{Deserialize, Serialize};

use chess_core::Side;

use crate::game::{GameStatus, Millis};
use crate::play::{PlayState, PlayerId};

/// Per player, per offer type.
pub const MAX_OFFERS_PER_TYPE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferType {
    Draw,
    Takeback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Declined,
    Expired,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    #[serde(rename = "type")]
    pub offer_type: OfferType,
    pub by_player: PlayerId,
    pub status: OfferStatus,
    pub timestamp: Millis,
}

impl Offer {
    pub fn is_pending(&self) -> bool {
        self.status == OfferStatus::Pending
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OfferDenied {
    #[error("player is not seated in this game")]
    UnknownPlayer,
    #[error("only the player who just moved can ask for a takeback")]
    NotYourLastMove,
    #[error("no move has been played yet")]
    NoMovePlayed,
    #[error("the game is not ongoing")]
    GameNotOngoing,
    #[error("another offer is pending")]
    OfferPending,
    #[error("an offer was already sent this turn")]
    AlreadySent,
    #[error("a takeback was already granted to this player")]
    TakebackAlreadyAccepted,
    #[error("offer limit reached for this type")]
    LimitReached,
}

/// Whether `player` may send an offer of `offer_type` right now.
///
/// Checks run in a fixed order so the first failing rule is the one reported.
/// `already_sent` is the client-side flag kept by [`LocalOfferTracker`]; the
/// reducer passes `false`.
pub fn check_offer(
    play: &PlayState,
    player: &str,
    offer_type: OfferType,
    already_sent: bool,
) -> Result<(), OfferDenied> {
    let color = play.color_of(player).ok_or(OfferDenied::UnknownPlayer)?;
    let game = &play.game;
    let pending = play.last_offer().is_some_and(Offer::is_pending);

    if offer_type == OfferType::Takeback {
        if game.last_move_by != color {
            return Err(OfferDenied::NotYourLastMove);
        }
        if game.last_move_at.is_none() {
            return Err(OfferDenied::NoMovePlayed);
        }
    }
    if game.status != GameStatus::Ongoing {
        return Err(OfferDenied::GameNotOngoing);
    }
    if pending {
        return Err(OfferDenied::OfferPending);
    }
    if already_sent {
        return Err(OfferDenied::AlreadySent);
    }

    let mine = || play.offers.iter().filter(move |offer| offer.by_player == player);

    if offer_type == OfferType::Takeback
        && mine().any(|offer| offer.offer_type == OfferType::Takeback && offer.status == OfferStatus::Accepted)
    {
        return Err(OfferDenied::TakebackAlreadyAccepted);
    }
    if mine().filter(|offer| offer.offer_type == offer_type).count() >= MAX_OFFERS_PER_TYPE {
        return Err(OfferDenied::LimitReached);
    }
    Ok(())
}

/// Resigning needs an ongoing game and no offer waiting for an answer.
pub fn can_resign(play: &PlayState) -> bool {
    play.game.status == GameStatus::Ongoing && !play.last_offer().is_some_and(Offer::is_pending)
}

/// Client-side "offer already sent" flag. Set when this client sends an
/// offer, cleared whenever the last mover changes.
#[derive(Debug, Clone, Default)]
pub struct LocalOfferTracker {
    sent: bool,
    last_move_by: Option<Side>,
}

impl LocalOfferTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed every state snapshot the client receives.
    pub fn observe(&mut self, play: &PlayState) {
        let last_move_by = Some(play.game.last_move_by);
        if self.last_move_by != last_move_by {
            self.sent = false;
            self.last_move_by = last_move_by;
        }
    }

    pub fn mark_sent(&mut self) {
        self.sent = true;
    }

    pub fn already_sent(&self) -> bool {
        self.sent
    }

    pub fn check(&self, play: &PlayState, player: &str, offer_type: OfferType) -> Result<(), OfferDenied> {
        check_offer(play, player, offer_type, self.sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameState, TimeClass};
    use crate::play::Players;

    fn ongoing(last_move_by: Side) -> PlayState {
        let mut game = GameState::pending(TimeClass::Blitz, Side::White);
        game.status = GameStatus::Ongoing;
        game.pgn = "1. e4".to_string();
        game.last_move_by = last_move_by;
        game.last_move_at = Some(1_000);
        game.started_at = Some(0);
        PlayState::new(Players::new("alice", "bob"), game)
    }

    fn offer(by: &str, offer_type: OfferType, status: OfferStatus) -> Offer {
        Offer {
            offer_type,
            by_player: by.to_string(),
            status,
            timestamp: 0,
        }
    }

    #[test]
    fn test_draw_allowed_in_ongoing_game() {
        let play = ongoing(Side::White);
        assert_eq!(check_offer(&play, "bob", OfferType::Draw, false), Ok(()));
        assert_eq!(check_offer(&play, "carol", OfferType::Draw, false), Err(OfferDenied::UnknownPlayer));
    }

    #[test]
    fn test_takeback_only_for_own_last_move() {
        let play = ongoing(Side::White);
        assert_eq!(check_offer(&play, "alice", OfferType::Takeback, false), Ok(()));
        assert_eq!(
            check_offer(&play, "bob", OfferType::Takeback, false),
            Err(OfferDenied::NotYourLastMove)
        );
    }

    #[test]
    fn test_takeback_needs_a_move() {
        // Fresh game: black counts as the last mover but nothing was played.
        let play = PlayState::new(
            Players::new("alice", "bob"),
            GameState::pending(TimeClass::Blitz, Side::White),
        );
        assert_eq!(
            check_offer(&play, "bob", OfferType::Takeback, false),
            Err(OfferDenied::NoMovePlayed)
        );
    }

    #[test]
    fn test_pending_offer_blocks_everything() {
        let mut play = ongoing(Side::White);
        play.offers.push(offer("alice", OfferType::Draw, OfferStatus::Pending));
        assert_eq!(check_offer(&play, "bob", OfferType::Draw, false), Err(OfferDenied::OfferPending));
        assert!(!can_resign(&play));
    }

    #[test]
    fn test_limit_per_type() {
        let mut play = ongoing(Side::White);
        for _ in 0..MAX_OFFERS_PER_TYPE {
            play.offers.push(offer("alice", OfferType::Draw, OfferStatus::Declined));
        }
        assert_eq!(check_offer(&play, "alice", OfferType::Draw, false), Err(OfferDenied::LimitReached));
        assert_eq!(check_offer(&play, "bob", OfferType::Draw, false), Ok(()));
        assert_eq!(check_offer(&play, "alice", OfferType::Takeback, false), Ok(()));
    }

    #[test]
    fn test_one_granted_takeback() {
        let mut play = ongoing(Side::White);
        play.offers.push(offer("alice", OfferType::Takeback, OfferStatus::Accepted));
        assert_eq!(
            check_offer(&play, "alice", OfferType::Takeback, false),
            Err(OfferDenied::TakebackAlreadyAccepted)
        );
    }

    #[test]
    fn test_local_tracker_resets_on_move() {
        let mut tracker = LocalOfferTracker::new();
        let play = ongoing(Side::White);
        tracker.observe(&play);
        tracker.mark_sent();
        assert_eq!(tracker.check(&play, "bob", OfferType::Draw), Err(OfferDenied::AlreadySent));

        tracker.observe(&play);
        assert!(tracker.already_sent());

        tracker.observe(&ongoing(Side::Black));
        assert!(!tracker.already_sent());
        assert_eq!(tracker.check(&ongoing(Side::Black), "bob", OfferType::Draw), Ok(()));
    }
}
