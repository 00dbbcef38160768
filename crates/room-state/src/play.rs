//! A game together with its seated players and offer log.

use serde::{Deserialize, Serialize};

use chess_core::{ChessRules, Side};

use crate::action::Action;
use crate::error::{log_rejection, Rejection};
use crate::game::{calculate_time_left_at, GameState, GameStatus, Millis};
use crate::offer::{check_offer, Offer, OfferDenied, OfferStatus, OfferType};

pub type PlayerId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Players {
    pub white: PlayerId,
    pub black: PlayerId,
}

impl Players {
    pub fn new(white: impl Into<PlayerId>, black: impl Into<PlayerId>) -> Self {
        Self {
            white: white.into(),
            black: black.into(),
        }
    }

    pub fn get(&self, side: Side) -> &PlayerId {
        match side {
            Side::White => &self.white,
            Side::Black => &self.black,
        }
    }

    pub fn color_of(&self, player: &str) -> Option<Side> {
        if self.white == player {
            Some(Side::White)
        } else if self.black == player {
            Some(Side::Black)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayState {
    pub game: GameState,
    #[serde(default)]
    pub offers: Vec<Offer>,
    pub players: Players,
}

impl PlayState {
    pub fn new(players: Players, game: GameState) -> Self {
        Self {
            game,
            offers: Vec::new(),
            players,
        }
    }

    pub fn color_of(&self, player: &str) -> Option<Side> {
        self.players.color_of(player)
    }

    pub fn last_offer(&self) -> Option<&Offer> {
        self.offers.last()
    }

    /// Settles the pending offer (always the last one) of the given type.
    fn settle_offer(
        &self,
        offer_type: Option<OfferType>,
        status: OfferStatus,
        verb: &'static str,
    ) -> Result<Vec<Offer>, Rejection> {
        let mut offers = self.offers.clone();
        match offers.last_mut() {
            Some(offer) if offer.is_pending() && offer_type.map_or(true, |t| t == offer.offer_type) => {
                offer.status = status;
                Ok(offers)
            }
            _ => Err(Rejection::NoPendingOffer(verb)),
        }
    }

    fn with_game(&self, game: GameState) -> PlayState {
        PlayState {
            game,
            ..self.clone()
        }
    }
}

pub(crate) fn apply_play_action<R: ChessRules>(
    rules: &R,
    prev: &PlayState,
    action: &Action,
) -> Result<PlayState, Rejection> {
    match action {
        Action::StartWhitePlayerIdlingTimer { at } => Ok(prev.with_game(prev.game.start(*at)?)),
        Action::Move(payload) => {
            let game = prev.game.apply_move(rules, &payload.request(), payload.move_at)?;
            let mut next = prev.with_game(game);
            for offer in next.offers.iter_mut().filter(|offer| offer.is_pending()) {
                offer.status = OfferStatus::Expired;
            }
            Ok(next)
        }
        Action::Timeout { color } => Ok(prev.with_game(prev.game.timeout(*color)?)),
        Action::ResignGame { color } => {
            if prev.last_offer().is_some_and(Offer::is_pending) {
                return Err(OfferDenied::OfferPending.into());
            }
            Ok(prev.with_game(prev.game.resign(*color)?))
        }
        Action::SendOffer(payload) => {
            check_offer(prev, &payload.by_player, payload.offer_type, false)?;
            let mut next = prev.clone();
            next.offers.push(Offer {
                offer_type: payload.offer_type,
                by_player: payload.by_player.clone(),
                status: OfferStatus::Pending,
                timestamp: payload.timestamp,
            });
            Ok(next)
        }
        Action::AcceptOfferDraw => {
            let offers = prev.settle_offer(Some(OfferType::Draw), OfferStatus::Accepted, "accept")?;
            Ok(PlayState {
                game: prev.game.accept_draw()?,
                offers,
                players: prev.players.clone(),
            })
        }
        Action::AcceptTakeBack => {
            let offers = prev.settle_offer(Some(OfferType::Takeback), OfferStatus::Accepted, "accept")?;
            Ok(PlayState {
                game: prev.game.take_back()?,
                offers,
                players: prev.players.clone(),
            })
        }
        Action::DenyOffer => Ok(PlayState {
            offers: prev.settle_offer(None, OfferStatus::Declined, "deny")?,
            ..prev.clone()
        }),
        Action::CancelOffer => Ok(PlayState {
            offers: prev.settle_offer(None, OfferStatus::Cancelled, "cancel")?,
            ..prev.clone()
        }),
        Action::AbortGame => Ok(prev.with_game(prev.game.abort()?)),
        _ => Err(Rejection::NotApplicable),
    }
}

/// Play reducer. Rejected actions are logged and leave the state as it was.
pub fn reduce_play<R: ChessRules>(rules: &R, prev: &PlayState, action: &Action) -> PlayState {
    match apply_play_action(rules, prev, action) {
        Ok(next) => next,
        Err(rejection) => {
            log_rejection(action, &rejection);
            prev.clone()
        }
    }
}

/// Read-time view of a play: running clocks projected to `now`.
pub fn transform_play(play: &PlayState, now: Millis) -> PlayState {
    if play.game.status != GameStatus::Ongoing {
        return play.clone();
    }
    let mut next = play.clone();
    next.game.time_left = calculate_time_left_at(now, &play.game);
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{MovePayload, SendOfferPayload};
    use crate::game::{GameWinner, TimeClass};
    use chess_core::ShakmatyRules;

    fn fresh() -> PlayState {
        PlayState::new(
            Players::new("alice", "bob"),
            GameState::pending(TimeClass::Blitz, Side::White),
        )
    }

    fn mv(from: &str, to: &str, at: Millis) -> Action {
        Action::Move(MovePayload {
            from: from.to_string(),
            to: to.to_string(),
            promote_to: None,
            move_at: at,
        })
    }

    fn offer(by: &str, offer_type: OfferType, at: Millis) -> Action {
        Action::SendOffer(SendOfferPayload {
            by_player: by.to_string(),
            offer_type,
            timestamp: at,
        })
    }

    fn run(play: PlayState, actions: &[Action]) -> PlayState {
        actions
            .iter()
            .fold(play, |play, action| reduce_play(&ShakmatyRules, &play, action))
    }

    fn opened() -> PlayState {
        run(
            fresh(),
            &[
                Action::StartWhitePlayerIdlingTimer { at: 0 },
                mv("e2", "e4", 1_000),
                mv("e7", "e5", 2_000),
            ],
        )
    }

    #[test]
    fn test_draw_offer_accepted() {
        let play = run(opened(), &[offer("bob", OfferType::Draw, 2_500), Action::AcceptOfferDraw]);
        assert_eq!(play.game.status, GameStatus::Complete);
        assert_eq!(play.game.winner, Some(GameWinner::Draw));
        assert_eq!(play.offers[0].status, OfferStatus::Accepted);
    }

    #[test]
    fn test_takeback_accepted() {
        let play = run(opened(), &[offer("bob", OfferType::Takeback, 2_500), Action::AcceptTakeBack]);
        assert_eq!(play.game.pgn, "1. e4");
        assert_eq!(play.game.last_move_by, Side::White);
        assert_eq!(play.offers[0].status, OfferStatus::Accepted);

        // Only one granted takeback per player.
        let again = run(play.clone(), &[mv("e7", "e6", 3_000), offer("bob", OfferType::Takeback, 3_100)]);
        assert_eq!(again.offers.len(), 1);
    }

    #[test]
    fn test_takeback_by_wrong_player_is_ignored() {
        let play = run(opened(), &[offer("alice", OfferType::Takeback, 2_500)]);
        assert!(play.offers.is_empty());
    }

    #[test]
    fn test_deny_and_cancel() {
        let denied = run(opened(), &[offer("bob", OfferType::Draw, 2_500), Action::DenyOffer]);
        assert_eq!(denied.offers[0].status, OfferStatus::Declined);

        let cancelled = run(opened(), &[offer("bob", OfferType::Draw, 2_500), Action::CancelOffer]);
        assert_eq!(cancelled.offers[0].status, OfferStatus::Cancelled);

        // Nothing pending: no-op.
        assert_eq!(run(denied.clone(), &[Action::DenyOffer]), denied);
    }

    #[test]
    fn test_accept_wrong_offer_type_is_ignored() {
        let play = run(opened(), &[offer("bob", OfferType::Draw, 2_500), Action::AcceptTakeBack]);
        assert_eq!(play.game.status, GameStatus::Ongoing);
        assert!(play.offers[0].is_pending());
    }

    #[test]
    fn test_move_expires_pending_offer() {
        let play = run(opened(), &[offer("bob", OfferType::Draw, 2_500), mv("g1", "f3", 3_000)]);
        assert_eq!(play.offers[0].status, OfferStatus::Expired);
    }

    #[test]
    fn test_resign_blocked_by_pending_offer() {
        let blocked = run(opened(), &[offer("bob", OfferType::Draw, 2_500), Action::ResignGame { color: Side::White }]);
        assert_eq!(blocked.game.status, GameStatus::Ongoing);

        let resigned = run(opened(), &[Action::ResignGame { color: Side::White }]);
        assert_eq!(resigned.game.winner, Some(GameWinner::Black));
    }

    #[test]
    fn test_fifth_offer_is_rejected() {
        let mut play = opened();
        for i in 0..4 {
            play = run(play, &[offer("bob", OfferType::Draw, 3_000 + i), Action::DenyOffer]);
        }
        assert_eq!(play.offers.len(), 4);
        let after = run(play.clone(), &[offer("bob", OfferType::Draw, 4_000)]);
        assert_eq!(after, play);
    }

    #[test]
    fn test_foreign_actions_are_ignored() {
        let play = opened();
        assert_eq!(reduce_play(&ShakmatyRules, &play, &Action::StartNewGame), play);
    }

    #[test]
    fn test_transform_projects_clock() {
        let play = opened();
        let projected = transform_play(&play, 7_000);
        assert_eq!(projected.game.time_left.white, play.game.time_left.white - 5_000);
        assert_eq!(projected.game.time_left.black, play.game.time_left.black);
    }
}
