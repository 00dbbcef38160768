//! Matches: a sequence of plays between the same two players, with scoring,
//! color swaps between games and the idle-abort rule.

use serde::{Deserialize, Serialize};
use tracing::info;

use chess_core::{ChessRules, Side};

use crate::action::Action;
use crate::error::{log_rejection, Rejection};
use crate::game::{GameState, GameStatus, GameWinner, Millis, TimeClass};
use crate::play::{apply_play_action, transform_play, PlayState, PlayerId, Players};

/// An idling game whose first move has not come in after this long is
/// aborted at read time.
pub const MATCH_TIME_TO_ABORT: Millis = 3 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchType {
    Single,
    BestOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Pending,
    Ongoing,
    Complete,
    Aborted,
}

impl MatchStatus {
    pub fn is_over(self) -> bool {
        matches!(self, MatchStatus::Complete | MatchStatus::Aborted)
    }

    fn as_str(self) -> &'static str {
        match self {
            MatchStatus::Pending => "pending",
            MatchStatus::Ongoing => "ongoing",
            MatchStatus::Complete => "complete",
            MatchStatus::Aborted => "aborted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPlayer {
    pub id: PlayerId,
    #[serde(default)]
    pub score: u32,
}

impl MatchPlayer {
    pub fn new(id: impl Into<PlayerId>) -> Self {
        Self { id: id.into(), score: 0 }
    }
}

/// Seats for the current (or next) game; swapped between games.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPlayers {
    pub white: MatchPlayer,
    pub black: MatchPlayer,
}

impl MatchPlayers {
    pub fn get(&self, side: Side) -> &MatchPlayer {
        match side {
            Side::White => &self.white,
            Side::Black => &self.black,
        }
    }

    fn get_mut(&mut self, side: Side) -> &mut MatchPlayer {
        match side {
            Side::White => &mut self.white,
            Side::Black => &mut self.black,
        }
    }

    fn swapped(&self) -> MatchPlayers {
        MatchPlayers {
            white: self.black.clone(),
            black: self.white.clone(),
        }
    }

    fn seats(&self) -> Players {
        Players::new(self.white.id.clone(), self.black.id.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MatchResults {
    pub white: u32,
    pub black: u32,
    pub draws: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchState {
    #[serde(rename = "type")]
    pub match_type: MatchType,
    pub rounds: u32,
    pub time_class: TimeClass,
    pub players: MatchPlayers,
    #[serde(default)]
    pub ongoing_play: Option<PlayState>,
    #[serde(default)]
    pub ended_plays: Vec<PlayState>,
    pub status: MatchStatus,
    #[serde(default)]
    pub winner: Option<PlayerId>,
}

impl MatchState {
    /// A fresh match with its first game waiting for white.
    pub fn new(match_type: MatchType, rounds: u32, time_class: TimeClass, players: Players) -> Self {
        let players = MatchPlayers {
            white: MatchPlayer::new(players.white),
            black: MatchPlayer::new(players.black),
        };
        let first = PlayState::new(players.seats(), GameState::pending(time_class, Side::White));
        Self {
            match_type,
            rounds: rounds.max(1),
            time_class,
            players,
            ongoing_play: Some(first),
            ended_plays: Vec::new(),
            status: MatchStatus::Pending,
            winner: None,
        }
    }

    /// One-based number of the game being (or about to be) played.
    pub fn current_round(&self) -> usize {
        (self.ended_plays.len() + usize::from(self.ongoing_play.is_some())).max(1)
    }

    pub fn draws(&self) -> u32 {
        let draws = self
            .ended_plays
            .iter()
            .filter(|play| play.game.winner == Some(GameWinner::Draw))
            .count();
        u32::try_from(draws).unwrap_or(u32::MAX)
    }

    pub fn results(&self) -> MatchResults {
        MatchResults {
            white: self.players.white.score,
            black: self.players.black.score,
            draws: self.draws(),
        }
    }

    /// Score a side needs to take a best-of match.
    pub fn winning_score(&self) -> u32 {
        self.rounds.max(1).div_ceil(2)
    }

    fn start_new_game(&self) -> Result<MatchState, Rejection> {
        if self.status.is_over() {
            return Err(Rejection::MatchOver(self.status.as_str()));
        }
        if self.ongoing_play.as_ref().is_some_and(|play| !play.game.status.is_over()) {
            return Err(Rejection::PlayInProgress);
        }

        let previous = self.ongoing_play.as_ref().or(self.ended_plays.last());
        let (players, orientation, time_class) = match previous {
            Some(play) => (
                self.players.swapped(),
                play.game.orientation.swap(),
                play.game.time_class,
            ),
            None => (self.players.clone(), Side::White, self.time_class),
        };

        let mut ended_plays = self.ended_plays.clone();
        ended_plays.extend(self.ongoing_play.clone());
        let play = PlayState::new(players.seats(), GameState::pending(time_class, orientation));

        Ok(MatchState {
            players,
            ongoing_play: Some(play),
            ended_plays,
            ..self.clone()
        })
    }

    /// Folds the ongoing play's new state into the match.
    fn settle(&self, play: PlayState) -> MatchState {
        let mut next = self.clone();

        match play.game.status {
            GameStatus::Aborted => {
                if self.ended_plays.is_empty() {
                    next.status = MatchStatus::Aborted;
                    next.winner = None;
                } else {
                    next.status = MatchStatus::Complete;
                    next.winner = Some(self.players.get(play.game.last_move_by).id.clone());
                }
                info!(status = next.status.as_str(), winner = ?next.winner, "match game aborted");
                next.ended_plays.push(play);
                next.ongoing_play = None;
            }
            GameStatus::Complete => {
                match play.game.winner {
                    Some(GameWinner::White) => next.players.get_mut(Side::White).score += 1,
                    Some(GameWinner::Black) => next.players.get_mut(Side::Black).score += 1,
                    Some(GameWinner::Draw) | None => {}
                }
                // Single matches have no target score; they stay ongoing.
                next.winner = match self.match_type {
                    MatchType::BestOf => [&next.players.white, &next.players.black]
                        .into_iter()
                        .find(|player| player.score >= self.winning_score())
                        .map(|player| player.id.clone()),
                    MatchType::Single => None,
                };
                next.status = if next.winner.is_some() {
                    MatchStatus::Complete
                } else {
                    MatchStatus::Ongoing
                };
                info!(
                    white = next.players.white.score,
                    black = next.players.black.score,
                    winner = ?next.winner,
                    "match game complete"
                );
                next.ended_plays.push(play);
                next.ongoing_play = None;
            }
            status => {
                next.status = if status == GameStatus::Ongoing || !self.ended_plays.is_empty() {
                    MatchStatus::Ongoing
                } else {
                    MatchStatus::Pending
                };
                next.ongoing_play = Some(play);
            }
        }
        next
    }
}

fn apply_match_action<R: ChessRules>(rules: &R, prev: &MatchState, action: &Action) -> Result<MatchState, Rejection> {
    if let Action::StartNewGame = action {
        return prev.start_new_game();
    }
    let play = prev.ongoing_play.as_ref().ok_or(Rejection::NoOngoingPlay)?;
    let next_play = apply_play_action(rules, play, action)?;
    Ok(prev.settle(next_play))
}

/// Match reducer. Rejected actions are logged and leave the state as it was.
pub fn reduce_match<R: ChessRules>(rules: &R, prev: &MatchState, action: &Action) -> MatchState {
    match apply_match_action(rules, prev, action) {
        Ok(next) => next,
        Err(rejection) => {
            log_rejection(action, &rejection);
            prev.clone()
        }
    }
}

/// Read-time view of a match at `now`: running clocks are projected and a
/// game left idling past [`MATCH_TIME_TO_ABORT`] is treated as aborted.
pub fn transform_match(state: &MatchState, now: Millis) -> MatchState {
    if state.status.is_over() {
        return state.clone();
    }
    let Some(play) = &state.ongoing_play else {
        return state.clone();
    };

    match play.game.status {
        GameStatus::Ongoing => MatchState {
            ongoing_play: Some(transform_play(play, now)),
            ..state.clone()
        },
        GameStatus::Idling
            if play
                .game
                .started_at
                .is_some_and(|started_at| now > started_at + MATCH_TIME_TO_ABORT) =>
        {
            let aborted = PlayState {
                game: GameState {
                    status: GameStatus::Aborted,
                    ..play.game.clone()
                },
                ..play.clone()
            };
            state.settle(aborted)
        }
        _ => state.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::MovePayload;
    use chess_core::ShakmatyRules;

    const T0: Millis = 1_700_000_000_000;

    fn best_of(rounds: u32) -> MatchState {
        MatchState::new(MatchType::BestOf, rounds, TimeClass::Blitz, Players::new("alice", "bob"))
    }

    fn run(state: MatchState, actions: &[Action]) -> MatchState {
        actions
            .iter()
            .fold(state, |state, action| reduce_match(&ShakmatyRules, &state, action))
    }

    /// Opens with 1. e4 and has `loser` resign.
    fn decisive_game(at: Millis, loser: Side) -> Vec<Action> {
        vec![
            Action::StartWhitePlayerIdlingTimer { at },
            Action::Move(MovePayload {
                from: "e2".to_string(),
                to: "e4".to_string(),
                promote_to: None,
                move_at: at + 1_000,
            }),
            Action::ResignGame { color: loser },
        ]
    }

    #[test]
    fn test_new_match_is_pending_with_first_game() {
        let state = best_of(3);
        assert_eq!(state.status, MatchStatus::Pending);
        let play = state.ongoing_play.as_ref().unwrap();
        assert_eq!(play.players, Players::new("alice", "bob"));
        assert_eq!(play.game.orientation, Side::White);
        assert_eq!(state.current_round(), 1);
    }

    #[test]
    fn test_first_move_makes_match_ongoing() {
        let state = run(best_of(3), &decisive_game(T0, Side::Black)[..2]);
        assert_eq!(state.status, MatchStatus::Ongoing);
    }

    #[test]
    fn test_best_of_three_ends_after_two_wins() {
        let state = run(best_of(3), &decisive_game(T0, Side::Black));
        assert_eq!(state.status, MatchStatus::Ongoing);
        assert_eq!(state.players.white.score, 1);
        assert!(state.ongoing_play.is_none());

        let state = run(state, &[Action::StartNewGame]);
        // Colors swap: alice now has black.
        assert_eq!(state.players.white.id, "bob");
        assert_eq!(state.players.black.score, 1);
        assert_eq!(state.ongoing_play.as_ref().unwrap().game.orientation, Side::Black);
        assert_eq!(state.current_round(), 2);

        let state = run(state, &decisive_game(T0 + 60_000, Side::White));
        assert_eq!(state.status, MatchStatus::Complete);
        assert_eq!(state.winner.as_deref(), Some("alice"));
        assert_eq!(state.ended_plays.len(), 2);

        // Nothing more to play.
        assert_eq!(run(state.clone(), &[Action::StartNewGame]), state);
    }

    #[test]
    fn test_single_match_never_picks_a_winner() {
        let state = MatchState::new(MatchType::Single, 1, TimeClass::Rapid, Players::new("alice", "bob"));
        let state = run(state, &decisive_game(T0, Side::Black));
        assert_eq!(state.status, MatchStatus::Ongoing);
        assert_eq!(state.winner, None);
        assert_eq!(state.results(), MatchResults { white: 1, black: 0, draws: 0 });
    }

    #[test]
    fn test_zero_rounds_plays_one_game() {
        let state = best_of(0);
        assert_eq!(state.rounds, 1);

        // The winner is whoever actually won, not the first seat.
        let state = run(state, &decisive_game(T0, Side::White));
        assert_eq!(state.status, MatchStatus::Complete);
        assert_eq!(state.winner.as_deref(), Some("bob"));

        let stored = MatchState { rounds: 0, ..best_of(3) };
        assert_eq!(stored.winning_score(), 1);
    }

    #[test]
    fn test_new_game_refused_while_playing() {
        let state = run(best_of(3), &decisive_game(T0, Side::Black)[..2]);
        assert_eq!(run(state.clone(), &[Action::StartNewGame]), state);
    }

    #[test]
    fn test_first_game_abort_aborts_match() {
        let state = run(best_of(3), &[Action::AbortGame]);
        assert_eq!(state.status, MatchStatus::Aborted);
        assert_eq!(state.winner, None);
        assert_eq!(state.ended_plays.len(), 1);
    }

    #[test]
    fn test_later_abort_completes_match() {
        let state = run(best_of(5), &decisive_game(T0, Side::Black));
        let state = run(state, &[Action::StartNewGame, Action::AbortGame]);
        assert_eq!(state.status, MatchStatus::Complete);
        // Fresh games count black as the last mover.
        assert_eq!(state.winner.as_deref(), Some("alice"));
    }

    #[test]
    fn test_idle_first_game_aborts_on_read() {
        let state = run(best_of(3), &[Action::StartWhitePlayerIdlingTimer { at: T0 }]);
        assert_eq!(state.status, MatchStatus::Pending);

        assert_eq!(transform_match(&state, T0 + MATCH_TIME_TO_ABORT), state);

        let read = transform_match(&state, T0 + 181_000);
        assert_eq!(read.status, MatchStatus::Aborted);
        assert_eq!(read.winner, None);
        assert_eq!(read.ended_plays[0].game.status, GameStatus::Aborted);
        assert_eq!(transform_match(&read, T0 + 500_000), read);
    }

    #[test]
    fn test_transform_projects_running_clock() {
        let state = run(
            best_of(3),
            &[
                Action::StartWhitePlayerIdlingTimer { at: T0 },
                Action::Move(MovePayload {
                    from: "e2".to_string(),
                    to: "e4".to_string(),
                    promote_to: None,
                    move_at: T0 + 1_000,
                }),
            ],
        );
        let read = transform_match(&state, T0 + 6_000);
        let time_left = read.ongoing_play.unwrap().game.time_left;
        assert_eq!(time_left.black, 300_000 - 5_000);
        assert_eq!(time_left.white, 300_000);
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_value(best_of(3)).unwrap();
        assert_eq!(json["type"], "bestOf");
        assert_eq!(json["players"]["white"]["id"], "alice");
        assert_eq!(json["ongoingPlay"]["game"]["status"], "pending");
        assert!(json["winner"].is_null());
    }
}
