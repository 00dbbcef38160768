/// Integration tests for the play, offer and match reducers driven through
/// the room dispatcher, the way a room replays its action log.
mod common;

use common::{action, mv, reducer, replay, T0};
use room_state::{
    calculate_time_left_at, Action, ActivityState, GameState, GameStatus, MasterContext, MatchState,
    MatchStatus, OfferDenied, OfferType, PlayState, Players, SendOfferPayload, TimeClass, TimeLeft,
};
use chess_core::Side;

const START_MATCH: &str = r#"{"type":"activity:start","payload":{"activityType":"match","matchType":"bestOf","rounds":3,"timeClass":"blitz","players":{"white":"ana","black":"ben"}}}"#;
const START_PLAY: &str = r#"{"type":"activity:start","payload":{"activityType":"play","timeClass":"bullet","players":{"white":"ana","black":"ben"}}}"#;

fn expect_match(state: &ActivityState) -> &MatchState {
    match state {
        ActivityState::Match(state) => state,
        other => panic!("expected a match, got {}", other.kind()),
    }
}

fn expect_play(state: &ActivityState) -> &PlayState {
    match state {
        ActivityState::Play(state) => state,
        other => panic!("expected a play, got {}", other.kind()),
    }
}

/// White opens 1. e4 and `loser` resigns.
fn won_game(at: i64, loser: Side) -> Vec<Action> {
    vec![
        Action::StartWhitePlayerIdlingTimer { at },
        mv("e2", "e4", at + 1_000),
        Action::ResignGame { color: loser },
    ]
}

fn offer(by: &str, offer_type: OfferType, timestamp: i64) -> Action {
    Action::SendOffer(SendOfferPayload {
        by_player: by.to_string(),
        offer_type,
        timestamp,
    })
}

#[test]
fn test_best_of_three_decided_in_two_games() {
    let mut actions = vec![action(START_MATCH)];
    // Game 1: ana has white and wins.
    actions.extend(won_game(T0, Side::Black));
    actions.push(action(r#"{"type":"match:startNewGame"}"#));
    // Game 2: colors swapped, ana (now black) wins again.
    actions.extend(won_game(T0 + 60_000, Side::White));

    let state = replay(&actions);
    let state = expect_match(&state);
    assert_eq!(state.status, MatchStatus::Complete);
    assert_eq!(state.winner.as_deref(), Some("ana"));
    assert_eq!(state.ended_plays.len(), 2);
    assert_eq!(state.ended_plays[1].players, Players::new("ben", "ana"));
    assert_eq!(state.results().draws, 0);
}

#[test]
fn test_clock_projection_on_read() {
    let game = GameState {
        status: GameStatus::Ongoing,
        pgn: "1. e4".to_string(),
        last_move_by: Side::White,
        last_move_at: Some(T0),
        started_at: Some(T0 - 3_000),
        time_left: TimeLeft {
            white: 280_000,
            black: 60_000,
        },
        ..GameState::pending(TimeClass::Blitz, Side::White)
    };
    let projected = calculate_time_left_at(T0 + 5_000, &game);
    assert_eq!(projected.black, 55_000);
    assert_eq!(projected.white, 280_000);

    // Reading twice at the same instant gives the same answer.
    assert_eq!(projected, calculate_time_left_at(T0 + 5_000, &game));
    assert_eq!(game.time_left.black, 60_000);
}

#[test]
fn test_idle_first_game_aborts_match_on_read() {
    let state = replay(&[
        action(START_MATCH),
        action(&format!(r#"{{"type":"play:startWhitePlayerIdlingTimer","payload":{{"at":{T0}}}}}"#)),
    ]);
    assert_eq!(expect_match(&state).status, MatchStatus::Pending);

    let read = reducer().transform_state(&state, &MasterContext { request_at: T0 + 181_000 });
    let read = expect_match(&read);
    assert_eq!(read.status, MatchStatus::Aborted);
    assert_eq!(read.winner, None);
    assert!(read.ongoing_play.is_none());
}

#[test]
fn test_idle_later_game_completes_match_on_read() {
    let mut actions = vec![action(START_MATCH)];
    actions.extend(won_game(T0, Side::Black));
    actions.push(Action::StartNewGame);
    actions.push(Action::StartWhitePlayerIdlingTimer { at: T0 + 60_000 });
    let state = replay(&actions);

    let read = reducer().transform_state(&state, &MasterContext { request_at: T0 + 60_000 + 181_000 });
    let read = expect_match(&read);
    assert_eq!(read.status, MatchStatus::Complete);
    // Nobody moved, so black counts as the last mover and takes the match.
    assert_eq!(read.winner.as_deref(), Some("ana"));
}

#[test]
fn test_fifth_draw_offer_is_rejected() {
    let mut actions = vec![action(START_PLAY), mv("e2", "e4", T0), mv("e7", "e5", T0 + 1_000)];
    for i in 0..5 {
        actions.push(offer("ben", OfferType::Draw, T0 + 2_000 + i));
        actions.push(Action::DenyOffer);
    }
    let state = replay(&actions);
    let play = expect_play(&state);
    assert_eq!(play.offers.len(), 4);
    assert_eq!(
        room_state::check_offer(play, "ben", OfferType::Draw, false),
        Err(OfferDenied::LimitReached)
    );
}

#[test]
fn test_takeback_on_fresh_game_is_refused() {
    // Black is the nominal last mover of a fresh game, but with no move on
    // the board there is nothing to take back.
    let state = replay(&[action(START_PLAY), offer("ben", OfferType::Takeback, T0)]);
    let play = expect_play(&state);
    assert!(play.offers.is_empty());
    assert_eq!(
        room_state::check_offer(play, "ben", OfferType::Takeback, false),
        Err(OfferDenied::NoMovePlayed)
    );
}

#[test]
fn test_bullet_flag_falls_on_late_move() {
    let state = replay(&[
        action(START_PLAY),
        mv("e2", "e4", T0),
        mv("e7", "e5", T0 + 61_000),
    ]);
    let play = expect_play(&state);
    assert_eq!(play.game.status, GameStatus::Complete);
    assert_eq!(play.game.winner, Some(room_state::GameWinner::White));
    assert_eq!(play.game.pgn, "1. e4");
}

#[test]
fn test_play_state_round_trips_through_json() {
    let state = replay(&[action(START_PLAY), mv("e2", "e4", T0), offer("ana", OfferType::Takeback, T0 + 500)]);
    let json = serde_json::to_string(&state).unwrap();
    let back: ActivityState = serde_json::from_str(&json).unwrap();
    assert_eq!(back, state);
    assert_eq!(expect_play(&back).game.turn(), Side::Black);
}
