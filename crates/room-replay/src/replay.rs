//! Folds an action log into room state and takes a timed read of it.

use serde::Serialize;
use tracing::info;

use chess_core::ChessRules;
use room_state::{Action, ActivityState, MasterContext, Millis, RoomReducer};

use crate::config::ReplayConfig;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    pub actions: usize,
    /// Read time used for `view`, if one could be determined.
    pub read_at: Option<Millis>,
    /// Stored state after the last action.
    pub state: ActivityState,
    /// `state` as a reader at `read_at` sees it.
    pub view: ActivityState,
}

/// Latest timestamp carried by any action in the log.
pub fn last_timestamp(actions: &[Action]) -> Option<Millis> {
    actions.iter().filter_map(Action::timestamp).max()
}

pub fn replay<R: ChessRules>(reducer: &RoomReducer<R>, config: &ReplayConfig, actions: &[Action]) -> ReplayReport {
    let state = reducer.replay(config.initial_activity.create(), actions);
    let read_at = config.now.or_else(|| last_timestamp(actions));

    let view = match read_at {
        Some(request_at) => reducer.transform_state(&state, &MasterContext { request_at }),
        None => state.clone(),
    };

    info!(
        actions = actions.len(),
        activity = state.kind(),
        read_at = ?read_at,
        "Replay finished"
    );

    ReplayReport {
        actions: actions.len(),
        read_at,
        state,
        view,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::read_actions;
    use room_state::{ActivityConfig, MatchStatus};
    use std::path::PathBuf;

    const MATCH_LOG: &str = r#"
{"type":"activity:start","payload":{"activityType":"match","matchType":"bestOf","rounds":3,"timeClass":"blitz","players":{"white":"ana","black":"ben"}}}
{"type":"play:startWhitePlayerIdlingTimer","payload":{"at":1000}}
"#;

    fn config(now: Option<Millis>) -> ReplayConfig {
        ReplayConfig {
            log_path: PathBuf::from("room.jsonl"),
            now,
            initial_activity: ActivityConfig::None,
            pretty: false,
        }
    }

    fn match_status(state: &ActivityState) -> MatchStatus {
        match state {
            ActivityState::Match(state) => state.status,
            other => panic!("expected a match, got {}", other.kind()),
        }
    }

    #[test]
    fn test_defaults_to_last_action_time() {
        let actions = read_actions(MATCH_LOG.as_bytes()).unwrap();
        let report = replay(&RoomReducer::default(), &config(None), &actions);
        assert_eq!(report.read_at, Some(1000));
        assert_eq!(match_status(&report.view), MatchStatus::Pending);
    }

    #[test]
    fn test_late_read_aborts_idle_match() {
        let actions = read_actions(MATCH_LOG.as_bytes()).unwrap();
        let report = replay(&RoomReducer::default(), &config(Some(1000 + 181_000)), &actions);
        assert_eq!(match_status(&report.state), MatchStatus::Pending);
        assert_eq!(match_status(&report.view), MatchStatus::Aborted);
    }

    #[test]
    fn test_empty_log() {
        let report = replay(&RoomReducer::default(), &config(None), &[]);
        assert_eq!(report.read_at, None);
        assert_eq!(report.view, ActivityState::None);
    }
}
