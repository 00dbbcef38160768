//! JSON-lines action logs: one `{ "type": ..., "payload": ... }` per line.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use room_state::Action;
use tracing::{info, warn};

use crate::error::ReplayError;

/// Parses every line of `reader` as an action. Blank lines are skipped;
/// lines that do not parse (unknown types, bad payloads) are logged and
/// skipped so one bad entry does not lose the rest of the room.
pub fn read_actions<R: BufRead>(reader: R) -> Result<Vec<Action>, std::io::Error> {
    let mut actions = Vec::new();
    let mut skipped = 0usize;

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Action>(line) {
            Ok(action) => actions.push(action),
            Err(e) => {
                skipped += 1;
                warn!(line = number + 1, error = %e, "Skipping unreadable action");
            }
        }
    }

    info!(actions = actions.len(), skipped, "Action log read");
    Ok(actions)
}

pub fn read_log_file(path: &Path) -> Result<Vec<Action>, ReplayError> {
    let io_err = |source| ReplayError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(io_err)?;
    read_actions(BufReader::new(file)).map_err(io_err)
}
