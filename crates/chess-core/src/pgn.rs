//! PGN utilities: a lightweight regex-based movetext reader and writer.
//!
//! Games are stored as PGN text. Only the SAN tokens matter here; comments,
//! variations, move numbers and results are dropped on read and regenerated
//! on write. Header tags are kept as-is.

use regex::Regex;

use crate::error::PgnError;

const HEADER_PATTERN: &str = r#"\[(\w+)\s+"([^"]*)"\]"#;
const SAN_PATTERN: &str = r"[KQRBN]?[a-h]?[1-8]?x?[a-h][1-8](?:=[QRBN])?[+#]?|O-O-O[+#]?|O-O[+#]?";

/// Extract SAN moves from PGN text (after removing headers, comments, variations).
pub fn extract_moves(pgn: &str) -> Result<Vec<String>, PgnError> {
    let header_re = Regex::new(r"\[[^\]]*\]")?;
    let no_headers = header_re.replace_all(pgn, "");

    let comment_re = Regex::new(r"\{[^}]*\}")?;
    let no_comments = comment_re.replace_all(&no_headers, "");

    let variation_re = Regex::new(r"\([^)]*\)")?;
    let no_variations = variation_re.replace_all(&no_comments, "");

    let move_re = Regex::new(SAN_PATTERN)?;

    Ok(move_re
        .find_iter(&no_variations)
        .map(|m| m.as_str().to_string())
        .collect())
}

/// Extract a string value from a PGN header (e.g. FEN, SetUp).
pub fn extract_header(pgn: &str, header_name: &str) -> Option<String> {
    let pattern = format!(r#"\[{}\s+"([^"]*)"\]"#, regex::escape(header_name));
    let re = Regex::new(&pattern).ok()?;
    let value = re.captures(pgn)?.get(1)?.as_str().to_string();
    if value.is_empty() { None } else { Some(value) }
}

/// The FEN the game starts from, when the PGN declares a custom setup.
pub fn starting_fen(pgn: &str) -> Option<String> {
    let fen = extract_header(pgn, "FEN")?;
    match extract_header(pgn, "SetUp").as_deref() {
        Some("0") => None,
        _ => Some(fen),
    }
}

/// Numbered movetext: `1. e4 e5 2. Nf3`. A first move by black (custom
/// setups) is rendered as `1... e5`.
pub fn render_movetext(moves: &[String], black_first: bool) -> String {
    let mut out = Vec::with_capacity(moves.len() + moves.len() / 2 + 1);
    let offset = usize::from(black_first);

    for (ply, san) in moves.iter().enumerate() {
        let slot = ply + offset;
        let number = slot / 2 + 1;
        if slot % 2 == 0 {
            out.push(format!("{}.", number));
        } else if ply == 0 {
            out.push(format!("{}...", number));
        }
        out.push(san.clone());
    }

    out.join(" ")
}

fn header_block(pgn: &str) -> Result<String, PgnError> {
    let header_re = Regex::new(HEADER_PATTERN)?;
    Ok(header_re
        .find_iter(pgn)
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join("\n"))
}

fn black_starts(pgn: &str) -> bool {
    starting_fen(pgn)
        .and_then(|fen| fen.split_whitespace().nth(1).map(|turn| turn == "b"))
        .unwrap_or(false)
}

fn rebuild(pgn: &str, moves: &[String]) -> Result<String, PgnError> {
    let headers = header_block(pgn)?;
    let movetext = render_movetext(moves, black_starts(pgn));
    Ok(match (headers.is_empty(), movetext.is_empty()) {
        (true, _) => movetext,
        (false, true) => headers,
        (false, false) => format!("{}\n\n{}", headers, movetext),
    })
}

/// Appends a SAN move to the game's PGN.
pub fn push_san(pgn: &str, san: &str) -> Result<String, PgnError> {
    let mut moves = extract_moves(pgn)?;
    moves.push(san.to_string());
    rebuild(pgn, &moves)
}

/// Removes the last move from the game's PGN.
pub fn pop_san(pgn: &str) -> Result<String, PgnError> {
    let mut moves = extract_moves(pgn)?;
    moves.pop().ok_or(PgnError::Empty)?;
    rebuild(pgn, &moves)
}
