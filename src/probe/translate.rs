use serde::Serialize;
use serde_json::json;
use serde_json::Value;

use crate::chess::Board;
use crate::chess::Color;
use crate::chess::Mv;
use crate::proto::Bound;
use crate::proto::HashProbeMove;

use super::Line;
use super::MergedProbe;
use super::Score;

/// Sort key for moves the table had no answer for; sorts below any
/// real evaluation.
const NOT_FOUND_SORT_KEY: i64 = -100_000_000;

/// One probe line in presentation form: decoded move text, decoded PV
/// and a numeric key the client can sort on directly.
#[derive(Debug, Serialize, PartialEq)]
pub struct RenderedLine {
    pub pretty_move: String,
    pub sort_key: String,
    pub pv_pretty: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
    /// `["cp", v]` or `["m", v]`, with a trailing `"≤"`/`"≥"` marker
    /// when the score is only a bound; `null` when unknown
    pub score: Option<Value>,
    pub score_sort_key: i64,
}

/// Renders a merged probe for the wire: `{root: ..., lines: {uci: ...}}`.
pub fn render(position: &Board, merged: &MergedProbe) -> Value {
    let lines: serde_json::Map<String, Value> = merged
        .lines
        .iter()
        .map(|(uci, line)| (uci.clone(), json!(translate_line(position, line))))
        .collect();
    json!({
        "root": translate_line(position, &merged.root),
        "lines": lines,
    })
}

/// Decodes one line against the probed position.
///
/// The PV is replayed move by move on a scratch board; the first move
/// that does not decode truncates the PV there, it never fails the
/// line. Score keys are flipped for Black so that higher is always
/// better for the side to move.
pub fn translate_line(position: &Board, line: &Line) -> RenderedLine {
    let mut board = position.clone();
    let invert = board.turn == Color::Black;

    let mv = match line {
        Line::Found { mv, .. } => mv.as_ref(),
        Line::NotFound { mv } => mv.as_ref(),
    };
    let pretty_move = mv.and_then(|m| decode(&mut board, m)).unwrap_or_default();

    let Line::Found {
        depth,
        bound,
        score,
        pv,
        ..
    } = line
    else {
        return RenderedLine {
            sort_key: pretty_move.clone(),
            pretty_move,
            pv_pretty: Vec::new(),
            depth: None,
            score: None,
            score_sort_key: NOT_FOUND_SORT_KEY,
        };
    };

    let mut pv_pretty = Vec::with_capacity(pv.len() + 1);
    if !pretty_move.is_empty() {
        pv_pretty.push(pretty_move.clone());
    }
    for wire_move in pv {
        match decode(&mut board, wire_move) {
            Some(san) => pv_pretty.push(san),
            None => break,
        }
    }

    let score_json = score.as_ref().map(|s| {
        let mut parts: Vec<Value> = match s {
            Score::Cp(v) => vec![json!("cp"), json!(v)],
            Score::Mate(m) => vec![json!("m"), json!(m)],
        };
        match bound {
            Bound::BoundUpper => parts.push(json!("≤")),
            Bound::BoundLower => parts.push(json!("≥")),
            _ => {}
        }
        Value::Array(parts)
    });

    RenderedLine {
        sort_key: pretty_move.clone(),
        pretty_move,
        pv_pretty,
        depth: Some(*depth),
        score: score_json,
        score_sort_key: score_key(score.as_ref(), invert) * 200 + i64::from(*depth),
    }
}

fn decode(board: &mut Board, wire_move: &HashProbeMove) -> Option<String> {
    Mv::from_parts(&wire_move.from_sq, &wire_move.to_sq, &wire_move.promotion)
        .and_then(|mv| board.san_move(mv))
}

/// Mate scores dominate centipawn scores; shorter mates rank higher.
fn score_key(score: Option<&Score>, invert: bool) -> i64 {
    let key = match score {
        Some(Score::Mate(mate)) => {
            if *mate > 0 {
                // Side to move mates
                99_999 - i64::from(*mate)
            } else {
                // Side to move is getting mated (double negative)
                -99_999 - i64::from(*mate)
            }
        }
        Some(Score::Cp(v)) => i64::from(*v),
        None => return 0,
    };
    if invert {
        -key
    } else {
        key
    }
}
