use serde_json::json;

use crate::chess::Board;
use crate::chess::START_FEN;
use crate::proto::Bound;
use crate::proto::HashProbeMove;

use super::*;

fn wire_move(from: &str, to: &str) -> HashProbeMove {
    HashProbeMove {
        from_sq: from.to_string(),
        to_sq: to.to_string(),
        promotion: String::new(),
    }
}

fn found(
    mv: Option<HashProbeMove>,
    depth: u32,
    bound: Bound,
    score: Score,
    pv: Vec<HashProbeMove>,
) -> Line {
    Line::Found {
        mv,
        depth,
        bound,
        score: Some(score),
        pv,
    }
}

#[test]
fn decodes_move_and_pv_to_standard_notation() {
    let board = Board::start();
    let line = found(
        Some(wire_move("e2", "e4")),
        20,
        Bound::BoundExact,
        Score::Cp(34),
        vec![wire_move("e7", "e5"), wire_move("g1", "f3")],
    );
    let rendered = translate_line(&board, &line);
    assert_eq!(rendered.pretty_move, "e4");
    assert_eq!(rendered.sort_key, "e4");
    assert_eq!(rendered.pv_pretty, vec!["e4", "e5", "Nf3"]);
    assert_eq!(rendered.depth, Some(20));
    assert_eq!(rendered.score, Some(json!(["cp", 34])));
    assert_eq!(rendered.score_sort_key, 34 * 200 + 20);
}

#[test]
fn truncates_the_pv_at_the_first_undecodable_move() {
    let board = Board::start();
    let line = found(
        Some(wire_move("e2", "e4")),
        20,
        Bound::BoundExact,
        Score::Cp(0),
        vec![
            wire_move("e7", "e5"),
            wire_move("a1", "a5"), // rook jump through its own pawn
            wire_move("g8", "f6"),
        ],
    );
    let rendered = translate_line(&board, &line);
    assert_eq!(rendered.pv_pretty, vec!["e4", "e5"]);
}

#[test]
fn bound_markers_ride_along_with_the_score() {
    let board = Board::start();
    let upper = found(None, 10, Bound::BoundUpper, Score::Cp(12), Vec::new());
    assert_eq!(
        translate_line(&board, &upper).score,
        Some(json!(["cp", 12, "≤"]))
    );
    let lower = found(None, 10, Bound::BoundLower, Score::Cp(12), Vec::new());
    assert_eq!(
        translate_line(&board, &lower).score,
        Some(json!(["cp", 12, "≥"]))
    );
}

#[test]
fn mate_scores_dominate_centipawn_scores() {
    let board = Board::start();
    let mate = found(None, 10, Bound::BoundExact, Score::Mate(3), Vec::new());
    let rendered = translate_line(&board, &mate);
    assert_eq!(rendered.score, Some(json!(["m", 3])));
    assert_eq!(rendered.score_sort_key, (99_999 - 3) * 200 + 10);

    let crushing_cp = found(None, 30, Bound::BoundExact, Score::Cp(9_999), Vec::new());
    assert!(rendered.score_sort_key > translate_line(&board, &crushing_cp).score_sort_key);

    let mated = found(None, 10, Bound::BoundExact, Score::Mate(-2), Vec::new());
    assert_eq!(
        translate_line(&board, &mated).score_sort_key,
        (-99_999 + 2) * 200 + 10
    );
}

#[test]
fn scores_flip_sign_when_black_is_to_move() {
    let after_e4 = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPPPPPP/RNBQKBNR b KQkq e3 0 1";
    let board = Board::from_fen(after_e4).unwrap();
    let line = found(
        Some(wire_move("e7", "e5")),
        14,
        Bound::BoundExact,
        Score::Cp(-25),
        Vec::new(),
    );
    let rendered = translate_line(&board, &line);
    assert_eq!(rendered.pretty_move, "e5");
    assert_eq!(rendered.score_sort_key, 25 * 200 + 14);
}

#[test]
fn not_found_lines_sort_below_everything() {
    let board = Board::start();
    let rendered = translate_line(
        &board,
        &Line::NotFound {
            mv: Some(wire_move("b1", "c3")),
        },
    );
    assert_eq!(rendered.pretty_move, "Nc3");
    assert!(rendered.pv_pretty.is_empty());
    assert_eq!(rendered.depth, None);
    assert_eq!(rendered.score, None);
    assert_eq!(rendered.score_sort_key, -100_000_000);

    // Absent depth is dropped from the wire form entirely.
    let wire = serde_json::to_value(&rendered).unwrap();
    assert!(wire.get("depth").is_none());
    assert_eq!(wire["score"], json!(null));
}

#[test]
fn renders_root_and_lines_keyed_by_coordinate_move() {
    let board = Board::from_fen(START_FEN).unwrap();
    let mut lines = std::collections::BTreeMap::new();
    lines.insert(
        "e2e4".to_string(),
        found(
            Some(wire_move("e2", "e4")),
            18,
            Bound::BoundExact,
            Score::Cp(30),
            Vec::new(),
        ),
    );
    let merged = MergedProbe {
        root: found(None, 22, Bound::BoundExact, Score::Cp(28), Vec::new()),
        lines,
    };
    let wire = render(&board, &merged);
    assert_eq!(wire["root"]["pretty_move"], json!(""));
    assert_eq!(wire["root"]["depth"], json!(22));
    assert_eq!(wire["lines"]["e2e4"]["pretty_move"], json!("e4"));
    assert_eq!(wire["lines"]["e2e4"]["score_sort_key"], json!(30 * 200 + 18));
}
