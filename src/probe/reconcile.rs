use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::proto::Bound;
use crate::proto::HashProbeLine;
use crate::proto::HashProbeMove;
use crate::proto::HashProbeResponse;
use crate::proto::HashProbeScore;
use crate::proto::ScoreType;

/// How much deeper a non-exact probe result must reach before it is
/// preferred over an exact one.
const EXACT_DEPTH_MARGIN: u32 = 10;

#[derive(Debug, Clone, PartialEq)]
pub enum Score {
    Cp(i32),
    Mate(i32),
}

impl Score {
    pub fn from_proto(score: &HashProbeScore) -> Option<Score> {
        match score.score_type() {
            ScoreType::ScoreCp => Some(Score::Cp(score.score_cp)),
            ScoreType::ScoreMate => Some(Score::Mate(score.score_mate)),
            ScoreType::ScoreNone => None,
        }
    }
}

/// A probe answer for one move, after collapsing the wire format's
/// optional fields: a line either carries a usable evaluation or it
/// does not.
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    Found {
        mv: Option<HashProbeMove>,
        depth: u32,
        bound: Bound,
        score: Option<Score>,
        pv: Vec<HashProbeMove>,
    },
    NotFound {
        mv: Option<HashProbeMove>,
    },
}

impl Line {
    pub fn from_proto(line: &HashProbeLine) -> Line {
        if !line.found {
            return Line::NotFound {
                mv: line.r#move.clone(),
            };
        }
        // The search score is authoritative; the static eval is the
        // fallback when the entry was stored without one.
        let score = line
            .value
            .as_ref()
            .and_then(Score::from_proto)
            .or_else(|| line.eval.as_ref().and_then(Score::from_proto));
        Line::Found {
            mv: line.r#move.clone(),
            depth: line.depth,
            bound: line.bound(),
            score,
            pv: line.pv.clone(),
        }
    }

    fn search_depth(&self) -> i64 {
        match self {
            Line::Found { depth, .. } => i64::from(*depth),
            Line::NotFound { .. } => -1,
        }
    }
}

/// Responses from all backends collapsed to one answer per move.
#[derive(Debug)]
pub struct MergedProbe {
    pub root: Line,
    /// Keyed by the move in coordinate notation, e.g. `e7e8q`
    pub lines: BTreeMap<String, Line>,
}

pub fn uci_key(mv: &HashProbeMove) -> String {
    format!("{}{}{}", mv.from_sq, mv.to_sq, mv.promotion)
}

/// Folds the per-backend responses together. Backends are visited in
/// configuration order, so ties deterministically keep the first
/// answer seen.
pub fn merge(responses: &[HashProbeResponse]) -> MergedProbe {
    let mut root = Line::NotFound { mv: None };
    let mut lines: BTreeMap<String, Line> = BTreeMap::new();

    for response in responses {
        if let Some(r) = &response.root {
            let candidate = Line::from_proto(r);
            // The root position was searched by every backend; the
            // deepest result is simply the best one.
            if candidate.search_depth() > root.search_depth() {
                root = candidate;
            }
        }
        for line in &response.line {
            let Some(mv) = &line.r#move else {
                continue;
            };
            let candidate = Line::from_proto(line);
            match lines.entry(uci_key(mv)) {
                Entry::Vacant(slot) => {
                    slot.insert(candidate);
                }
                Entry::Occupied(mut slot) => {
                    let incumbent = slot.insert(Line::NotFound { mv: None });
                    slot.insert(reconcile(incumbent, candidate));
                }
            }
        }
    }

    MergedProbe { root, lines }
}

/// Picks the better of two answers for the same move. `first` is the
/// earlier-seen one and wins all ties.
pub fn reconcile(first: Line, second: Line) -> Line {
    match (&first, &second) {
        (Line::NotFound { .. }, Line::Found { .. }) => second,
        (_, Line::NotFound { .. }) => first,
        (
            Line::Found {
                bound: first_bound,
                depth: first_depth,
                ..
            },
            Line::Found {
                bound: second_bound,
                depth: second_depth,
                ..
            },
        ) => {
            let first_exact = *first_bound == Bound::BoundExact;
            let second_exact = *second_bound == Bound::BoundExact;
            if first_exact != second_exact {
                // An exact score beats a bound unless the bound comes
                // from a much deeper search.
                if first_exact {
                    if *second_depth > *first_depth + EXACT_DEPTH_MARGIN {
                        second
                    } else {
                        first
                    }
                } else if *first_depth > *second_depth + EXACT_DEPTH_MARGIN {
                    first
                } else {
                    second
                }
            } else if second_depth > first_depth {
                second
            } else {
                first
            }
        }
    }
}
