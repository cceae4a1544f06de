use serde_json::Value;

use super::serialized_len;
use super::Seg;
use super::Stanza;

/// Computes an ordered stanza sequence transforming `left` into `right`.
pub fn diff(left: &Value, right: &Value) -> Vec<Stanza> {
    diff_inner(left, right, &[], true)
}

fn diff_inner(left: &Value, right: &Value, key: &[Seg], top: bool) -> Vec<Stanza> {
    let common = commonality(left, right);
    let mut out = if common < 0.5 {
        this_level_diff(left, right, key, common)
    } else {
        keyset_diff(left, right, key)
    };

    // A "dumb" whole-subtree replacement wins whenever it serializes
    // shorter than the structural diff.
    let dumb = vec![Stanza::set(key.to_vec(), right.clone())];
    if serialized_len(&dumb) < serialized_len(&out) {
        out = dumb;
    }

    if top && out.len() > 1 {
        out = sort_stanzas(out);
    }
    out
}

fn is_terminal(value: &Value) -> bool {
    !matches!(value, Value::Object(_) | Value::Array(_))
}

/// Fraction of structure shared between two nodes, driving the choice
/// between recursing per-key and replacing the whole subtree.
fn commonality(left: &Value, right: &Value) -> f64 {
    match (left, right) {
        (Value::Array(l), Value::Array(r)) => {
            let com = l.iter().filter(|elem| r.contains(elem)).count();
            let tot = l.len().max(r.len());
            if tot == 0 {
                0.0
            } else {
                com as f64 / tot as f64
            }
        }
        (Value::Object(l), Value::Object(r)) => {
            let overlap = l.keys().filter(|k| r.contains_key(*k)).count();
            let left_only = l.len() - overlap;
            let right_only = r.keys().filter(|k| !l.contains_key(*k)).count();
            // Keys added on the right weigh double.
            let tot = overlap + left_only + 2 * right_only;
            if tot == 0 {
                0.0
            } else {
                overlap as f64 / tot as f64
            }
        }
        _ => 0.0,
    }
}

/// Shallow diff at one level: replace changed children wholesale rather
/// than recursing into them.
fn this_level_diff(left: &Value, right: &Value, key: &[Seg], common: f64) -> Vec<Stanza> {
    if common > 0.0 {
        let mut out = Vec::new();
        for_keysets(left, right, |overlap, left_only, right_only| {
            for k in overlap {
                let (l, r) = (child(left, &k), child(right, &k));
                if l != r {
                    out.push(Stanza::set(join(key, k.clone()), r.cloned().unwrap_or(Value::Null)));
                }
            }
            for k in left_only {
                out.push(Stanza::delete(join(key, k)));
            }
            for k in right_only {
                let r = child(right, &k).cloned().unwrap_or(Value::Null);
                out.push(Stanza::set(join(key, k), r));
            }
        });
        out
    } else if left != right {
        vec![Stanza::set(key.to_vec(), right.clone())]
    } else {
        Vec::new()
    }
}

/// Per-key diff: deletions for vanished keys, sets for new keys, and a
/// recursive diff for keys present on both sides.
fn keyset_diff(left: &Value, right: &Value, key: &[Seg]) -> Vec<Stanza> {
    let mut out = Vec::new();
    for_keysets(left, right, |overlap, left_only, right_only| {
        for k in left_only {
            out.push(Stanza::delete(join(key, k)));
        }
        for k in right_only {
            let r = child(right, &k).cloned().unwrap_or(Value::Null);
            out.push(Stanza::set(join(key, k), r));
        }
        for k in overlap {
            if let (Some(l), Some(r)) = (child(left, &k), child(right, &k)) {
                out.extend(diff_inner(l, r, &join(key, k), false));
            }
        }
    });
    out
}

/// Invokes `f` with (overlap, left_only, right_only) key sets. For
/// arrays the key sets are index ranges; for objects, key name sets.
fn for_keysets<F>(left: &Value, right: &Value, f: F)
where
    F: FnOnce(Vec<Seg>, Vec<Seg>, Vec<Seg>),
{
    match (left, right) {
        (Value::Array(l), Value::Array(r)) => {
            let shared = l.len().min(r.len());
            let overlap = (0..shared).map(Seg::Index).collect();
            let left_only = (shared..l.len()).map(Seg::Index).collect();
            let right_only = (shared..r.len()).map(Seg::Index).collect();
            f(overlap, left_only, right_only);
        }
        (Value::Object(l), Value::Object(r)) => {
            let overlap = l
                .keys()
                .filter(|k| r.contains_key(*k))
                .map(|k| Seg::Key(k.clone()))
                .collect();
            let left_only = l
                .keys()
                .filter(|k| !r.contains_key(*k))
                .map(|k| Seg::Key(k.clone()))
                .collect();
            let right_only = r
                .keys()
                .filter(|k| !l.contains_key(*k))
                .map(|k| Seg::Key(k.clone()))
                .collect();
            f(overlap, left_only, right_only);
        }
        _ => f(Vec::new(), Vec::new(), Vec::new()),
    }
}

fn child<'a>(value: &'a Value, seg: &Seg) -> Option<&'a Value> {
    match (value, seg) {
        (Value::Object(map), Seg::Key(k)) => map.get(k),
        (Value::Array(arr), Seg::Index(i)) => arr.get(*i),
        _ => None,
    }
}

fn join(key: &[Seg], seg: Seg) -> Vec<Seg> {
    let mut path = key.to_vec();
    path.push(seg);
    path
}

/// Orders stanzas so patching left-to-right is well defined: node
/// changes first (sequence insertions leftmost-node-first), then
/// deletions (sequence deletions last-node-first).
fn sort_stanzas(stanzas: Vec<Stanza>) -> Vec<Stanza> {
    let (mut sets, mut deletes): (Vec<Stanza>, Vec<Stanza>) =
        stanzas.into_iter().partition(|s| s.value.is_some());

    sets.sort_by(|a, b| match (trailing_index(a), trailing_index(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => std::cmp::Ordering::Equal,
    });
    deletes.sort_by(|a, b| match (trailing_index(a), trailing_index(b)) {
        (Some(x), Some(y)) => y.cmp(&x),
        _ => std::cmp::Ordering::Equal,
    });

    sets.extend(deletes);
    sets
}

fn trailing_index(stanza: &Stanza) -> Option<usize> {
    match stanza.path.last() {
        Some(Seg::Index(i)) => Some(*i),
        _ => None,
    }
}
