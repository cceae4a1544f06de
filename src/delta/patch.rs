use serde_json::Value;

use super::Seg;
use super::Stanza;

/// Applies a stanza sequence to `base`, returning the patched tree.
pub fn patch(base: Value, stanzas: &[Stanza]) -> Value {
    let mut node = base;
    for stanza in stanzas {
        node = apply(node, &stanza.path, stanza.value.as_ref());
    }
    node
}

fn apply(mut node: Value, path: &[Seg], value: Option<&Value>) -> Value {
    let Some((seg, rest)) = path.split_first() else {
        // Empty path replaces the whole tree.
        return value.cloned().unwrap_or(Value::Null);
    };

    if rest.is_empty() {
        match (&mut node, seg, value) {
            (Value::Object(map), Seg::Key(k), Some(v)) => {
                map.insert(k.clone(), v.clone());
            }
            (Value::Object(map), Seg::Key(k), None) => {
                map.remove(k);
            }
            (Value::Array(arr), Seg::Index(i), Some(v)) => {
                if *i < arr.len() {
                    arr[*i] = v.clone();
                } else if *i == arr.len() {
                    // Sequence insertions arrive leftmost-node-first, so
                    // an append is always exactly one past the end.
                    arr.push(v.clone());
                }
            }
            (Value::Array(arr), Seg::Index(i), None) => {
                if *i < arr.len() {
                    arr.remove(*i);
                }
            }
            // Path kind does not match the node; leave it unchanged.
            _ => {}
        }
        return node;
    }

    match (&mut node, seg) {
        (Value::Object(map), Seg::Key(k)) => {
            if let Some(slot) = map.get_mut(k) {
                let child = slot.take();
                *slot = apply(child, rest, value);
            }
        }
        (Value::Array(arr), Seg::Index(i)) => {
            if let Some(slot) = arr.get_mut(*i) {
                let child = slot.take();
                *slot = apply(child, rest, value);
            }
        }
        _ => {}
    }
    node
}
