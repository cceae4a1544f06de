//! Structural JSON diff/patch engine.
//!
//! The wire format is an ordered sequence of stanzas applied
//! left-to-right: `[path]` deletes the addressed node, `[path, value]`
//! sets or inserts it. Path segments address nested structure by object
//! key (string) or array index (number).
//!
//! Round-trip law: `patch(a, &diff(&a, &b)) == b` for all tree pairs.

mod diff;
mod patch;
pub use diff::diff;
pub use patch::patch;


use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// One step of a stanza path: an object key or a sequence index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seg {
    Key(String),
    Index(usize),
}

/// A single diff stanza: a deletion (`value == None`) or a set/insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "Value", try_from = "Value")]
pub struct Stanza {
    pub path: Vec<Seg>,
    pub value: Option<Value>,
}

impl Stanza {
    pub fn set(path: Vec<Seg>, value: Value) -> Self {
        Stanza {
            path,
            value: Some(value),
        }
    }

    pub fn delete(path: Vec<Seg>) -> Self {
        Stanza { path, value: None }
    }
}

impl From<Stanza> for Value {
    fn from(stanza: Stanza) -> Value {
        let path = Value::Array(
            stanza
                .path
                .into_iter()
                .map(|seg| match seg {
                    Seg::Key(k) => Value::String(k),
                    Seg::Index(i) => Value::from(i),
                })
                .collect(),
        );
        let mut out = vec![path];
        if let Some(value) = stanza.value {
            out.push(value);
        }
        Value::Array(out)
    }
}

impl TryFrom<Value> for Stanza {
    type Error = String;

    fn try_from(value: Value) -> std::result::Result<Self, Self::Error> {
        let Value::Array(mut items) = value else {
            return Err("stanza must be a JSON array".to_string());
        };
        if items.is_empty() || items.len() > 2 {
            return Err(format!("stanza must have 1 or 2 elements, got {}", items.len()));
        }
        let new_value = if items.len() == 2 { items.pop() } else { None };
        let Some(Value::Array(raw_path)) = items.pop() else {
            return Err("stanza path must be a JSON array".to_string());
        };
        let mut path = Vec::with_capacity(raw_path.len());
        for seg in raw_path {
            match seg {
                Value::String(k) => path.push(Seg::Key(k)),
                Value::Number(n) => match n.as_u64() {
                    Some(i) => path.push(Seg::Index(i as usize)),
                    None => return Err(format!("invalid path index: {}", n)),
                },
                other => return Err(format!("invalid path segment: {}", other)),
            }
        }
        Ok(Stanza {
            path,
            value: new_value,
        })
    }
}

/// Serialized length of a stanza list, used to decide whether a
/// whole-subtree replacement beats a structural diff.
pub(crate) fn serialized_len(stanzas: &[Stanza]) -> usize {
    serde_json::to_string(stanzas).map(|s| s.len()).unwrap_or(usize::MAX)
}
