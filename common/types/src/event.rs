use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value::FieldValue;

/// CDC operation carried by every change event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Op {
    Insert,
    Update,
    Delete,
}

impl Op {
    /// Parse the raw operation code from a CDC feed.
    ///
    /// Accepts the single-letter codes the feed emits (`I`/`U`/`D`) and
    /// spelled-out forms, case-insensitively.
    pub fn from_code(raw: &str) -> Option<Op> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "i" | "insert" => Some(Op::Insert),
            "u" | "update" => Some(Op::Update),
            "d" | "delete" => Some(Op::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Op::Insert => "insert",
            Op::Update => "update",
            Op::Delete => "delete",
        }
    }
}

/// The identifying key of a business entity, one component per key column.
///
/// Composite keys compare component-wise; a missing key value is an explicit
/// null component, so rows with absent keys still group together rather than
/// fanning out into singletons.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityKey(pub Vec<FieldValue>);

impl EntityKey {
    pub fn single(value: FieldValue) -> EntityKey {
        EntityKey(vec![value])
    }

    pub fn components(&self) -> &[FieldValue] {
        &self.0
    }
}

/// An ordered field-name → value mapping.
///
/// Insertion order is the column order of the source batch and is preserved
/// through resolution, so downstream writers see stable column ordering.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Payload(Vec<(String, FieldValue)>);

impl Payload {
    pub fn new() -> Payload {
        Payload(Vec::new())
    }

    pub fn with_capacity(capacity: usize) -> Payload {
        Payload(Vec::with_capacity(capacity))
    }

    pub fn push(&mut self, name: impl Into<String>, value: FieldValue) {
        self.0.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0
            .iter()
            .find_map(|(n, v)| if n == name { Some(v) } else { None })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, FieldValue)> for Payload {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Payload {
        Payload(iter.into_iter().collect())
    }
}

/// One CDC event after extraction and coercion. Immutable once produced.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub key: EntityKey,
    pub op: Op,
    pub seq_num: Option<i64>,
    pub event_time: Option<DateTime<Utc>>,
    /// Values of the registry-declared tiebreaker columns, in declared order.
    pub tiebreakers: Vec<FieldValue>,
    /// The full row, including key and ordering columns.
    pub payload: Payload,
}

/// The winning event for one distinct key, emitted once per resolution pass.
///
/// Carries the winner's `op` verbatim: under the tombstone-retention policy a
/// key whose latest event is a Delete is still present here with
/// `op = Delete`, and presence semantics are the caller's to decide.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestStateRecord {
    pub key: EntityKey,
    pub op: Op,
    pub seq_num: Option<i64>,
    pub event_time: Option<DateTime<Utc>>,
    pub payload: Payload,
}

impl LatestStateRecord {
    pub fn from_event(event: &ChangeEvent) -> LatestStateRecord {
        LatestStateRecord {
            key: event.key.clone(),
            op: event.op,
            seq_num: event.seq_num,
            event_time: event.event_time,
            payload: event.payload.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_from_code() {
        assert_eq!(Op::from_code("I"), Some(Op::Insert));
        assert_eq!(Op::from_code(" u "), Some(Op::Update));
        assert_eq!(Op::from_code("DELETE"), Some(Op::Delete));
        assert_eq!(Op::from_code("upsert"), None);
        assert_eq!(Op::from_code(""), None);
    }

    #[test]
    fn test_payload_preserves_insertion_order() {
        let mut payload = Payload::new();
        payload.push("zeta", FieldValue::Int(1));
        payload.push("alpha", FieldValue::Int(2));

        let names: Vec<&str> = payload.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        assert_eq!(payload.get("alpha"), Some(&FieldValue::Int(2)));
        assert_eq!(payload.get("missing"), None);
    }

    #[test]
    fn test_composite_keys_compare_componentwise() {
        let a = EntityKey(vec![
            FieldValue::Text("o1".into()),
            FieldValue::Text("p1".into()),
        ]);
        let b = EntityKey(vec![
            FieldValue::Text("o1".into()),
            FieldValue::Text("p1".into()),
        ]);
        let c = EntityKey(vec![FieldValue::Text("o1".into()), FieldValue::Null]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
