//! Exact whole-row deduplication.
//!
//! Comparison is over every column, never key-only: two distinct CDC states
//! (different op or seq) legitimately share a key and must both survive to
//! ranking. Only literal replays of the same row collapse here.

use ahash::HashSet;
use common_types::ChangeEvent;

/// Remove exact duplicate events, keeping the first occurrence of each
/// distinct row in input order. Idempotent.
pub fn dedupe(events: Vec<ChangeEvent>) -> Vec<ChangeEvent> {
    let mut seen: HashSet<ChangeEvent> = HashSet::with_capacity_and_hasher(
        events.len(),
        Default::default(),
    );
    let mut out = Vec::with_capacity(events.len());
    for event in events {
        if seen.insert(event.clone()) {
            out.push(event);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::event;
    use common_types::Op;

    #[test]
    fn test_exact_duplicates_collapse_to_one() {
        let a = event("k1", Op::Insert, Some(1), Some("2024-03-01 10:00:00"));
        let events = vec![a.clone(), a.clone(), a.clone()];
        let deduped = dedupe(events);
        assert_eq!(deduped, vec![a]);
    }

    #[test]
    fn test_same_key_different_state_both_survive() {
        let a = event("k1", Op::Insert, Some(1), Some("2024-03-01 10:00:00"));
        let b = event("k1", Op::Update, Some(2), Some("2024-03-01 10:00:00"));
        let deduped = dedupe(vec![a.clone(), b.clone()]);
        assert_eq!(deduped, vec![a, b]);
    }

    #[test]
    fn test_idempotent() {
        let a = event("k1", Op::Insert, Some(1), None);
        let b = event("k2", Op::Insert, Some(1), None);
        let once = dedupe(vec![a.clone(), a, b.clone(), b]);
        let twice = dedupe(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_first_occurrence_order_preserved() {
        let a = event("k2", Op::Insert, Some(1), None);
        let b = event("k1", Op::Insert, Some(1), None);
        let deduped = dedupe(vec![a.clone(), b.clone(), a.clone()]);
        assert_eq!(deduped, vec![a, b]);
    }
}
