//! Grouping of deduplicated events by entity key.
//!
//! Purely structural: no filtering, no ordering guarantees beyond keeping
//! each key's events in their incoming order. Ranking happens per group.

use ahash::HashMap;
use common_types::{ChangeEvent, EntityKey};

pub type KeyGroups = HashMap<EntityKey, Vec<ChangeEvent>>;

/// Group events by their entity key (composite keys via tuple equality).
pub fn partition_by_key(events: Vec<ChangeEvent>) -> KeyGroups {
    let mut groups: KeyGroups = HashMap::default();
    for event in events {
        groups.entry(event.key.clone()).or_default().push(event);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::event;
    use common_types::Op;

    #[test]
    fn test_groups_by_key() {
        let events = vec![
            event("k1", Op::Insert, Some(1), None),
            event("k2", Op::Insert, Some(1), None),
            event("k1", Op::Update, Some(2), None),
        ];
        let groups = partition_by_key(events);
        assert_eq!(groups.len(), 2);
        let k1 = EntityKey::single(common_types::FieldValue::Text("k1".into()));
        assert_eq!(groups[&k1].len(), 2);
    }

    #[test]
    fn test_no_filtering() {
        let events = vec![
            event("k1", Op::Delete, None, None),
            event("k1", Op::Insert, None, None),
        ];
        let groups = partition_by_key(events.clone());
        let total: usize = groups.values().map(Vec::len).sum();
        assert_eq!(total, events.len());
    }
}
