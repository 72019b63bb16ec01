//! The resolution order: a total, deterministic comparator over a key's
//! events, most-current first.
//!
//! Criteria, in order: `seq_num` descending, `event_time` descending, then
//! the registry's tiebreaker columns in declared order, all descending with
//! nulls sorting after any non-null value. Rows still tied after every
//! configured column fall back to a keyed content hash of the canonical row
//! encoding, with the encoding itself as the last resort on hash collision.
//! The fallback makes the winner a function of row *content*, so permuting
//! the input batch can never change the resolved output.

use std::cmp::Ordering;
use std::hash::Hasher;

use common_types::{ChangeEvent, FieldValue};
use siphasher::sip::SipHasher13;

// Fixed hash keys: the fallback must order identically across processes and
// restarts.
const HASH_KEY_0: u64 = 0x7c6d_5b4a_3928_1706;
const HASH_KEY_1: u64 = 0x1f2e_3d4c_5b6a_7988;

/// Compare two events of the same key. `Ordering::Less` means `a` is more
/// current and outranks `b`.
pub fn resolution_cmp(a: &ChangeEvent, b: &ChangeEvent) -> Ordering {
    desc_nulls_last(&a.seq_num, &b.seq_num)
        .then_with(|| desc_nulls_last(&a.event_time, &b.event_time))
        .then_with(|| cmp_tiebreakers(&a.tiebreakers, &b.tiebreakers))
        .then_with(|| {
            let (bytes_a, bytes_b) = (canonical_bytes(a), canonical_bytes(b));
            hash_bytes(&bytes_b)
                .cmp(&hash_bytes(&bytes_a))
                .then_with(|| bytes_a.cmp(&bytes_b))
        })
}

/// Sort a key's events most-current first (rank 1 at index 0).
pub fn rank_events(group: &mut [ChangeEvent]) {
    group.sort_by(resolution_cmp);
}

/// The rank-1 event of a group, without sorting the whole group.
pub fn most_current(group: &[ChangeEvent]) -> Option<&ChangeEvent> {
    group.iter().min_by(|a, b| resolution_cmp(a, b))
}

fn desc_nulls_last<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.cmp(x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn cmp_tiebreakers(a: &[FieldValue], b: &[FieldValue]) -> Ordering {
    for (va, vb) in a.iter().zip(b.iter()) {
        let ord = desc_nulls_last_value(va, vb);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

// The same null policy as the primary criteria, applied uniformly: a row
// with more complete ranking information always outranks one with less.
fn desc_nulls_last_value(a: &FieldValue, b: &FieldValue) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (false, false) => b.cmp_values(a),
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        (true, true) => Ordering::Equal,
    }
}

/// Canonical byte encoding of an event: equal events produce equal bytes,
/// distinct events produce distinct bytes.
pub fn canonical_bytes(event: &ChangeEvent) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64 + event.payload.len() * 16);
    buf.push(match event.op {
        common_types::Op::Insert => b'i',
        common_types::Op::Update => b'u',
        common_types::Op::Delete => b'd',
    });
    match event.seq_num {
        Some(seq) => {
            buf.push(1);
            buf.extend_from_slice(&seq.to_be_bytes());
        }
        None => buf.push(0),
    }
    match event.event_time {
        Some(ts) => {
            buf.push(1);
            buf.extend_from_slice(&ts.timestamp_micros().to_be_bytes());
        }
        None => buf.push(0),
    }
    for component in event.key.components() {
        component.write_canonical(&mut buf);
    }
    for value in &event.tiebreakers {
        value.write_canonical(&mut buf);
    }
    for (name, value) in event.payload.iter() {
        buf.extend_from_slice(&(name.len() as u64).to_be_bytes());
        buf.extend_from_slice(name.as_bytes());
        value.write_canonical(&mut buf);
    }
    buf
}

/// Keyed content hash used as the deterministic ranking fallback.
pub fn content_hash(event: &ChangeEvent) -> u64 {
    hash_bytes(&canonical_bytes(event))
}

fn hash_bytes(bytes: &[u8]) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(HASH_KEY_0, HASH_KEY_1);
    hasher.write(bytes);
    hasher.finish()
}
