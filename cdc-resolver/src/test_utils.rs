//! Shared test helpers: hand-built events and batches, plus a seeded
//! messy-batch generator in the shape of the real feed (duplicate rows,
//! padded whitespace, string-typed amounts, null injection, late arrivals).

use chrono::{Duration, TimeZone, Utc};
use common_types::{ChangeEvent, EntityKey, FieldValue, Op, Payload, RawBatch};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use crate::coerce::parse_timestamp;

/// Build a minimal event for comparator and dedup tests.
pub fn event(key: &str, op: Op, seq_num: Option<i64>, event_time: Option<&str>) -> ChangeEvent {
    let mut payload = Payload::new();
    payload.push("id", FieldValue::Text(key.to_string()));
    ChangeEvent {
        key: EntityKey::single(FieldValue::Text(key.to_string())),
        op,
        seq_num,
        event_time: event_time.and_then(parse_timestamp),
        tiebreakers: Vec::new(),
        payload,
    }
}

/// Event with explicit tiebreaker slots; `None` slots are null values.
pub fn event_with_tiebreakers(
    key: &str,
    seq_num: Option<i64>,
    tiebreakers: &[Option<&str>],
) -> ChangeEvent {
    let mut e = event(key, Op::Update, seq_num, Some("2024-03-01 10:00:00"));
    e.tiebreakers = tiebreakers
        .iter()
        .map(|t| match t {
            Some(s) => FieldValue::Text(s.to_string()),
            None => FieldValue::Null,
        })
        .collect();
    e
}

/// One raw row in the `[key, op, seqNum, eventTime]` column layout used by
/// `batch_with_rows`.
pub fn row(id: &str, op: &str, seq: JsonValue, event_time: &str) -> Vec<JsonValue> {
    vec![json!(id), json!(op), seq, json!(event_time)]
}

/// Raw batch with the entity's key column plus the CDC columns.
pub fn batch_with_rows(entity: &str, rows: Vec<Vec<JsonValue>>) -> RawBatch {
    let key_column = crate::registry::EntityRegistry::builtin()
        .schema(entity)
        .map(|s| s.key_columns[0].clone())
        .unwrap_or_else(|| "id".to_string());
    let mut batch = RawBatch::new(
        entity,
        vec![
            key_column,
            "op".to_string(),
            "seqNum".to_string(),
            "eventTime".to_string(),
        ],
    );
    for r in rows {
        batch.push_row(r);
    }
    batch
}

/// Knobs for the messy generator, mirroring the upstream fixture tooling.
#[derive(Clone, Copy, Debug)]
pub struct MessyBatchOptions {
    pub keys: usize,
    pub updates_per_key: usize,
    pub dupe_rate: f64,
    pub null_rate: f64,
    pub late_rate: f64,
    pub delete_rate: f64,
    pub seed: u64,
}

impl Default for MessyBatchOptions {
    fn default() -> Self {
        MessyBatchOptions {
            keys: 50,
            updates_per_key: 3,
            dupe_rate: 0.15,
            null_rate: 0.05,
            late_rate: 0.1,
            delete_rate: 0.05,
            seed: 42,
        }
    }
}

/// Generate a messy payments batch: I/U/D chains with increasing seq,
/// injected exact duplicates, padded whitespace, string-typed amounts,
/// occasional null ordering columns, and late arrivals.
pub fn messy_payments_batch(options: MessyBatchOptions) -> RawBatch {
    let mut rng = StdRng::seed_from_u64(options.seed);
    let base_day = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();

    let mut batch = RawBatch::new(
        "payments",
        vec![
            "paymentId".into(),
            "orderId".into(),
            "amount".into(),
            "paymentDate".into(),
            "op".into(),
            "eventTime".into(),
            "seqNum".into(),
        ],
    );

    for _ in 0..options.keys {
        // UUID keys like the real feed's, derived from the seeded RNG so
        // generated batches stay reproducible.
        let payment_id = Uuid::from_u128(rng.gen()).to_string();
        let order_id = Uuid::from_u128(rng.gen()).to_string();
        let chain_len = 1 + rng.gen_range(0..=options.updates_per_key);

        for seq in 1..=chain_len {
            let is_last = seq == chain_len;
            let op = if seq == 1 {
                "I"
            } else if is_last && rng.gen_bool(options.delete_rate) {
                "D"
            } else {
                "U"
            };

            let mut event_time = base_day + Duration::seconds(rng.gen_range(0..86_400));
            if rng.gen_bool(options.late_rate) {
                event_time -= Duration::days(rng.gen_range(1..3));
            }

            let amount = rng.gen_range(5.0..1500.0_f64);
            let amount_cell = if rng.gen_bool(0.25) {
                json!(format!("{amount:.2}"))
            } else {
                json!((amount * 100.0).round() / 100.0)
            };

            let padded_order_id = if rng.gen_bool(0.2) {
                format!(" {order_id} ")
            } else {
                order_id.clone()
            };
            let seq_cell = if rng.gen_bool(options.null_rate) {
                json!(null)
            } else {
                json!(seq as i64)
            };
            let payment_date = (event_time - Duration::seconds(rng.gen_range(0..3600)))
                .format("%Y-%m-%d %H:%M:%S")
                .to_string();

            let row = vec![
                json!(payment_id),
                json!(padded_order_id),
                amount_cell,
                json!(payment_date),
                json!(op),
                json!(event_time.format("%Y-%m-%d %H:%M:%S").to_string()),
                seq_cell,
            ];

            if rng.gen_bool(options.dupe_rate) {
                batch.push_row(row.clone());
            }
            batch.push_row(row);
        }
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messy_batch_is_reproducible() {
        let options = MessyBatchOptions::default();
        let a = messy_payments_batch(options);
        let b = messy_payments_batch(options);
        assert_eq!(a.rows, b.rows);
        assert!(a.len() >= options.keys);
    }
}
