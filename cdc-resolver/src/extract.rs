//! Raw batch → `ChangeEvent` extraction.
//!
//! Owns the two failure channels of the error design: a missing structural
//! column fails the whole entity batch (`SchemaMismatch`), while a row whose
//! cells defeat the defined coercions is quarantined and reported without
//! touching the rest of the batch.

use common_types::{ChangeEvent, EntityKey, FieldValue, Op, Payload, RawBatch};
use metrics::counter;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::coerce::{coerce_numeric, coerce_seq, coerce_tiebreaker, coerce_timestamp};
use crate::error::{QuarantineReason, QuarantinedRow, ResolveError};
use crate::metrics_const::ROWS_QUARANTINED_COUNTER;
use crate::registry::EntityKeySchema;

/// Result of extracting one raw batch.
#[derive(Debug)]
pub struct Extracted {
    pub events: Vec<ChangeEvent>,
    pub quarantined: Vec<QuarantinedRow>,
}

/// Column indexes resolved once per batch.
struct ColumnPlan {
    key: Vec<usize>,
    op: usize,
    seq: usize,
    event_time: usize,
    /// Declared tiebreaker columns; `None` for columns absent from this
    /// batch, which contribute nulls rather than failing it.
    tiebreakers: Vec<Option<usize>>,
    numeric: Vec<usize>,
}

impl ColumnPlan {
    fn build(batch: &RawBatch, schema: &EntityKeySchema) -> Result<ColumnPlan, ResolveError> {
        let require = |column: &str| {
            batch
                .column_index(column)
                .ok_or_else(|| ResolveError::SchemaMismatch {
                    entity: batch.entity.clone(),
                    column: column.to_string(),
                })
        };

        let key = schema
            .key_columns
            .iter()
            .map(|c| require(c))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ColumnPlan {
            key,
            op: require(&schema.op_column)?,
            seq: require(&schema.seq_column)?,
            event_time: require(&schema.event_time_column)?,
            tiebreakers: schema
                .tiebreaker_columns
                .iter()
                .map(|c| batch.column_index(c))
                .collect(),
            numeric: schema
                .numeric_columns
                .iter()
                .filter_map(|c| batch.column_index(c))
                .collect(),
        })
    }
}

/// Extract typed change events from a raw batch.
///
/// Fails with `SchemaMismatch` if any key/op/seq/event-time column the
/// registry declares is absent from the batch's column list.
pub fn extract_events(batch: &RawBatch, schema: &EntityKeySchema) -> Result<Extracted, ResolveError> {
    let plan = ColumnPlan::build(batch, schema)?;

    let mut events = Vec::with_capacity(batch.rows.len());
    let mut quarantined = Vec::new();

    for (row_index, row) in batch.rows.iter().enumerate() {
        // Deserialized batches can carry rows whose cell count disagrees
        // with the column list; quarantine those before indexing into them.
        let result = if row.len() == batch.columns.len() {
            extract_row(batch, schema, &plan, row)
        } else {
            Err((
                QuarantineReason::RaggedRow,
                batch.columns.get(row.len()).cloned().unwrap_or_default(),
            ))
        };
        match result {
            Ok(event) => events.push(event),
            Err((reason, column)) => {
                counter!(
                    ROWS_QUARANTINED_COUNTER,
                    "entity" => batch.entity.clone(),
                    "reason" => reason.as_str(),
                )
                .increment(1);
                debug!(
                    entity = %batch.entity,
                    row_index,
                    reason = reason.as_str(),
                    column = %column,
                    "quarantining row"
                );
                quarantined.push(QuarantinedRow {
                    row_index,
                    reason,
                    column,
                    cells: row.clone(),
                });
            }
        }
    }

    Ok(Extracted { events, quarantined })
}

fn extract_row(
    batch: &RawBatch,
    schema: &EntityKeySchema,
    plan: &ColumnPlan,
    row: &[JsonValue],
) -> Result<ChangeEvent, (QuarantineReason, String)> {
    let op_raw = &row[plan.op];
    let op = op_raw
        .as_str()
        .and_then(Op::from_code)
        .ok_or_else(|| (QuarantineReason::UnknownOp, schema.op_column.clone()))?;

    let seq_num = coerce_seq(&row[plan.seq])
        .map_err(|_| (QuarantineReason::BadSequence, schema.seq_column.clone()))?;

    let event_time = coerce_timestamp(&row[plan.event_time]).map_err(|_| {
        (
            QuarantineReason::BadTimestamp,
            schema.event_time_column.clone(),
        )
    })?;

    let key = EntityKey(
        plan.key
            .iter()
            .map(|&idx| FieldValue::from_json(&row[idx]))
            .collect(),
    );

    let tiebreakers = plan
        .tiebreakers
        .iter()
        .map(|idx| match idx {
            Some(i) => coerce_tiebreaker(&row[*i]),
            None => FieldValue::Null,
        })
        .collect();

    // Full row as payload, with declared numeric columns coerced so the
    // output carries numbers even where the feed carried strings.
    let mut payload = Payload::with_capacity(batch.columns.len());
    for (idx, name) in batch.columns.iter().enumerate() {
        let value = if plan.numeric.contains(&idx) {
            coerce_numeric(&row[idx])
                .map_err(|_| (QuarantineReason::BadNumeric, name.clone()))?
        } else if idx == plan.seq {
            seq_num.map_or(FieldValue::Null, FieldValue::Int)
        } else if idx == plan.event_time {
            event_time.map_or(FieldValue::Null, FieldValue::Timestamp)
        } else {
            FieldValue::from_json(&row[idx])
        };
        payload.push(name.clone(), value);
    }

    Ok(ChangeEvent {
        key,
        op,
        seq_num,
        event_time,
        tiebreakers,
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::EntityRegistry;
    use serde_json::json;

    fn payments_batch() -> RawBatch {
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
        batch.push_row(vec![
            json!("p1"),
            json!("o1"),
            json!("120.50"),
            json!("2024-03-01 10:00:00"),
            json!("I"),
            json!("2024-03-01 10:00:05"),
            json!(1),
        ]);
        batch
    }

    fn payments_schema() -> EntityKeySchema {
        EntityRegistry::builtin().schema("payments").unwrap().clone()
    }

    #[test]
    fn test_extracts_typed_event() {
        let extracted = extract_events(&payments_batch(), &payments_schema()).unwrap();
        assert_eq!(extracted.events.len(), 1);
        assert!(extracted.quarantined.is_empty());

        let event = &extracted.events[0];
        assert_eq!(event.op, Op::Insert);
        assert_eq!(event.seq_num, Some(1));
        assert!(event.event_time.is_some());
        // String amount coerced to a number in the payload
        assert_eq!(event.payload.get("amount"), Some(&FieldValue::Float(120.5)));
        // Tiebreaker column parsed as a timestamp
        assert!(matches!(event.tiebreakers[0], FieldValue::Timestamp(_)));
    }

    #[test]
    fn test_missing_seq_column_is_schema_mismatch() {
        let mut batch = payments_batch();
        let idx = batch.column_index("seqNum").unwrap();
        batch.columns.remove(idx);
        for row in &mut batch.rows {
            row.remove(idx);
        }

        let err = extract_events(&batch, &payments_schema()).unwrap_err();
        match err {
            ResolveError::SchemaMismatch { entity, column } => {
                assert_eq!(entity, "payments");
                assert_eq!(column, "seqNum");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bad_rows_quarantine_without_aborting() {
        let mut batch = payments_batch();
        batch.push_row(vec![
            json!("p2"),
            json!("o2"),
            json!("not-a-number"),
            json!("2024-03-01 11:00:00"),
            json!("U"),
            json!("2024-03-01 11:00:05"),
            json!(2),
        ]);
        batch.push_row(vec![
            json!("p3"),
            json!("o3"),
            json!(10),
            json!("2024-03-01 12:00:00"),
            json!("upsert"),
            json!("2024-03-01 12:00:05"),
            json!(1),
        ]);

        let extracted = extract_events(&batch, &payments_schema()).unwrap();
        assert_eq!(extracted.events.len(), 1);
        assert_eq!(extracted.quarantined.len(), 2);
        assert_eq!(extracted.quarantined[0].reason, QuarantineReason::BadNumeric);
        assert_eq!(extracted.quarantined[0].row_index, 1);
        assert_eq!(extracted.quarantined[1].reason, QuarantineReason::UnknownOp);
    }

    #[test]
    fn test_null_ordering_cells_are_not_errors() {
        let mut batch = payments_batch();
        batch.push_row(vec![
            json!("p4"),
            json!(null),
            json!(null),
            json!(null),
            json!("U"),
            json!(null),
            json!(null),
        ]);

        let extracted = extract_events(&batch, &payments_schema()).unwrap();
        assert_eq!(extracted.events.len(), 2);
        let event = &extracted.events[1];
        assert_eq!(event.seq_num, None);
        assert_eq!(event.event_time, None);
        assert_eq!(event.tiebreakers[0], FieldValue::Null);
    }

    #[test]
    fn test_short_row_quarantined_as_ragged() {
        // Deserialize path skips push_row's length check entirely.
        let batch: RawBatch = serde_json::from_value(json!({
            "entity": "customers",
            "columns": ["customerId", "op", "eventTime", "seqNum"],
            "rows": [
                ["c1", "I", "2024-03-01 10:00:00", 1],
                ["c2", "I"],
            ],
        }))
        .unwrap();

        let schema = EntityRegistry::builtin().schema("customers").unwrap().clone();
        let extracted = extract_events(&batch, &schema).unwrap();
        assert_eq!(extracted.events.len(), 1);
        assert_eq!(extracted.quarantined.len(), 1);
        assert_eq!(extracted.quarantined[0].reason, QuarantineReason::RaggedRow);
        assert_eq!(extracted.quarantined[0].row_index, 1);
        assert_eq!(extracted.quarantined[0].column, "eventTime");
    }

    #[test]
    fn test_over_long_row_quarantined_as_ragged() {
        let mut batch = payments_batch();
        let mut long = batch.rows[0].clone();
        long.push(json!("extra"));
        batch.rows.push(long);

        let extracted = extract_events(&batch, &payments_schema()).unwrap();
        assert_eq!(extracted.events.len(), 1);
        assert_eq!(extracted.quarantined.len(), 1);
        assert_eq!(extracted.quarantined[0].reason, QuarantineReason::RaggedRow);
        assert!(extracted.quarantined[0].column.is_empty());
    }

    #[test]
    fn test_absent_tiebreaker_column_contributes_nulls() {
        let mut batch = RawBatch::new(
            "payments",
            vec![
                "paymentId".into(),
                "op".into(),
                "eventTime".into(),
                "seqNum".into(),
            ],
        );
        batch.push_row(vec![json!("p1"), json!("I"), json!(null), json!(1)]);

        let extracted = extract_events(&batch, &payments_schema()).unwrap();
        assert_eq!(extracted.events[0].tiebreakers, vec![FieldValue::Null]);
    }
}
