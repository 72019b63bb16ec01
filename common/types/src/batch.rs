use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One materialized batch of raw CDC rows for a single entity type, as
/// handed over by the ingestion adapter.
///
/// Cells are loosely typed JSON values: the upstream loader infers column
/// types best-effort, so numeric columns may still arrive as strings and the
/// engine's extraction step owns the defined coercions.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawBatch {
    /// Entity type this batch belongs to (registry lookup key).
    pub entity: String,
    /// Column names, in source order. Every row has one cell per column.
    pub columns: Vec<String>,
    pub rows: Vec<Vec<JsonValue>>,
}

impl RawBatch {
    pub fn new(entity: impl Into<String>, columns: Vec<String>) -> RawBatch {
        RawBatch {
            entity: entity.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn push_row(&mut self, row: Vec<JsonValue>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_column_index() {
        let batch = RawBatch::new(
            "customers",
            vec!["customerId".into(), "op".into(), "seqNum".into()],
        );
        assert_eq!(batch.column_index("op"), Some(1));
        assert_eq!(batch.column_index("missing"), None);
    }

    #[test]
    fn test_push_row() {
        let mut batch = RawBatch::new("orders", vec!["orderId".into(), "op".into()]);
        batch.push_row(vec![json!("o1"), json!("I")]);
        assert_eq!(batch.len(), 1);
        assert!(!batch.is_empty());
    }
}
