use serde_json::Value as JsonValue;
use thiserror::Error;

/// Entity-batch-level failures. These abort resolution for the affected
/// entity type only; other entity types in the same run are unaffected.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// A registry-declared structural column is missing from the batch.
    /// Resolution correctness cannot be established without it, so the
    /// batch fails outright rather than degrading the comparison.
    #[error("batch for entity '{entity}' is missing required column '{column}'")]
    SchemaMismatch { entity: String, column: String },

    #[error("no registry entry for entity '{0}'")]
    UnknownEntity(String),
}

/// Why a single row was quarantined instead of resolved.
///
/// Row-level problems never abort a batch; the row is retained in a side
/// channel and reported, so a handful of bad rows cannot block a pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QuarantineReason {
    /// The op cell held something other than a recognized CDC code.
    UnknownOp,
    /// The sequence cell was present but not coercible to an integer.
    BadSequence,
    /// The event-time cell was present but not parseable as a timestamp.
    BadTimestamp,
    /// A declared numeric column held a value no defined coercion accepts.
    BadNumeric,
    /// The row's cell count does not match the batch's column list.
    RaggedRow,
}

impl QuarantineReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuarantineReason::UnknownOp => "unknown_op",
            QuarantineReason::BadSequence => "bad_sequence",
            QuarantineReason::BadTimestamp => "bad_timestamp",
            QuarantineReason::BadNumeric => "bad_numeric",
            QuarantineReason::RaggedRow => "ragged_row",
        }
    }
}

/// A raw row that failed coercion, retained for the diagnostic report.
#[derive(Clone, Debug)]
pub struct QuarantinedRow {
    /// Index of the row in the input batch, before deduplication.
    pub row_index: usize,
    pub reason: QuarantineReason,
    /// Name of the column that failed coercion. For ragged rows, the first
    /// column with no cell (empty when the row is over-long).
    pub column: String,
    pub cells: Vec<JsonValue>,
}
