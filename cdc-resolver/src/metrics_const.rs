//! Metric names emitted by the resolution engine.

/// Raw rows received per entity batch, before any processing.
pub const ROWS_RECEIVED_COUNTER: &str = "cdc_resolver_rows_received_total";

/// Rows quarantined during extraction, labeled by reason.
pub const ROWS_QUARANTINED_COUNTER: &str = "cdc_resolver_rows_quarantined_total";

/// Exact duplicate rows removed by the deduplication step.
pub const DUPLICATES_REMOVED_COUNTER: &str = "cdc_resolver_duplicates_removed_total";

/// Distinct keys resolved to a latest-state record.
pub const KEYS_RESOLVED_COUNTER: &str = "cdc_resolver_keys_resolved_total";

/// Delete-op winners retained as tombstones in the output.
pub const TOMBSTONES_RETAINED_COUNTER: &str = "cdc_resolver_tombstones_retained_total";

/// Delete-op winners dropped from the output under the drop-on-delete policy.
pub const TOMBSTONES_DROPPED_COUNTER: &str = "cdc_resolver_tombstones_dropped_total";

/// Entity batches rejected for a missing structural column.
pub const SCHEMA_MISMATCH_COUNTER: &str = "cdc_resolver_schema_mismatch_total";

/// End-to-end resolution time for one entity batch.
pub const BATCH_RESOLVE_DURATION_MS: &str = "cdc_resolver_batch_resolve_duration_ms";
