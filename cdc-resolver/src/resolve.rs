//! The full resolution pass: extract → dedupe → partition → rank → select.
//!
//! A pass is a pure function of the input batch's row *set*: input is
//! treated read-only, output is recomputed in full every time, and permuting
//! the rows cannot change the result.

use std::time::Instant;

use common_types::{ChangeEvent, EntityKey, LatestStateRecord, RawBatch};
use metrics::{counter, histogram};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::{DeletePolicy, ResolverOptions};
use crate::dedup::dedupe;
use crate::error::{QuarantinedRow, ResolveError};
use crate::extract::extract_events;
use crate::metrics_const::{
    BATCH_RESOLVE_DURATION_MS, DUPLICATES_REMOVED_COUNTER, KEYS_RESOLVED_COUNTER,
    ROWS_RECEIVED_COUNTER, SCHEMA_MISMATCH_COUNTER, TOMBSTONES_DROPPED_COUNTER,
    TOMBSTONES_RETAINED_COUNTER,
};
use crate::partition::partition_by_key;
use crate::rank::most_current;
use crate::registry::{EntityKeySchema, EntityRegistry};

/// Outcome of resolving one entity batch.
#[derive(Debug)]
pub struct ResolutionReport {
    pub entity: String,
    pub records: Vec<LatestStateRecord>,
    /// Retained sample of quarantined rows, capped by
    /// `quarantine_sample_limit`; `quarantined_total` is always exact.
    pub quarantined: Vec<QuarantinedRow>,
    pub quarantined_total: usize,
    pub input_rows: usize,
    pub duplicates_removed: usize,
    pub tombstones_dropped: usize,
}

/// Outcome of a whole run (several entity batches). A schema mismatch in
/// one entity's batch lands in `failed` and leaves the others untouched.
#[derive(Debug, Default)]
pub struct RunReport {
    pub resolved: Vec<ResolutionReport>,
    pub failed: Vec<(String, ResolveError)>,
}

/// The latest-state resolution engine. Holds only immutable configuration;
/// every `resolve_batch` call is independent.
#[derive(Clone, Debug)]
pub struct Resolver {
    registry: EntityRegistry,
    options: ResolverOptions,
}

impl Resolver {
    pub fn new(registry: EntityRegistry, options: ResolverOptions) -> Resolver {
        Resolver { registry, options }
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Resolve one raw entity batch to its latest-state records.
    pub fn resolve_batch(&self, batch: &RawBatch) -> Result<ResolutionReport, ResolveError> {
        let start = Instant::now();
        let schema = self
            .registry
            .schema(&batch.entity)
            .ok_or_else(|| ResolveError::UnknownEntity(batch.entity.clone()))?;

        counter!(ROWS_RECEIVED_COUNTER, "entity" => batch.entity.clone())
            .increment(batch.len() as u64);

        let extracted = extract_events(batch, schema)?;
        let quarantined_total = extracted.quarantined.len();
        let mut quarantined = extracted.quarantined;
        quarantined.truncate(self.options.quarantine_sample_limit);

        let input_rows = batch.len();
        let event_count = extracted.events.len();
        let deduped = dedupe(extracted.events);
        let duplicates_removed = event_count - deduped.len();
        counter!(DUPLICATES_REMOVED_COUNTER, "entity" => batch.entity.clone())
            .increment(duplicates_removed as u64);

        let (records, tombstones_dropped) = self.resolve_events(deduped, schema);

        counter!(KEYS_RESOLVED_COUNTER, "entity" => batch.entity.clone())
            .increment(records.len() as u64);
        histogram!(BATCH_RESOLVE_DURATION_MS, "entity" => batch.entity.clone())
            .record(start.elapsed().as_millis() as f64);

        info!(
            entity = %batch.entity,
            input_rows,
            duplicates_removed,
            quarantined = quarantined_total,
            records = records.len(),
            tombstones_dropped,
            "resolved entity batch"
        );

        Ok(ResolutionReport {
            entity: batch.entity.clone(),
            records,
            quarantined,
            quarantined_total,
            input_rows,
            duplicates_removed,
            tombstones_dropped,
        })
    }

    /// Resolve several batches, isolating entity-level failures: one
    /// entity's schema mismatch never blocks the others.
    pub fn resolve_run(&self, batches: &[RawBatch]) -> RunReport {
        let mut run = RunReport::default();
        for batch in batches {
            match self.resolve_batch(batch) {
                Ok(report) => run.resolved.push(report),
                Err(e) => {
                    if matches!(e, ResolveError::SchemaMismatch { .. }) {
                        counter!(SCHEMA_MISMATCH_COUNTER, "entity" => batch.entity.clone())
                            .increment(1);
                    }
                    warn!(entity = %batch.entity, error = ?e, "entity batch failed");
                    run.failed.push((batch.entity.clone(), e));
                }
            }
        }
        run
    }

    /// Core selection over already-extracted, deduplicated events.
    ///
    /// Returns the records plus the count of Delete winners withheld under
    /// the drop-on-delete policy.
    fn resolve_events(
        &self,
        events: Vec<ChangeEvent>,
        schema: &EntityKeySchema,
    ) -> (Vec<LatestStateRecord>, usize) {
        let groups = partition_by_key(events);

        // Each key's group is independent; fan out when asked to. Both
        // paths produce the same set because the comparator is total.
        let mut winners: Vec<LatestStateRecord> = if self.options.parallel {
            groups
                .par_iter()
                .filter_map(|(_, group)| most_current(group).map(LatestStateRecord::from_event))
                .collect()
        } else {
            groups
                .values()
                .filter_map(|group| most_current(group).map(LatestStateRecord::from_event))
                .collect()
        };

        let total = winners.len();
        if self.options.delete_policy == DeletePolicy::DropOnDelete {
            winners.retain(|r| r.op != common_types::Op::Delete);
        }
        let tombstones_dropped = total - winners.len();
        match self.options.delete_policy {
            DeletePolicy::RetainTombstone => {
                let tombstones = winners
                    .iter()
                    .filter(|r| r.op == common_types::Op::Delete)
                    .count();
                counter!(TOMBSTONES_RETAINED_COUNTER, "entity" => schema.entity.clone())
                    .increment(tombstones as u64);
            }
            DeletePolicy::DropOnDelete => {
                counter!(TOMBSTONES_DROPPED_COUNTER, "entity" => schema.entity.clone())
                    .increment(tombstones_dropped as u64);
            }
        }

        // Hash-map iteration order leaks through otherwise; emit records in
        // a stable key order so equal inputs give byte-equal outputs.
        winners.sort_by(|a, b| stable_key_cmp(&a.key, &b.key));

        (winners, tombstones_dropped)
    }
}

/// Total order over keys for output sorting. `cmp_values` alone is not
/// injective over distinct keys (`Int(3)` and `Float(3.0)` compare equal);
/// canonical bytes split such pairs.
fn stable_key_cmp(a: &EntityKey, b: &EntityKey) -> std::cmp::Ordering {
    a.components().iter().zip(b.components()).fold(
        std::cmp::Ordering::Equal,
        |ord, (x, y)| {
            ord.then_with(|| x.cmp_values(y)).then_with(|| {
                let mut xb = Vec::new();
                let mut yb = Vec::new();
                x.write_canonical(&mut xb);
                y.write_canonical(&mut yb);
                xb.cmp(&yb)
            })
        },
    )
}
