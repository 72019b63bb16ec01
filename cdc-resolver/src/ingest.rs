//! Interfaces to the external collaborators: the ingestion adapter that
//! materializes raw batches, and the table writer that accepts resolved
//! records.
//!
//! The engine only consumes these contracts. Delivery semantics are
//! at-least-once: duplicates are possible (the dedup step absorbs them),
//! gaps are never silently dropped, and one `fetch_available` call delivers
//! everything currently available, then stops.

use anyhow::Error;
use async_trait::async_trait;
use common_types::{LatestStateRecord, RawBatch};
use serde::{Deserialize, Serialize};

/// Source format options for the loader.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceFormat {
    Csv { header: bool, multi_line: bool },
    JsonLines,
}

/// Loader surface the driver configures per entity feed: where to read,
/// where to land, where schema and progress live.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoaderOptions {
    pub source_path: String,
    pub target_table: String,
    pub checkpoint_location: String,
    /// Where the loader persists its inferred/evolved schema.
    pub schema_location: String,
    pub format: SourceFormat,
    /// Attach ingestion-timestamp and source-file metadata columns.
    pub attach_metadata: bool,
}

/// A source of materialized raw batches.
#[async_trait]
pub trait IngestSource: Send + Sync {
    /// Deliver all currently available batches, then return. Calling again
    /// later picks up whatever arrived in between; schema discovery and
    /// evolution are the source's problem.
    async fn fetch_available(&mut self) -> Result<Vec<RawBatch>, Error>;
}

/// A sink for resolved latest-state records.
#[async_trait]
pub trait TableWriter: Send + Sync {
    async fn write(&mut self, entity: &str, records: &[LatestStateRecord]) -> Result<(), Error>;
}

/// In-memory source: hands out its batches once. Backs tests and embedding
/// drivers that already hold materialized data.
#[derive(Default)]
pub struct StaticSource {
    pending: Vec<RawBatch>,
}

impl StaticSource {
    pub fn new(batches: Vec<RawBatch>) -> StaticSource {
        StaticSource { pending: batches }
    }
}

#[async_trait]
impl IngestSource for StaticSource {
    async fn fetch_available(&mut self) -> Result<Vec<RawBatch>, Error> {
        Ok(std::mem::take(&mut self.pending))
    }
}

/// In-memory writer capturing everything handed to it.
#[derive(Default)]
pub struct MemoryWriter {
    pub written: Vec<(String, Vec<LatestStateRecord>)>,
}

#[async_trait]
impl TableWriter for MemoryWriter {
    async fn write(&mut self, entity: &str, records: &[LatestStateRecord]) -> Result<(), Error> {
        self.written.push((entity.to_string(), records.to_vec()));
        Ok(())
    }
}
