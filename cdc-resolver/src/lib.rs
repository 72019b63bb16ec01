//! CDC latest-state resolution engine.
//!
//! Resolves the current, authoritative state of each business entity from a
//! noisy change-data-capture log: events may be exact duplicates, may arrive
//! out of order relative to their business timestamp, may carry malformed
//! values, and may reference keys that do not exist yet. One resolution pass
//! takes a materialized raw batch per entity type and emits one
//! latest-state record per distinct key, plus a diagnostic report of
//! quarantined rows.
//!
//! The engine is a library: no network surface, no scheduler. A driver owns
//! ingestion (see [`ingest`]) and storage, and invokes [`Resolver`] once per
//! batch.
//!
//! ## Error logging (anyhow)
//!
//! When logging errors with a cause chain, use formats that keep the chain
//! visible: `{e:#}` inline, or `error = ?e` as a structured field. Display
//! (`{}` / `%e`) only shows the top-level message.

pub mod coerce;
pub mod config;
pub mod dedup;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod metrics_const;
pub mod partition;
pub mod rank;
pub mod registry;
pub mod resolve;
pub mod test_utils;
pub mod text;

pub use config::{Config, DeletePolicy, ResolverOptions};
pub use error::{QuarantineReason, QuarantinedRow, ResolveError};
pub use registry::{EntityKeySchema, EntityRegistry};
pub use resolve::{ResolutionReport, Resolver, RunReport};
