use std::str::FromStr;

use envconfig::Envconfig;

/// What to do when the winning event for a key is a Delete.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Emit the Delete row as the latest record for the key (`op = Delete`).
    /// Presence semantics are the caller's to decide. This mirrors the
    /// historical pipeline behavior and is the default.
    RetainTombstone,
    /// Omit the key from the output entirely.
    DropOnDelete,
}

impl FromStr for DeletePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "retain_tombstone" | "retain" | "tombstone" => Ok(DeletePolicy::RetainTombstone),
            "drop_on_delete" | "drop" => Ok(DeletePolicy::DropOnDelete),
            other => Err(format!("unknown delete policy '{other}'")),
        }
    }
}

#[derive(Envconfig, Clone, Debug)]
pub struct Config {
    #[envconfig(default = "retain_tombstone")]
    pub delete_policy: DeletePolicy,

    /// How many quarantined rows to retain verbatim in the report; the
    /// total count is always exact.
    #[envconfig(default = "50")]
    pub quarantine_sample_limit: usize,

    /// Fan out the per-key rank/resolve step across a thread pool. Output
    /// is identical either way; the comparator is total.
    #[envconfig(default = "true")]
    pub parallel_resolution: bool,
}

impl Config {
    pub fn init_with_defaults() -> Result<Self, envconfig::Error> {
        Config::init_from_env()
    }

    pub fn to_resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            delete_policy: self.delete_policy,
            quarantine_sample_limit: self.quarantine_sample_limit,
            parallel: self.parallel_resolution,
        }
    }
}

/// Immutable per-run options, constructed once and passed to the engine.
#[derive(Clone, Copy, Debug)]
pub struct ResolverOptions {
    pub delete_policy: DeletePolicy,
    pub quarantine_sample_limit: usize,
    pub parallel: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        ResolverOptions {
            delete_policy: DeletePolicy::RetainTombstone,
            quarantine_sample_limit: 50,
            parallel: false,
        }
    }
}
