//! Enrichment runs: configuration, job selection and the concurrent orchestrator.
//!
//! The workflow layer wires real HTTP clients and the snapshot file into the
//! orchestrator; everything here also runs against stub clients in tests.
/// Current schema version for the enrichment config file.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;
/// Current schema version for the run report.
pub const REPORT_SCHEMA_VERSION: u32 = 1;
/// Current schema version for run history entries.
pub const HISTORY_SCHEMA_VERSION: u32 = 1;

mod config;
mod credentials;
mod history;
pub mod interrupt;
mod jobs;
mod progress;
mod run;
mod types;

pub use config::{load_config_optional, validate_config, EnrichConfig};
pub use credentials::resolve_api_key;
pub use history::{append_history, now_epoch_ms, write_report};
pub use run::{Orchestrator, RunOptions, Services, SnapshotFile};
pub use types::*;
