//! Command workflows.
//!
//! Each step is a thin layer that loads inputs, calls into the core modules
//! and prints a summary, so the CLI stays free of policy.
mod enrich;
mod ingest;
mod status;

pub use enrich::run_enrich;
pub use ingest::run_ingest;
pub use status::run_status;
