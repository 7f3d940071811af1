use crate::store::MissingField;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which lookups a run performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Address to coordinates.
    Geocode,
    /// Coordinates to address.
    Reverse,
    /// Both; a record still gets at most one job.
    Both,
}

impl Direction {
    /// Fields this direction fills, in dispatch order.
    pub fn fields(self) -> &'static [MissingField] {
        match self {
            Direction::Geocode => &[MissingField::Coordinates],
            Direction::Reverse => &[MissingField::Address],
            Direction::Both => &[MissingField::Coordinates, MissingField::Address],
        }
    }

    pub fn needs_reverse(self) -> bool {
        matches!(self, Direction::Reverse | Direction::Both)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Geocode => "geocode",
            Direction::Reverse => "reverse",
            Direction::Both => "both",
        }
    }
}

/// Lifecycle of one orchestrator run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Running,
    Interrupted,
    Completed,
}

/// Final tally of a run, printed and optionally written as JSON.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RunReport {
    pub schema_version: u32,
    pub state: RunState,
    pub direction: Direction,
    /// Jobs selected at start.
    pub total: usize,
    /// Jobs whose outcome was folded into the store.
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Selected jobs never dispatched because the run was interrupted.
    pub skipped: usize,
    pub failures_by_reason: BTreeMap<String, usize>,
    pub checkpoints: usize,
    pub elapsed_ms: u128,
    pub jobs_per_second: f64,
}

impl RunReport {
    pub(crate) fn empty(direction: Direction) -> Self {
        Self {
            schema_version: super::REPORT_SCHEMA_VERSION,
            state: RunState::Completed,
            direction,
            total: 0,
            processed: 0,
            succeeded: 0,
            failed: 0,
            skipped: 0,
            failures_by_reason: BTreeMap::new(),
            checkpoints: 0,
            elapsed_ms: 0,
            jobs_per_second: 0.0,
        }
    }
}

/// One line of the optional run history log.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunHistoryEntry {
    pub schema_version: u32,
    pub started_at_epoch_ms: u128,
    pub finished_at_epoch_ms: u128,
    pub snapshot: String,
    pub direction: Direction,
    pub state: RunState,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}
