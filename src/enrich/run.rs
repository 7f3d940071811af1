//! The enrichment orchestrator.
//!
//! A run selects every record still missing a field, fans the lookups out to a
//! fixed pool of scoped worker threads, and folds the outcomes back into the
//! store on the calling thread. Only the coordinator touches the store and the
//! checkpoint sink; workers see nothing but their job and the lookup clients.
//!
//! Checkpoints are full snapshots written every `save_interval` completed jobs
//! and once more at the end, so an interrupted or crashed run loses at most
//! one interval of work. Resuming is simply running again: job selection skips
//! whatever the previous run already filled.
use super::config::EnrichConfig;
use super::jobs::{build_jobs, Job, JobInput};
use super::progress::Tally;
use super::{Direction, RunReport, RunState, REPORT_SCHEMA_VERSION};
use crate::address;
use crate::geocode::{Geocoder, LookupError, ReverseGeocoder};
use crate::store::{write_snapshot, Coordinates, GeoBounds, MissingField, RecordStore, Snapshot};
use anyhow::{anyhow, Context, Result};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

/// How often the coordinator wakes to look for an interrupt while idle.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Scheduling knobs for a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub workers: usize,
    pub save_interval: usize,
    pub pacing: Duration,
    pub progress_interval: usize,
    pub bounds: GeoBounds,
}

impl RunOptions {
    pub fn from_config(config: &EnrichConfig) -> Self {
        Self {
            workers: config.workers,
            save_interval: config.save_interval,
            pacing: config.pacing(),
            progress_interval: config.progress_interval,
            bounds: config.bounds,
        }
    }
}

/// Lookup clients for a run; a direction needing an absent client is rejected.
#[derive(Clone, Copy, Default)]
pub struct Services<'a> {
    pub geocoder: Option<&'a dyn Geocoder>,
    pub reverse: Option<&'a dyn ReverseGeocoder>,
}

/// Durable destination for store snapshots.
pub trait Checkpoint {
    fn save(&mut self, snapshot: &Snapshot) -> Result<()>;
}

/// Checkpoints written atomically to a snapshot file.
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Checkpoint for SnapshotFile {
    fn save(&mut self, snapshot: &Snapshot) -> Result<()> {
        write_snapshot(&self.path, snapshot)
    }
}

/// What a successful lookup produced.
#[derive(Debug)]
enum Found {
    Coordinates(Coordinates),
    Address(String),
}

struct Outcome {
    job: Job,
    result: Result<Found, LookupError>,
    elapsed: Duration,
}

pub struct Orchestrator<'a> {
    options: RunOptions,
    services: Services<'a>,
    cancel: &'a AtomicBool,
    state: RunState,
}

impl<'a> Orchestrator<'a> {
    /// `cancel` is polled between jobs; setting it drains in-flight lookups,
    /// writes a final checkpoint and ends the run as `Interrupted`.
    pub fn new(options: RunOptions, services: Services<'a>, cancel: &'a AtomicBool) -> Self {
        Self {
            options,
            services,
            cancel,
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Enrich `store` in `direction`, checkpointing into `checkpoint`.
    pub fn run(
        &mut self,
        store: &mut RecordStore,
        direction: Direction,
        checkpoint: &mut dyn Checkpoint,
    ) -> Result<RunReport> {
        if self.state != RunState::Idle {
            return Err(anyhow!("orchestrator already ran (state {:?})", self.state));
        }
        self.check_services(direction)?;

        let jobs = build_jobs(store, direction.fields());
        if jobs.is_empty() {
            tracing::info!(direction = direction.as_str(), "nothing to enrich");
            self.state = RunState::Completed;
            return Ok(RunReport::empty(direction));
        }

        self.state = RunState::Running;
        let total = jobs.len();
        let workers = self.options.workers.clamp(1, total);
        tracing::info!(
            total,
            workers,
            direction = direction.as_str(),
            save_interval = self.options.save_interval,
            "starting enrichment"
        );

        let queue = Mutex::new(VecDeque::from(jobs));
        let stop = AtomicBool::new(false);
        let (sender, receiver) = mpsc::channel::<Outcome>();
        let mut coordinator = Coordinator {
            store,
            checkpoint,
            bounds: self.options.bounds,
            save_interval: self.options.save_interval.max(1),
            since_checkpoint: 0,
            checkpoints: 0,
            tally: Tally::new(total, self.options.progress_interval),
        };
        let mut interrupted = false;
        let mut fatal: Option<anyhow::Error> = None;

        let services = self.services;
        let cancel = self.cancel;
        let pacing = self.options.pacing;
        thread::scope(|scope| {
            for worker in 0..workers {
                let sender = sender.clone();
                let queue = &queue;
                let stop = &stop;
                scope.spawn(move || work(worker, queue, stop, cancel, services, pacing, sender));
            }
            drop(sender);

            loop {
                if !interrupted && cancel.load(Ordering::SeqCst) {
                    interrupted = true;
                    stop.store(true, Ordering::SeqCst);
                    tracing::warn!("interrupt received; waiting for in-flight lookups");
                }
                match receiver.recv_timeout(POLL_INTERVAL) {
                    Ok(outcome) => {
                        if fatal.is_some() {
                            continue;
                        }
                        if let Err(err) = coordinator.fold(outcome) {
                            stop.store(true, Ordering::SeqCst);
                            fatal = Some(err);
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        });

        if let Some(err) = fatal {
            self.state = RunState::Interrupted;
            return Err(err.context("enrichment run aborted"));
        }
        // Workers watch `cancel` too and may exit between two coordinator polls.
        if !interrupted && cancel.load(Ordering::SeqCst) && coordinator.tally.processed < total {
            interrupted = true;
            tracing::warn!("interrupt received; remaining jobs skipped");
        }
        coordinator.final_checkpoint()?;

        self.state = if interrupted {
            RunState::Interrupted
        } else {
            RunState::Completed
        };
        let report = coordinator.report(self.state, direction);
        tracing::info!(
            state = ?report.state,
            succeeded = report.succeeded,
            failed = report.failed,
            skipped = report.skipped,
            elapsed_ms = report.elapsed_ms,
            "enrichment finished"
        );
        Ok(report)
    }

    fn check_services(&self, direction: Direction) -> Result<()> {
        for field in direction.fields() {
            let present = match field {
                MissingField::Coordinates => self.services.geocoder.is_some(),
                MissingField::Address => self.services.reverse.is_some(),
            };
            if !present {
                return Err(anyhow!(
                    "direction {} needs a {} client",
                    direction.as_str(),
                    field
                ));
            }
        }
        Ok(())
    }
}

fn work(
    worker: usize,
    queue: &Mutex<VecDeque<Job>>,
    stop: &AtomicBool,
    cancel: &AtomicBool,
    services: Services<'_>,
    pacing: Duration,
    sender: Sender<Outcome>,
) {
    let mut first = true;
    loop {
        if !first && !pacing.is_zero() {
            thread::sleep(pacing);
        }
        first = false;
        if stop.load(Ordering::SeqCst) || cancel.load(Ordering::SeqCst) {
            break;
        }
        let next = match queue.lock() {
            Ok(mut jobs) => jobs.pop_front(),
            Err(poisoned) => poisoned.into_inner().pop_front(),
        };
        let Some(job) = next else {
            break;
        };
        let start = Instant::now();
        let result = lookup(services, &job.input);
        let outcome = Outcome {
            job,
            result,
            elapsed: start.elapsed(),
        };
        if sender.send(outcome).is_err() {
            break;
        }
    }
    tracing::debug!(worker, "worker finished");
}

fn lookup(services: Services<'_>, input: &JobInput) -> Result<Found, LookupError> {
    match input {
        JobInput::Address(query) => match services.geocoder {
            Some(geocoder) => geocoder.geocode(query).map(Found::Coordinates),
            None => Err(LookupError::Service("no geocoder configured".to_string())),
        },
        JobInput::Coordinates(coordinates) => match services.reverse {
            Some(reverse) => reverse
                .reverse_geocode(*coordinates)
                .map(Found::Address),
            None => Err(LookupError::Service(
                "no reverse geocoder configured".to_string(),
            )),
        },
    }
}

/// The single writer: merges outcomes, counts them and checkpoints.
struct Coordinator<'s, C: Checkpoint + ?Sized> {
    store: &'s mut RecordStore,
    checkpoint: &'s mut C,
    bounds: GeoBounds,
    save_interval: usize,
    since_checkpoint: usize,
    checkpoints: usize,
    tally: Tally,
}

impl<C: Checkpoint + ?Sized> Coordinator<'_, C> {
    fn fold(&mut self, outcome: Outcome) -> Result<()> {
        let Outcome {
            job,
            result,
            elapsed,
        } = outcome;
        let elapsed_ms = elapsed.as_millis();
        let result = result.and_then(|found| match found {
            Found::Coordinates(coordinates) if !self.bounds.contains(coordinates) => {
                Err(LookupError::OutOfBounds(coordinates))
            }
            found => Ok(found),
        });

        match result {
            Ok(found) => {
                self.merge(job.index, &found)?;
                tracing::info!(
                    index = job.index,
                    field = %job.field,
                    name = %job.label,
                    elapsed_ms,
                    result = ?found,
                    "record enriched"
                );
                self.tally.success();
            }
            Err(err) => {
                tracing::warn!(
                    index = job.index,
                    field = %job.field,
                    name = %job.label,
                    elapsed_ms,
                    reason = err.reason(),
                    error = %err,
                    "lookup failed"
                );
                self.tally.failure(err.reason());
            }
        }

        self.since_checkpoint += 1;
        if self.since_checkpoint >= self.save_interval {
            self.write_checkpoint()?;
        }
        Ok(())
    }

    fn merge(&mut self, index: usize, found: &Found) -> Result<()> {
        let mut record = self
            .store
            .get(index)
            .cloned()
            .ok_or_else(|| anyhow!("job refers to missing record {index}"))?;
        match found {
            Found::Coordinates(coordinates) => record.set_coordinates(*coordinates),
            Found::Address(formatted) => {
                record.address = formatted.clone();
                let parsed = address::parse(
                    address::strip_locale_prefix(formatted),
                    record.city.as_deref(),
                    None,
                )
                .normalized();
                if record.city.is_none() {
                    record.city = parsed.city;
                }
                if record.district.is_none() {
                    record.district = parsed.district;
                }
            }
        }
        self.store.update(index, record)
    }

    fn write_checkpoint(&mut self) -> Result<()> {
        let start = Instant::now();
        self.checkpoint
            .save(&self.store.snapshot())
            .context("write checkpoint")?;
        self.checkpoints += 1;
        tracing::info!(
            processed = self.tally.processed,
            records = self.store.total_count(),
            elapsed_ms = start.elapsed().as_millis(),
            "checkpoint written"
        );
        self.since_checkpoint = 0;
        Ok(())
    }

    fn final_checkpoint(&mut self) -> Result<()> {
        if self.since_checkpoint > 0 || self.checkpoints == 0 {
            self.write_checkpoint()?;
        }
        Ok(())
    }

    fn report(&self, state: RunState, direction: Direction) -> RunReport {
        let tally = &self.tally;
        RunReport {
            schema_version: REPORT_SCHEMA_VERSION,
            state,
            direction,
            total: tally.total,
            processed: tally.processed,
            succeeded: tally.succeeded,
            failed: tally.failed,
            skipped: tally.total.saturating_sub(tally.processed),
            failures_by_reason: tally.failures_by_reason.clone(),
            checkpoints: self.checkpoints,
            elapsed_ms: tally.elapsed().as_millis(),
            jobs_per_second: tally.rate(),
        }
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
