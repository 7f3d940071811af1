//! Workflow for `amenrich enrich`.
//!
//! Resolves configuration and credentials up front so a bad setup fails before
//! any request is sent, then hands the store to the orchestrator.
use crate::cli::EnrichArgs;
use crate::enrich::{
    self, interrupt, EnrichConfig, Orchestrator, RunHistoryEntry, RunOptions, RunReport,
    RunState, Services, SnapshotFile, HISTORY_SCHEMA_VERSION,
};
use crate::geocode::{
    ArcGisGeocoder, Geocoder, GoogleReverseGeocoder, HttpClient, ReverseGeocoder,
};
use crate::store::RecordStore;
use crate::util::{display_path, format_duration_secs};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub fn run_enrich(args: &EnrichArgs) -> Result<()> {
    let config = resolve_config(args)?;
    let api_key = if args.direction.needs_reverse() {
        Some(enrich::resolve_api_key(&key_search_dirs(&args.snapshot))?)
    } else {
        None
    };

    let (mut store, stats) = RecordStore::load(&args.snapshot, &config.bounds)?;
    tracing::info!(
        snapshot = %args.snapshot.display(),
        records = stats.records,
        duplicates = stats.duplicates,
        derived_ids = stats.derived_ids,
        dropped_coordinates = stats.dropped_coordinates,
        "loaded snapshot"
    );

    let http = HttpClient::new(config.timeout());
    let services_config = &config.services;
    let geocoder = ArcGisGeocoder::new(
        http.clone(),
        services_config.geocode_url.clone(),
        services_config.out_sr,
        services_config.max_locations,
    );
    let reverse = api_key.map(|api_key| {
        GoogleReverseGeocoder::new(
            http.clone(),
            services_config.reverse_url.clone(),
            api_key,
            services_config.language.clone(),
            services_config.region.clone(),
        )
    });
    let services = Services {
        geocoder: Some(&geocoder as &dyn Geocoder),
        reverse: reverse.as_ref().map(|client| client as &dyn ReverseGeocoder),
    };

    let out = args.out.clone().unwrap_or_else(|| args.snapshot.clone());
    let mut checkpoint = SnapshotFile::new(out);
    let started_at_epoch_ms = enrich::now_epoch_ms()?;
    let cancel = interrupt::install()?;
    let mut orchestrator =
        Orchestrator::new(RunOptions::from_config(&config), services, &cancel);
    let report = orchestrator.run(&mut store, args.direction, &mut checkpoint)?;

    if report.checkpoints == 0 && args.out.is_some() {
        store
            .save(checkpoint.path())
            .with_context(|| format!("write {}", checkpoint.path().display()))?;
    }

    print_summary(&report, checkpoint.path());
    if orchestrator.state() == RunState::Interrupted {
        eprintln!("note: run interrupted; rerun the same command to resume");
    }
    if let Some(path) = args.report.as_deref() {
        enrich::write_report(path, &report)?;
    }
    if let Some(path) = args.history.as_deref() {
        let entry = RunHistoryEntry {
            schema_version: HISTORY_SCHEMA_VERSION,
            started_at_epoch_ms,
            finished_at_epoch_ms: enrich::now_epoch_ms()?,
            snapshot: checkpoint.path().display().to_string(),
            direction: report.direction,
            state: report.state,
            succeeded: report.succeeded,
            failed: report.failed,
            skipped: report.skipped,
        };
        enrich::append_history(path, &entry)?;
    }
    Ok(())
}

/// Config file (or defaults), then flag overrides, then validation.
fn resolve_config(args: &EnrichArgs) -> Result<EnrichConfig> {
    let mut config = enrich::load_config_optional(args.config.as_deref())?;
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(save_interval) = args.save_interval {
        config.save_interval = save_interval;
    }
    if let Some(pacing_ms) = args.pacing_ms {
        config.pacing_ms = pacing_ms;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    enrich::validate_config(&config).context("invalid enrichment config")?;
    Ok(config)
}

/// Directories searched for a `.env` file: the snapshot's, then the working one.
fn key_search_dirs(snapshot: &Path) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(parent) = snapshot.parent() {
        let parent = if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        };
        dirs.push(parent.to_path_buf());
    }
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|dir| dir == &cwd) {
            dirs.push(cwd);
        }
    }
    dirs
}

fn print_summary(report: &RunReport, out: &Path) {
    let state = match report.state {
        RunState::Completed => "completed",
        RunState::Interrupted => "interrupted",
        RunState::Idle | RunState::Running => "incomplete",
    };
    println!("enrich: {state} ({})", report.direction.as_str());
    println!(
        "  jobs: {} total, {} succeeded, {} failed, {} skipped",
        report.total, report.succeeded, report.failed, report.skipped
    );
    if !report.failures_by_reason.is_empty() {
        let reasons: Vec<String> = report
            .failures_by_reason
            .iter()
            .map(|(reason, count)| format!("{reason}={count}"))
            .collect();
        println!("  failures: {}", reasons.join(", "));
    }
    let cwd = std::env::current_dir().ok();
    println!(
        "  checkpoints: {} -> {}",
        report.checkpoints,
        display_path(out, cwd.as_deref())
    );
    println!(
        "  elapsed: {} ({:.2} jobs/s)",
        format_duration_secs((report.elapsed_ms / 1000) as u64),
        report.jobs_per_second
    );
}
