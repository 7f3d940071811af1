//! Outcome counters and periodic progress lines for a run.
use crate::util::format_duration_secs;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Running totals owned by the coordinator thread.
pub(super) struct Tally {
    pub total: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures_by_reason: BTreeMap<String, usize>,
    interval: usize,
    start: Instant,
}

impl Tally {
    pub fn new(total: usize, interval: usize) -> Self {
        Self {
            total,
            processed: 0,
            succeeded: 0,
            failed: 0,
            failures_by_reason: BTreeMap::new(),
            interval: interval.max(1),
            start: Instant::now(),
        }
    }

    pub fn success(&mut self) {
        self.processed += 1;
        self.succeeded += 1;
        self.report_progress();
    }

    pub fn failure(&mut self, reason: &str) {
        self.processed += 1;
        self.failed += 1;
        *self
            .failures_by_reason
            .entry(reason.to_string())
            .or_default() += 1;
        self.report_progress();
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Completed jobs per second so far.
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.processed as f64 / secs
        } else {
            0.0
        }
    }

    fn report_progress(&self) {
        if self.processed % self.interval != 0 && self.processed != self.total {
            return;
        }
        let rate = self.rate();
        let remaining = self.total.saturating_sub(self.processed);
        let eta = if rate > 0.0 {
            format_duration_secs((remaining as f64 / rate).round() as u64)
        } else {
            "unknown".to_string()
        };
        let percent = self.processed as f64 * 100.0 / self.total.max(1) as f64;
        tracing::info!(
            processed = self.processed,
            total = self.total,
            percent = %format!("{percent:.1}"),
            succeeded = self.succeeded,
            failed = self.failed,
            rate = %format!("{rate:.2}/s"),
            eta = %eta,
            "progress"
        );
    }
}
