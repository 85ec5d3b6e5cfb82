//! Run statistics and the final run report.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Counters shared between the interpreter and whoever reads the stats
#[derive(Debug, Default)]
pub struct Counters {
    actions_run: AtomicU64,
    action_failures: AtomicU64,
    triggers_met: AtomicU64,
    trigger_failures: AtomicU64,
    overruns: AtomicU64,
}

impl Counters {
    pub fn action_run(&self) {
        self.actions_run.fetch_add(1, Ordering::Relaxed);
    }

    pub fn action_failed(&self) {
        self.action_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn trigger_met(&self) {
        self.triggers_met.fetch_add(1, Ordering::Relaxed);
    }

    pub fn trigger_failed(&self) {
        self.trigger_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn overrun(&self) {
        self.overruns.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RunStats {
        RunStats {
            actions_run: self.actions_run.load(Ordering::Relaxed),
            action_failures: self.action_failures.load(Ordering::Relaxed),
            triggers_met: self.triggers_met.load(Ordering::Relaxed),
            trigger_failures: self.trigger_failures.load(Ordering::Relaxed),
            overruns: self.overruns.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Actions invoked, including ones that failed
    pub actions_run: u64,
    pub action_failures: u64,
    pub triggers_met: u64,
    /// Measurements that failed and were treated as not met
    pub trigger_failures: u64,
    /// Paced loop iterations that took at least their whole interval
    pub overruns: u64,
}

/// Summary returned when a run finishes or is cancelled
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    /// Total wall-clock duration of the run
    pub elapsed: Duration,
    /// Top-level repetitions that ran to completion
    pub repetitions: u32,
    pub cancelled: bool,
    pub stats: RunStats,
}
