//! Once-a-day job dispatcher.
//!
//! Each registered job has a wall-clock time and fires at most once per
//! occurrence. `run_pending` is called from the main loop on every tick;
//! due jobs run sequentially in registration order. A job that errors or
//! panics is logged and counted, and the remaining jobs still run.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime, NaiveTime};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tracing::{error, info, warn};

use super::jobs::JobOutcome;

/// A unit of scheduled work.
#[async_trait]
pub trait Job: Send + Sync {
    fn name(&self) -> &str;

    /// Run once; `now` is the tick time that made the job due.
    async fn run(&self, now: NaiveDateTime) -> Result<JobOutcome>;
}

struct Entry {
    job: Box<dyn Job>,
    at: NaiveTime,
    next_run: NaiveDateTime,
    last_run: Option<NaiveDateTime>,
}

/// Summary of one `run_pending` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Names of the jobs that ran, in order.
    pub ran: Vec<String>,
    pub published: usize,
    pub quiet: usize,
    pub failed: usize,
}

#[derive(Default)]
pub struct Scheduler {
    entries: Vec<Entry>,
}

/// First `at` strictly after `after`.
pub fn next_occurrence(at: NaiveTime, after: NaiveDateTime) -> NaiveDateTime {
    let candidate = after.date().and_time(at);
    if candidate > after {
        candidate
    } else {
        candidate + Duration::days(1)
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `job` to run every day at `at`, starting with the first
    /// occurrence after `now`.
    pub fn every_day_at(&mut self, at: NaiveTime, job: Box<dyn Job>, now: NaiveDateTime) {
        let next_run = next_occurrence(at, now);
        info!(job = job.name(), at = %at.format("%H:%M"), next_run = %next_run, "Job scheduled");
        self.entries.push(Entry { job, at, next_run, last_run: None });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Earliest upcoming run across all jobs.
    pub fn next_run(&self) -> Option<NaiveDateTime> {
        self.entries.iter().map(|e| e.next_run).min()
    }

    /// `(next_run, last_run)` of the job registered under `name`.
    pub fn status(&self, name: &str) -> Option<(NaiveDateTime, Option<NaiveDateTime>)> {
        self.entries
            .iter()
            .find(|e| e.job.name() == name)
            .map(|e| (e.next_run, e.last_run))
    }

    /// Run every job due at `now`.
    pub async fn run_pending(&mut self, now: NaiveDateTime) -> TickReport {
        let mut report = TickReport::default();

        for entry in self.entries.iter_mut().filter(|e| e.next_run <= now) {
            let name = entry.job.name().to_string();
            if now - entry.next_run > Duration::minutes(5) {
                warn!(job = %name, due = %entry.next_run, "Running late");
            }
            info!(job = %name, "Job starting");

            let result = AssertUnwindSafe(entry.job.run(now)).catch_unwind().await;
            match result {
                Ok(Ok(JobOutcome::Published { post_id })) => {
                    info!(job = %name, post_id = %post_id, "Job published");
                    report.published += 1;
                }
                Ok(Ok(JobOutcome::Quiet { reason })) => {
                    info!(job = %name, reason = %reason, "Job finished without posting");
                    report.quiet += 1;
                }
                Ok(Err(e)) => {
                    error!(job = %name, error = %format!("{e:#}"), "Job failed");
                    report.failed += 1;
                }
                Err(panic) => {
                    let msg = panic
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    error!(job = %name, panic = %msg, "Job panicked");
                    report.failed += 1;
                }
            }

            entry.last_run = Some(now);
            entry.next_run = next_occurrence(entry.at, now);
            report.ran.push(name);
        }

        report
    }
}
