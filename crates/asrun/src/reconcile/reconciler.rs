//! One reconciliation pass: poll every `PENDING` record's job and persist the
//! terminal outcomes.

use std::sync::Arc;

use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::db::{media_repo, Database, DatabaseError};
use crate::dispatch::{CutService, JobState, PollError};
use crate::record::MediaStatus;

/// Error text stored on records the cut service reports as failed.
pub const REMOTE_FAILURE_MESSAGE: &str = "cut service reported job failure";

/// Outcome of one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickReport {
    /// Number of jobs queried.
    pub polled: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Jobs still running, or in a state outside the known vocabulary.
    pub still_pending: usize,
    pub poll_errors: usize,
    /// Set when another tick was already in progress and this one did nothing.
    pub skipped: bool,
}

/// Polls the cut service for the records that are still `PENDING`.
///
/// Uses a mutex so two ticks never overlap.
pub struct Reconciler {
    db: Database,
    service: Arc<dyn CutService>,
    max_concurrent_polls: usize,
    tick_lock: Mutex<()>,
}

impl Reconciler {
    pub fn new(db: Database, service: Arc<dyn CutService>, max_concurrent_polls: usize) -> Self {
        Self {
            db,
            service,
            max_concurrent_polls: max_concurrent_polls.max(1),
            tick_lock: Mutex::new(()),
        }
    }

    /// Number of records currently awaiting a terminal job state.
    pub fn pending_count(&self) -> Result<u64, DatabaseError> {
        media_repo::count_by_status(&self.db, MediaStatus::Pending)
    }

    /// Runs one pass over the current `PENDING` set.
    ///
    /// Poll failures leave the record untouched for the next tick. Only store
    /// errors fail the tick.
    pub async fn tick(&self) -> Result<TickReport, DatabaseError> {
        let _guard = match self.tick_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                tracing::debug!("Reconcile tick already in progress, skipping");
                return Ok(TickReport {
                    skipped: true,
                    ..TickReport::default()
                });
            }
        };

        let pending = media_repo::find_by_status(&self.db, MediaStatus::Pending)?;
        let mut report = TickReport::default();
        if pending.is_empty() {
            return Ok(report);
        }

        let service = &self.service;
        let outcomes: Vec<(String, String, Result<JobState, PollError>)> =
            stream::iter(pending.into_iter().filter_map(|row| {
                // The store rejects PENDING rows without a job id.
                let job_id = row.job_id?;
                Some((row.id, job_id))
            }))
            .map(|(id, job_id)| async move {
                let outcome = service.status(&job_id).await;
                (id, job_id, outcome)
            })
            .buffer_unordered(self.max_concurrent_polls)
            .collect()
            .await;

        for (id, job_id, outcome) in outcomes {
            report.polled += 1;
            self.apply(&id, &job_id, outcome, &mut report)?;
        }

        tracing::info!(
            polled = report.polled,
            succeeded = report.succeeded,
            failed = report.failed,
            still_pending = report.still_pending,
            poll_errors = report.poll_errors,
            "Reconcile tick finished"
        );

        Ok(report)
    }

    fn apply(
        &self,
        id: &str,
        job_id: &str,
        outcome: Result<JobState, PollError>,
        report: &mut TickReport,
    ) -> Result<(), DatabaseError> {
        match outcome {
            Ok(JobState::Success) => {
                let now = Utc::now().to_rfc3339();
                if media_repo::resolve_pending(&self.db, id, MediaStatus::Success, None, &now)? {
                    tracing::info!(media_id = %id, job_id = %job_id, "Cut job succeeded");
                    report.succeeded += 1;
                }
            }
            Ok(JobState::Failure) => {
                let now = Utc::now().to_rfc3339();
                if media_repo::resolve_pending(
                    &self.db,
                    id,
                    MediaStatus::Failed,
                    Some(REMOTE_FAILURE_MESSAGE),
                    &now,
                )? {
                    tracing::warn!(media_id = %id, job_id = %job_id, "Cut job failed");
                    report.failed += 1;
                }
            }
            Ok(JobState::Pending) => {
                report.still_pending += 1;
            }
            Ok(JobState::Unknown(state)) => {
                tracing::warn!(
                    media_id = %id,
                    job_id = %job_id,
                    state = %state,
                    "Unrecognized job state, keeping record pending"
                );
                report.still_pending += 1;
            }
            Err(e) => {
                tracing::warn!(media_id = %id, job_id = %job_id, error = %e, "Job status poll failed");
                report.poll_errors += 1;
            }
        }
        Ok(())
    }
}
