use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::config::IngestConfig;
use super::report::{IngestReport, SkippedLine};
use crate::db::cursor_repo::{self, CursorRow};
use crate::db::media_repo::{self, MediaRow};
use crate::db::{Database, DatabaseError};
use crate::dispatch::{submit_with_retry, CutRequest, CutService};
use crate::error::IngestError;
use crate::reconcile::ReconcileScheduler;
use crate::record::{
    duration_in_seconds, extract_fields, extract::strip_line_terminator, route, MediaStatus,
    Routing,
};
use crate::sanitize::redact_path;

/// Number of leading lines to skip for the next run.
///
/// The newest cursor wins regardless of the file it was recorded for. With no
/// cursor (or an empty one) the header region is skipped.
pub fn resume_offset(latest: Option<&CursorRow>, header_lines: u64) -> u64 {
    match latest {
        Some(cursor) if cursor.total_lines > 0 => cursor.total_lines,
        _ => header_lines,
    }
}

/// Resumable as-run ingestion.
///
/// Runs are serialized: at most one run touches the cursor at a time, and a
/// second request for a file that is already being ingested is refused.
pub struct IngestPipeline {
    config: IngestConfig,
    db: Database,
    service: Arc<dyn CutService>,
    scheduler: Option<Arc<ReconcileScheduler>>,
    in_flight: Mutex<HashSet<PathBuf>>,
    run_lock: tokio::sync::Mutex<()>,
}

impl IngestPipeline {
    pub fn new(config: IngestConfig, db: Database, service: Arc<dyn CutService>) -> Self {
        Self {
            config,
            db,
            service,
            scheduler: None,
            in_flight: Mutex::new(HashSet::new()),
            run_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Reconcile loop to wake after every successful run.
    pub fn with_scheduler(mut self, scheduler: Arc<ReconcileScheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Ingests every not-yet-processed line of `path` and appends a new cursor
    /// snapshot. Records and cursor are committed together or not at all.
    pub async fn ingest(&self, path: &Path) -> Result<IngestReport, IngestError> {
        let _in_flight = InFlightGuard::acquire(&self.in_flight, path)?;
        let _run = self.run_lock.lock().await;

        let span = info_span!("ingest", file = %redact_path(path));
        let report = self.run(path).instrument(span).await?;

        if let Some(scheduler) = &self.scheduler {
            scheduler.ensure_running();
        }

        Ok(report)
    }

    async fn run(&self, path: &Path) -> Result<IngestReport, IngestError> {
        let filename = path.display().to_string();
        let store_err = |source: DatabaseError| IngestError::Store {
            path: path.to_path_buf(),
            source,
        };
        let read_err = |source: std::io::Error| IngestError::ReadFile {
            path: path.to_path_buf(),
            source,
        };

        let latest = cursor_repo::latest(&self.db).map_err(store_err)?;
        let resume_after = resume_offset(latest.as_ref(), self.config.header_lines);
        if let Some(cursor) = &latest {
            if cursor.filename != filename {
                warn!(
                    cursor_file = %cursor.filename,
                    resume_after,
                    "Latest cursor was recorded for a different file, resuming from its offset"
                );
            }
        }
        info!(resume_after, "Ingest started");

        let file = tokio::fs::File::open(path).await.map_err(read_err)?;
        let mut reader = BufReader::new(file);
        let mut report = IngestReport::new(filename.clone(), resume_after);
        let mut staged: Vec<MediaRow> = Vec::new();
        let mut buf = Vec::new();
        let mut line_number = 0u64;

        loop {
            buf.clear();
            let read = reader.read_until(b'\n', &mut buf).await.map_err(read_err)?;
            if read == 0 {
                break;
            }
            line_number += 1;
            if line_number <= resume_after {
                continue;
            }
            if let Some(row) = self.process_line(&filename, line_number, &buf, &mut report).await {
                report.count(row.status);
                staged.push(row);
            }
        }

        report.total_lines = line_number;
        let previous_total = latest.as_ref().map_or(0, |c| c.total_lines);
        if line_number < previous_total {
            warn!(
                total_lines = line_number,
                cursor_total_lines = previous_total,
                "File is shorter than the cursor, keeping the cursor offset"
            );
        }
        report.cursor_total_lines = line_number.max(previous_total);

        let expected = latest.as_ref().map(|c| c.id);
        let now = Utc::now().to_rfc3339();
        let commit = self.db.with_transaction(|tx| {
            let found = cursor_repo::latest_with(tx)?.map(|c| c.id);
            if found != expected {
                return Err(DatabaseError::CursorConflict { expected, found });
            }
            for row in &staged {
                media_repo::insert_with(tx, row)?;
            }
            cursor_repo::append_with(tx, &filename, report.cursor_total_lines, &now)
        });

        match commit {
            Ok(cursor_id) => {
                info!(
                    cursor_id,
                    total_lines = report.total_lines,
                    records = report.records_created(),
                    pending = report.pending,
                    not_sent = report.not_sent,
                    dispatch_failed = report.dispatch_failed,
                    rejected = report.rejected,
                    skipped = report.skipped.len(),
                    "Ingest committed"
                );
                Ok(report)
            }
            Err(e) => {
                let orphaned: Vec<&str> = staged
                    .iter()
                    .filter_map(|row| row.job_id.as_deref())
                    .collect();
                if !orphaned.is_empty() {
                    error!(
                        jobs = ?orphaned,
                        "Ingest rolled back after dispatching cut jobs"
                    );
                }
                Err(store_err(e))
            }
        }
    }

    /// Turns one raw line into a record ready to persist, or `None` if the
    /// line produces no record.
    async fn process_line(
        &self,
        filename: &str,
        line_number: u64,
        raw: &[u8],
        report: &mut IngestReport,
    ) -> Option<MediaRow> {
        if strip_line_terminator(raw)
            .iter()
            .all(|b| b.is_ascii_whitespace())
        {
            report.blank_lines += 1;
            return None;
        }

        let fields = match extract_fields(raw) {
            Ok(fields) => fields,
            Err(e) => {
                warn!(line = line_number, error = %e, "Skipping unreadable line");
                report.skipped.push(SkippedLine {
                    line_number,
                    reason: e.to_string(),
                });
                return None;
            }
        };

        let now = Utc::now().to_rfc3339();
        let mut row = MediaRow {
            id: Uuid::new_v4().to_string(),
            start_time: fields.start_time.clone(),
            end_time: fields.end_time.clone(),
            title: fields.title.clone(),
            duration: fields.duration.clone(),
            reconcile_key: fields.reconcile_key.clone(),
            job_id: None,
            status: MediaStatus::NotSent,
            error: None,
            source_file: filename.to_string(),
            line_number,
            created_at: now.clone(),
            updated_at: now,
        };

        let secs = match duration_in_seconds(&fields.duration) {
            Ok(secs) => secs,
            Err(e) => {
                warn!(line = line_number, error = %e, "Rejecting record with bad duration");
                row.status = MediaStatus::Rejected;
                row.error = Some(e.to_string());
                return Some(row);
            }
        };

        if route(secs, self.config.cut_threshold_secs) == Routing::Skip {
            debug!(line = line_number, duration_secs = secs, "Below cut threshold");
            return Some(row);
        }

        let request = CutRequest::from_fields(&fields, &self.config.target_path);
        match submit_with_retry(self.service.as_ref(), &request, self.config.retry).await {
            Ok(handle) => {
                info!(
                    line = line_number,
                    job_id = %handle.job_id,
                    state = ?handle.initial_state,
                    duration_secs = secs,
                    "Cut job dispatched"
                );
                // Terminal outcomes are applied by the reconcile loop only.
                if handle.initial_state.is_terminal() {
                    debug!(
                        job_id = %handle.job_id,
                        "Cut job already finished at submit, left for reconciliation"
                    );
                }
                row.status = MediaStatus::Pending;
                row.job_id = Some(handle.job_id);
            }
            Err(e) => {
                error!(line = line_number, error = %e, "Cut dispatch failed");
                row.status = MediaStatus::DispatchFailed;
                row.error = Some(e.to_string());
            }
        }

        Some(row)
    }
}

/// Marks a file as being ingested for as long as the guard lives.
struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<PathBuf>>,
    key: PathBuf,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(set: &'a Mutex<HashSet<PathBuf>>, path: &Path) -> Result<Self, IngestError> {
        let key = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let mut files = set.lock().unwrap_or_else(|p| p.into_inner());
        if !files.insert(key.clone()) {
            return Err(IngestError::AlreadyInFlight(path.to_path_buf()));
        }
        Ok(Self { set, key })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut files = self.set.lock().unwrap_or_else(|p| p.into_inner());
        files.remove(&self.key);
    }
}
