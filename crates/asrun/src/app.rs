//! Wires the store, cut service, ingestion pipeline and reconcile loop
//! together and runs watch mode.

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::db::Database;
use crate::dispatch::{CutService, HttpCutService};
use crate::error::{ConfigError, IngestError, Result, WorkerError};
use crate::ingest::{IngestConfig, IngestPipeline};
use crate::reconcile::{ReconcileScheduler, Reconciler};
use crate::sanitize::{redact_path, redact_url};
use crate::worker::DirectoryScanner;

pub struct App {
    config: Config,
    db: Database,
    pipeline: Arc<IngestPipeline>,
    scheduler: Arc<ReconcileScheduler>,
}

impl App {
    /// Opens the configured database and connects to the HTTP cut service.
    pub fn from_config(config: Config) -> Result<Self> {
        let db_path = config
            .database_path()
            .ok_or_else(|| ConfigError::Validation {
                message: "database_path is not set and no home directory was found".to_string(),
            })?;
        let db = Database::open(&db_path)?;
        let service = HttpCutService::new(&config.cut_service)?;

        info!(
            cut_service = %redact_url(service.base_url()),
            database = %db_path.display(),
            "Cut service client ready"
        );

        Ok(Self::with_parts(config, db, Arc::new(service)))
    }

    /// Builds the app around an already opened store and service.
    pub fn with_parts(config: Config, db: Database, service: Arc<dyn CutService>) -> Self {
        let reconciler = Arc::new(Reconciler::new(
            db.clone(),
            Arc::clone(&service),
            config.reconcile.max_concurrent_polls,
        ));
        let scheduler = Arc::new(ReconcileScheduler::new(
            reconciler,
            config.reconcile.interval(),
        ));
        let pipeline = Arc::new(
            IngestPipeline::new(IngestConfig::from_config(&config), db.clone(), service)
                .with_scheduler(Arc::clone(&scheduler)),
        );

        Self {
            config,
            db,
            pipeline,
            scheduler,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn pipeline(&self) -> &Arc<IngestPipeline> {
        &self.pipeline
    }

    pub fn scheduler(&self) -> &Arc<ReconcileScheduler> {
        &self.scheduler
    }

    /// Resumes reconciliation of jobs left `PENDING` by a previous process.
    pub fn resume_pending(&self) -> bool {
        self.scheduler.ensure_running()
    }

    /// Watches the configured directory until `shutdown` is set, ingesting
    /// each newly created file. With `scan_existing`, files already present
    /// are queued first, in name order.
    pub async fn watch(&self, scan_existing: bool, shutdown: Arc<AtomicBool>) -> Result<()> {
        let scanner = DirectoryScanner::new(&self.config.watch_directory, &self.config.file_suffix);
        let (tx, mut rx) = mpsc::unbounded_channel::<PathBuf>();

        if scan_existing {
            for path in scanner.scan()? {
                tx.send(path).map_err(|_| WorkerError::ChannelClosed)?;
            }
        }

        self.resume_pending();

        let watcher = tokio::task::spawn_blocking(move || {
            scanner.watch(
                move |path| {
                    let _ = tx.send(path);
                },
                shutdown,
            )
        });

        let settle = self.config.settle_delay();
        let mut runs = JoinSet::new();
        while let Some(path) = rx.recv().await {
            let pipeline = Arc::clone(&self.pipeline);
            runs.spawn(async move {
                tokio::time::sleep(settle).await;
                match pipeline.ingest(&path).await {
                    Ok(report) => info!(
                        file = %redact_path(&path),
                        records = report.records_created(),
                        pending = report.pending,
                        "Ingest finished"
                    ),
                    Err(e @ IngestError::AlreadyInFlight(_)) => warn!("{}", e),
                    Err(e) => error!(file = %redact_path(&path), error = %e, "Ingest failed"),
                }
            });

            // Reap finished runs so the set does not grow without bound.
            while runs.try_join_next().is_some() {}
        }

        while runs.join_next().await.is_some() {}

        let watch_result = watcher
            .await
            .map_err(|e| WorkerError::WatchError(e.to_string()))?;
        self.scheduler.stop().await;
        watch_result?;

        info!("Watch mode stopped");
        Ok(())
    }
}
