pub mod app;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod reconcile;
pub mod record;
pub mod sanitize;
pub mod worker;

pub use app::App;
pub use config::{load_config, Config};
pub use db::Database;
pub use dispatch::{CutService, HttpCutService};
pub use error::{AsrunError, ConfigError, IngestError, Result, WorkerError};
pub use ingest::{IngestPipeline, IngestReport};
pub use reconcile::{ReconcileScheduler, Reconciler, TickReport};
pub use record::MediaStatus;
