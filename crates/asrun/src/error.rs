use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AsrunError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] crate::dispatch::DispatchError),

    #[error("Poll error: {0}")]
    Poll(#[from] crate::dispatch::PollError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },
}

/// Run-level ingestion failures. Per-line problems never surface here; they
/// are recorded on the line's record or counted in the run report.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Ingest already in progress for '{0}'")]
    AlreadyInFlight(PathBuf),

    #[error("Failed to read '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to persist ingest of '{path}': {source}")]
    Store {
        path: PathBuf,
        #[source]
        source: crate::db::DatabaseError,
    },
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Watch error: {0}")]
    WatchError(String),

    #[error("Directory scan failed for '{path}': {source}")]
    ScanFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Worker channel closed unexpectedly")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, AsrunError>;
