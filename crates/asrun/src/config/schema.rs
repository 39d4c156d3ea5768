use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dispatch::RetryPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    pub watch_directory: String,
    /// Only files whose name ends with this suffix are ingested.
    #[serde(default = "default_file_suffix")]
    pub file_suffix: String,
    /// SQLite file. Defaults to `~/.asrun/data/asrun.db`.
    #[serde(default)]
    pub database_path: Option<String>,
    /// Size of the fixed header region skipped when no cursor exists yet.
    #[serde(default = "default_header_lines")]
    pub header_lines: u64,
    /// Clips longer than this many seconds are sent for cutting.
    #[serde(default = "default_cut_threshold_secs")]
    pub cut_threshold_secs: u32,
    /// Wait after a file appears before reading it, so the writer can finish.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    pub cut_service: CutServiceConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

impl Config {
    pub fn database_path(&self) -> Option<PathBuf> {
        match &self.database_path {
            Some(path) => Some(PathBuf::from(path)),
            None => crate::db::default_database_path(),
        }
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

fn default_file_suffix() -> String {
    ".txt".to_string()
}

fn default_header_lines() -> u64 {
    8
}

fn default_cut_threshold_secs() -> u32 {
    30
}

fn default_settle_delay_ms() -> u64 {
    500
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CutServiceConfig {
    pub base_url: String,
    /// Destination path forwarded to the cut service with every job.
    #[serde(default = "default_target_path")]
    pub target_path: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_dispatch_retries")]
    pub max_dispatch_retries: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

impl CutServiceConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_dispatch_retries,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
        }
    }
}

impl Default for CutServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            target_path: default_target_path(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            max_dispatch_retries: default_max_dispatch_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

fn default_target_path() -> String {
    "./processed".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_dispatch_retries() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    500
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_max_concurrent_polls")]
    pub max_concurrent_polls: usize,
}

impl ReconcileConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            max_concurrent_polls: default_max_concurrent_polls(),
        }
    }
}

fn default_interval_secs() -> u64 {
    10
}

fn default_max_concurrent_polls() -> usize {
    8
}
