use crate::config::Config;
use crate::dispatch::RetryPolicy;

pub struct IngestConfig {
    /// Lines skipped on a fresh store with no cursor.
    pub header_lines: u64,
    pub cut_threshold_secs: u32,
    /// Destination path sent with every cut request.
    pub target_path: String,
    pub retry: RetryPolicy,
}

impl IngestConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            header_lines: config.header_lines,
            cut_threshold_secs: config.cut_threshold_secs,
            target_path: config.cut_service.target_path.clone(),
            retry: config.cut_service.retry_policy(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            header_lines: 8,
            cut_threshold_secs: 30,
            target_path: "./processed".to_string(),
            retry: RetryPolicy::none(),
        }
    }
}
