//! Builders for test configs and as-run log content.

#![allow(dead_code)]

use asrun::config::{Config, CutServiceConfig, ReconcileConfig};
use asrun::record::extract::{DURATION, END_TIME, RECONCILE_KEY, START_TIME, TITLE};

/// Builder for `Config` instances.
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new(base_url: &str) -> Self {
        Self {
            config: Config {
                version: "1.0".to_string(),
                watch_directory: "/tmp/asrun".to_string(),
                file_suffix: ".txt".to_string(),
                database_path: None,
                header_lines: 8,
                cut_threshold_secs: 30,
                settle_delay_ms: 200,
                cut_service: CutServiceConfig {
                    base_url: base_url.to_string(),
                    connect_timeout_secs: 1,
                    request_timeout_secs: 2,
                    max_dispatch_retries: 0,
                    retry_base_delay_ms: 10,
                    ..CutServiceConfig::default()
                },
                reconcile: ReconcileConfig {
                    interval_secs: 1,
                    max_concurrent_polls: 4,
                },
            },
        }
    }

    pub fn watch_directory(mut self, dir: &std::path::Path) -> Self {
        self.config.watch_directory = dir.display().to_string();
        self
    }

    pub fn max_dispatch_retries(mut self, retries: u32) -> Self {
        self.config.cut_service.max_dispatch_retries = retries;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

fn put(line: &mut [u8], range: std::ops::Range<usize>, value: &str) {
    let bytes = value.as_bytes();
    let len = bytes.len().min(range.len());
    line[range.start..range.start + len].copy_from_slice(&bytes[..len]);
}

/// Builds one fixed-width as-run line.
pub struct AsrunLineBuilder {
    start_time: String,
    end_time: String,
    title: String,
    duration: String,
    reconcile_key: String,
}

impl AsrunLineBuilder {
    pub fn new(title: &str) -> Self {
        Self {
            start_time: "2026-10-15 06:00:00:00".to_string(),
            end_time: "2026-10-15 06:01:05:00".to_string(),
            title: title.to_string(),
            duration: "00:00:10:00".to_string(),
            reconcile_key: format!("RK-{}", title.replace(' ', "-")),
        }
    }

    pub fn duration(mut self, duration: &str) -> Self {
        self.duration = duration.to_string();
        self
    }

    pub fn build(self) -> String {
        let mut line = vec![b' '; RECONCILE_KEY.end];
        put(&mut line, START_TIME, &self.start_time);
        put(&mut line, END_TIME, &self.end_time);
        put(&mut line, TITLE, &self.title);
        put(&mut line, DURATION, &self.duration);
        put(&mut line, RECONCILE_KEY, &self.reconcile_key);
        String::from_utf8(line).expect("builder writes ASCII only")
    }
}

/// The eight header lines every as-run file starts with.
pub fn header_lines() -> Vec<String> {
    let mut lines = vec![
        "AS-RUN LOG".to_string(),
        "CHANNEL: TEST-1".to_string(),
        "DATE: 2026-10-15".to_string(),
    ];
    lines.extend((4..=8).map(|i| format!("HEADER {}", i)));
    lines
}

/// Joins lines with `\n`, terminating the last one too.
pub fn file_content(lines: &[String]) -> String {
    let mut content = lines.join("\n");
    content.push('\n');
    content
}
