//! Isolated environment for integration tests: a temp watch directory, a
//! temp database and an `App` wired to a `FakeCutService`.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use asrun::config::Config;
use asrun::db::media_repo::{self, MediaRow};
use asrun::{App, Database, HttpCutService, MediaStatus};

use super::builders::{file_content, ConfigBuilder};
use super::fake_service::FakeCutService;

pub struct TestHarness {
    temp_dir: TempDir,
    pub watch_dir: PathBuf,
    pub service: FakeCutService,
    pub app: App,
}

impl TestHarness {
    pub async fn new() -> Self {
        Self::with_config(|builder| builder).await
    }

    /// Builds the harness after letting `customize` adjust the config.
    pub async fn with_config<F>(customize: F) -> Self
    where
        F: FnOnce(ConfigBuilder) -> ConfigBuilder,
    {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let watch_dir = temp_dir.path().join("monitored");
        std::fs::create_dir_all(&watch_dir).expect("Failed to create watch dir");

        let service = FakeCutService::start().await;
        let mut config: Config = customize(ConfigBuilder::new(&service.base_url))
            .watch_directory(&watch_dir)
            .build();
        config.database_path = Some(temp_dir.path().join("asrun.db").display().to_string());

        let db = Database::open(&config.database_path().expect("database path"))
            .expect("Failed to open database");
        let client = HttpCutService::new(&config.cut_service).expect("Failed to build client");
        let app = App::with_parts(config, db, Arc::new(client));

        Self {
            temp_dir,
            watch_dir,
            service,
            app,
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes an as-run file into the watch directory.
    pub fn write_log(&self, name: &str, lines: &[String]) -> PathBuf {
        let path = self.watch_dir.join(name);
        std::fs::write(&path, file_content(lines)).expect("Failed to write log");
        path
    }

    pub fn records(&self, path: &Path) -> Vec<MediaRow> {
        let mut rows = media_repo::find_by_source_file(self.app.database(), &path.display().to_string())
            .expect("query records");
        rows.sort_by_key(|r| r.line_number);
        rows
    }

    pub fn count(&self, status: MediaStatus) -> u64 {
        media_repo::count_by_status(self.app.database(), status).expect("count records")
    }

    /// Polls `condition` every 20ms until it holds or `timeout` elapses.
    pub async fn wait_for<F>(&self, timeout: Duration, mut condition: F) -> bool
    where
        F: FnMut() -> bool,
    {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if condition() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        condition()
    }
}
