use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use walkdir::WalkDir;

use crate::error::WorkerError;

/// Finds as-run logs in the watch directory (top level only).
pub struct DirectoryScanner {
    directory: PathBuf,
    suffix: String,
}

impl DirectoryScanner {
    pub fn new<P: AsRef<Path>>(directory: P, suffix: impl Into<String>) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            suffix: suffix.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Whether `path` names a file this scanner would ingest.
    pub fn matches(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(|name| name.ends_with(&self.suffix))
            .unwrap_or(false)
    }

    /// Lists matching files already present, ordered by file name.
    pub fn scan(&self) -> Result<Vec<PathBuf>, WorkerError> {
        if !self.directory.is_dir() {
            return Err(WorkerError::ScanFailed {
                path: self.directory.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            });
        }

        let files: Vec<PathBuf> = WalkDir::new(&self.directory)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| self.matches(p))
            .collect();

        info!(
            "Scanned {} as-run files in {}",
            files.len(),
            self.directory.display()
        );
        Ok(files)
    }

    /// Paths from a notify event that should trigger ingestion. Only file
    /// creation counts; later writes to the same file are ignored.
    pub fn created_files(&self, event: &Event) -> Vec<PathBuf> {
        if !matches!(event.kind, EventKind::Create(_)) {
            return Vec::new();
        }
        event
            .paths
            .iter()
            .filter(|p| self.matches(p) && !p.is_dir())
            .cloned()
            .collect()
    }

    /// Watches the directory and calls `callback` once per created file.
    ///
    /// Blocks until `shutdown` is set.
    pub fn watch<F>(&self, callback: F, shutdown: Arc<AtomicBool>) -> Result<(), WorkerError>
    where
        F: Fn(PathBuf) + Send + 'static,
    {
        let (tx, rx) = std::sync::mpsc::channel::<notify::Result<Event>>();

        let mut watcher =
            notify::recommended_watcher(tx).map_err(|e| WorkerError::WatchError(e.to_string()))?;
        watcher
            .watch(&self.directory, RecursiveMode::NonRecursive)
            .map_err(|e| WorkerError::WatchError(e.to_string()))?;

        info!(
            "Watching {} for *{} files",
            self.directory.display(),
            self.suffix
        );

        loop {
            if shutdown.load(Ordering::Relaxed) {
                info!("Watch mode shutting down...");
                break;
            }

            match rx.recv_timeout(Duration::from_millis(100)) {
                Ok(Ok(event)) => {
                    for path in self.created_files(&event) {
                        info!("New as-run file detected: {}", path.display());
                        callback(path);
                    }
                    debug!("Watch event: {:?}", event.kind);
                }
                Ok(Err(e)) => {
                    warn!("Watch error: {}", e);
                }
                Err(std::sync::mpsc::RecvTimeoutError::Timeout) => continue,
                Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                    error!("Watch channel disconnected");
                    return Err(WorkerError::ChannelClosed);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, ModifyKind};
    use tempfile::TempDir;

    fn event(kind: EventKind, path: PathBuf) -> Event {
        Event::new(kind).add_path(path)
    }

    #[test]
    fn test_scan_filters_by_suffix_and_sorts() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("20261016.txt"), b"b").unwrap();
        std::fs::write(dir.path().join("20261015.txt"), b"a").unwrap();
        std::fs::write(dir.path().join("notes.md"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("archive.txt")).unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("deep.txt"), b"x").unwrap();

        let scanner = DirectoryScanner::new(dir.path(), ".txt");
        let files = scanner.scan().unwrap();

        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["20261015.txt", "20261016.txt"]);
    }

    #[test]
    fn test_scan_missing_directory() {
        let dir = TempDir::new().unwrap();
        let scanner = DirectoryScanner::new(dir.path().join("missing"), ".txt");
        assert!(matches!(
            scanner.scan(),
            Err(WorkerError::ScanFailed { .. })
        ));
    }

    #[test]
    fn test_only_create_events_count() {
        let dir = TempDir::new().unwrap();
        let scanner = DirectoryScanner::new(dir.path(), ".txt");
        let path = dir.path().join("asrun.txt");

        let created = event(EventKind::Create(CreateKind::File), path.clone());
        assert_eq!(scanner.created_files(&created), vec![path.clone()]);

        let modified = event(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            path.clone(),
        );
        assert!(scanner.created_files(&modified).is_empty());

        let other_suffix = event(
            EventKind::Create(CreateKind::File),
            dir.path().join("asrun.log"),
        );
        assert!(scanner.created_files(&other_suffix).is_empty());
    }

    #[test]
    fn test_watch_reports_new_file() {
        let dir = TempDir::new().unwrap();
        let scanner = DirectoryScanner::new(dir.path(), ".txt");
        let shutdown = Arc::new(AtomicBool::new(false));
        let (found_tx, found_rx) = std::sync::mpsc::channel();

        let handle = {
            let shutdown = Arc::clone(&shutdown);
            std::thread::spawn(move || {
                scanner.watch(
                    move |path| {
                        let _ = found_tx.send(path);
                    },
                    shutdown,
                )
            })
        };

        // Give the watcher time to register.
        std::thread::sleep(Duration::from_millis(300));
        std::fs::write(dir.path().join("ignored.md"), b"x").unwrap();
        std::fs::write(dir.path().join("20261015.txt"), b"HEADER\n").unwrap();

        let found = found_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(found.ends_with("20261015.txt"));

        shutdown.store(true, Ordering::Relaxed);
        handle.join().unwrap().unwrap();
    }
}
