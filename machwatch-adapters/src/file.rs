//! File-backed fetcher.
//!
//! Reads a stats payload from a JSON file on every fetch. Useful for replaying
//! a captured response without a running backend.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use machwatch_types::{RawSnapshot, TimeWindow};

use crate::{FetchError, SnapshotFetcher};

/// A fetcher that returns the snapshot stored in a JSON file.
///
/// The file is re-read on every call so edits show up on the next tick. The
/// requested window is ignored.
#[derive(Debug)]
pub struct FileFetcher {
    path: PathBuf,
    description: String,
}

impl FileFetcher {
    /// Create a new file fetcher for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self { path, description }
    }

    /// Returns the path being read.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SnapshotFetcher for FileFetcher {
    async fn fetch(&self, window: TimeWindow) -> Result<RawSnapshot, FetchError> {
        debug!(path = %self.path.display(), start = window.start_secs(), "reading stats file");
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| FetchError::Connection(format!("Read error: {}", e)))?;
        Ok(serde_json::from_str(&content)?)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn window() -> TimeWindow {
        TimeWindow::new(0, 30_000, 5000).unwrap()
    }

    #[tokio::test]
    async fn test_file_fetcher_reads_snapshot() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"load": [0.5, 1.5], "network": {{"eth0": {{"tx": [1]}}}}}}"#).unwrap();
        file.flush().unwrap();

        let fetcher = FileFetcher::new(file.path());
        let snapshot = fetcher.fetch(window()).await.unwrap();

        assert_eq!(snapshot.load, Some(vec![0.5, 1.5]));
        assert_eq!(snapshot.interface_names().collect::<Vec<_>>(), vec!["eth0"]);
    }

    #[tokio::test]
    async fn test_file_fetcher_missing_file() {
        let fetcher = FileFetcher::new("/nonexistent/stats.json");
        let err = fetcher.fetch(window()).await.unwrap_err();
        assert!(matches!(err, FetchError::Connection(_)));
    }

    #[tokio::test]
    async fn test_file_fetcher_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        file.flush().unwrap();

        let err = FileFetcher::new(file.path()).fetch(window()).await.unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[test]
    fn test_file_fetcher_description() {
        let fetcher = FileFetcher::new("/tmp/stats.json");
        assert_eq!(fetcher.description(), "file: /tmp/stats.json");
        assert_eq!(fetcher.path(), Path::new("/tmp/stats.json"));
    }
}
