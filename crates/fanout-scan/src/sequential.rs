//! Single-threaded baseline analyzer.

use std::path::Path;
use std::sync::Arc;

use fanout_core::{FileStat, FolderStat, ScanError, ScanResult, Stats, Strategy};
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::analyzer::Analyzer;
use crate::fs::{FileSystem, LocalFs, ensure_dir};

/// Walks the tree on one thread of control, in listing order.
///
/// Used as the correctness oracle for the concurrent analyzer. Clones share
/// the filesystem and the cancellation state.
pub struct SequentialAnalyzer<F: FileSystem = LocalFs> {
    fs: Arc<F>,
    shutdown: CancellationToken,
}

impl SequentialAnalyzer<LocalFs> {
    /// Create an analyzer over the local filesystem.
    pub fn new() -> Self {
        Self::with_fs(LocalFs)
    }
}

impl Default for SequentialAnalyzer<LocalFs> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FileSystem> Clone for SequentialAnalyzer<F> {
    fn clone(&self) -> Self {
        Self {
            fs: Arc::clone(&self.fs),
            shutdown: self.shutdown.clone(),
        }
    }
}

impl<F: FileSystem> SequentialAnalyzer<F> {
    /// Create an analyzer over a custom filesystem.
    pub fn with_fs(fs: F) -> Self {
        Self {
            fs: Arc::new(fs),
            shutdown: CancellationToken::new(),
        }
    }

    /// Analyze `folder` on the calling thread.
    pub fn analyze_folder_blocking(&self, folder: &Path) -> ScanResult<FolderStat> {
        debug!(root = %folder.display(), "analyzing sequentially");
        self.check_cancelled()?;
        ensure_dir(&*self.fs, folder)?;
        let result = self.walk(folder);
        if let Some(err) = result.as_ref().err().filter(|e| e.is_io_failure()) {
            warn!(error = %err, "scan aborted");
        }
        result
    }

    /// Stop in-flight scans at the next entry. Scans started afterwards fail
    /// with [`ScanError::Cancelled`] immediately.
    pub fn cancel(&self) {
        self.shutdown.cancel();
    }

    fn check_cancelled(&self) -> ScanResult<()> {
        if self.shutdown.is_cancelled() {
            return Err(ScanError::Cancelled);
        }
        Ok(())
    }

    fn walk(&self, folder: &Path) -> ScanResult<FolderStat> {
        let entries = self
            .fs
            .list_dir(folder)
            .map_err(|e| ScanError::io(folder, e))?;

        let mut children = Vec::with_capacity(entries.len());
        for entry in entries.into_iter().filter(|e| !e.is_symlink()) {
            self.check_cancelled()?;
            let child: Stats = if entry.is_dir() {
                self.walk(&entry.path)?.into()
            } else {
                self.analyze_file(&entry.path)?.into()
            };
            children.push(child);
        }

        trace!(path = %folder.display(), children = children.len(), "folder analyzed");
        FolderStat::new(folder, children)
    }

    fn analyze_file(&self, file: &Path) -> ScanResult<FileStat> {
        let size = self.fs.file_size(file).map_err(|e| ScanError::io(file, e))?;
        FileStat::new(file, size)
    }
}

impl<F: FileSystem> Analyzer for SequentialAnalyzer<F> {
    fn strategy(&self) -> Strategy {
        Strategy::Single
    }

    fn analyze_folder<'a>(&'a self, folder: &'a Path) -> BoxFuture<'a, ScanResult<FolderStat>> {
        let analyzer = self.clone();
        let folder = folder.to_path_buf();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || analyzer.analyze_folder_blocking(&folder))
                .await
                .unwrap_or_else(|e| {
                    Err(ScanError::TaskPanicked {
                        message: e.to_string(),
                    })
                })
        })
    }

    fn cancel(&self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir(root.join("dir1")).unwrap();
        fs::create_dir(root.join("dir2")).unwrap();
        fs::create_dir(root.join("dir1/subdir")).unwrap();

        fs::write(root.join("file1.txt"), "hello").unwrap();
        fs::write(root.join("dir1/file2.txt"), "world world world").unwrap();
        fs::write(root.join("dir1/subdir/file3.txt"), "test").unwrap();
        fs::write(root.join("dir2/file4.txt"), "another file here").unwrap();

        temp
    }

    #[test]
    fn test_basic_scan() {
        let temp = create_test_tree();
        let stats = SequentialAnalyzer::new()
            .analyze_folder_blocking(temp.path())
            .unwrap();

        assert_eq!(stats.size(), 5 + 17 + 4 + 17);
        assert_eq!(stats.file_count(), 4);
        assert_eq!(stats.dir_count(), 3);
        assert_eq!(stats.path(), temp.path());
    }

    #[test]
    fn test_children_keep_listing_order() {
        let temp = create_test_tree();
        let stats = SequentialAnalyzer::new()
            .analyze_folder_blocking(temp.path())
            .unwrap();

        let listed: Vec<_> = LocalFs
            .list_dir(temp.path())
            .unwrap()
            .into_iter()
            .map(|e| e.path)
            .collect();
        let analyzed: Vec<_> = stats
            .children()
            .iter()
            .map(|c| c.path().to_path_buf())
            .collect();
        assert_eq!(listed, analyzed);
    }

    #[test]
    fn test_missing_root() {
        let temp = TempDir::new().unwrap();
        let result = SequentialAnalyzer::new().analyze_folder_blocking(&temp.path().join("nope"));
        assert!(matches!(result, Err(ScanError::NotFound { .. })));
    }

    #[test]
    fn test_cancelled_analyzer_refuses_work() {
        let temp = create_test_tree();
        let analyzer = SequentialAnalyzer::new();
        analyzer.clone().cancel();

        let result = analyzer.analyze_folder_blocking(temp.path());
        assert!(matches!(result, Err(ScanError::Cancelled)));
    }

    #[tokio::test]
    async fn test_async_entry_point() {
        let temp = create_test_tree();
        let analyzer = SequentialAnalyzer::new();
        let stats = analyzer.analyze_folder(temp.path()).await.unwrap();
        assert_eq!(stats.size(), 43);
        assert_eq!(analyzer.analyzer_stats().tasks_created, None);
    }
}
