//! One-task-per-entry analyzer built on [`TaskScope`].
//!
//! Every call to analyze a folder opens its own scope, spawns one task per
//! entry (a recursive folder analysis or a file stat), and joins the scope
//! before returning. The first failure anywhere in a subtree cancels that
//! subtree's scope, and the error travels upward unchanged, cancelling each
//! enclosing scope in turn.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use fanout_core::{FileStat, FolderStat, ScanError, ScanResult, Stats, Strategy, TaskScope};
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::analyzer::Analyzer;
use crate::counter::{AnalyzerStats, TaskCounter};
use crate::fs::{DirEntry, FileSystem, LocalFs, ensure_dir};

/// Analyzer that spawns one lightweight task per filesystem entry.
///
/// Fan-out is unbounded: a folder with ten thousand entries gets ten
/// thousand tasks. Blocking filesystem calls run on tokio's blocking pool.
pub struct StructuredAnalyzer<F: FileSystem = LocalFs> {
    walk: Walk<F>,
    shutdown: CancellationToken,
}

impl StructuredAnalyzer<LocalFs> {
    /// Create an analyzer over the local filesystem.
    pub fn new() -> Self {
        Self::with_fs(LocalFs)
    }
}

impl Default for StructuredAnalyzer<LocalFs> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FileSystem> StructuredAnalyzer<F> {
    /// Create an analyzer over a custom filesystem.
    pub fn with_fs(fs: F) -> Self {
        Self {
            walk: Walk {
                fs: Arc::new(fs),
                counter: Arc::new(TaskCounter::new()),
            },
            shutdown: CancellationToken::new(),
        }
    }

    /// Analyze `folder` and everything below it.
    ///
    /// The folder itself is analyzed in the caller's task; only its entries
    /// (and theirs, recursively) are spawned.
    pub async fn analyze(&self, folder: impl AsRef<Path>) -> ScanResult<FolderStat> {
        let folder = folder.as_ref().to_path_buf();
        debug!(root = %folder.display(), "analyzing with one task per entry");

        let root = folder.clone();
        self.walk
            .blocking(&self.shutdown, move |fs| ensure_dir(fs, &root))
            .await?;
        let result = self.walk.clone().analyze_folder(folder, self.shutdown.clone()).await;
        if let Some(err) = result.as_ref().err().filter(|e| e.is_io_failure()) {
            warn!(error = %err, "scan aborted");
        }
        result
    }

    /// Tasks spawned over this analyzer's lifetime.
    pub fn tasks_created(&self) -> u64 {
        self.walk.counter.get()
    }

    /// Cancel every in-flight scan. Scans started afterwards fail with
    /// [`ScanError::Cancelled`] immediately.
    pub fn cancel(&self) {
        self.shutdown.cancel();
    }
}

impl<F: FileSystem> Analyzer for StructuredAnalyzer<F> {
    fn strategy(&self) -> Strategy {
        Strategy::Virtual
    }

    fn analyze_folder<'a>(&'a self, folder: &'a Path) -> BoxFuture<'a, ScanResult<FolderStat>> {
        Box::pin(self.analyze(folder))
    }

    fn analyzer_stats(&self) -> AnalyzerStats {
        AnalyzerStats {
            tasks_created: Some(self.tasks_created()),
        }
    }

    fn cancel(&self) {
        self.shutdown.cancel();
    }
}

/// State shared by every task of a scan.
struct Walk<F> {
    fs: Arc<F>,
    counter: Arc<TaskCounter>,
}

impl<F> Clone for Walk<F> {
    fn clone(&self) -> Self {
        Self {
            fs: Arc::clone(&self.fs),
            counter: Arc::clone(&self.counter),
        }
    }
}

impl<F: FileSystem> Walk<F> {
    fn analyze_folder(
        self,
        folder: PathBuf,
        parent: CancellationToken,
    ) -> BoxFuture<'static, ScanResult<FolderStat>> {
        Box::pin(async move {
            let mut scope: TaskScope<Stats, ScanError> = TaskScope::new(&parent);

            let listed = folder.clone();
            let entries: Vec<DirEntry> = self
                .blocking(scope.token(), move |fs| {
                    fs.list_dir(&listed).map_err(|e| ScanError::io(&listed, e))
                })
                .await?;

            for entry in entries.into_iter().filter(|e| !e.is_symlink()) {
                let walk = self.clone();
                let token = scope.token().clone();
                let spawned = if entry.is_dir() {
                    scope.spawn(async move {
                        walk.analyze_folder(entry.path, token).await.map(Stats::from)
                    })
                } else {
                    scope.spawn(async move {
                        walk.analyze_file(entry.path, token).await.map(Stats::from)
                    })
                };
                if !spawned {
                    break;
                }
                self.counter.increment();
            }

            let children = scope.join().await?;
            trace!(path = %folder.display(), children = children.len(), "folder analyzed");
            FolderStat::new(folder, children)
        })
    }

    async fn analyze_file(self, file: PathBuf, token: CancellationToken) -> ScanResult<FileStat> {
        let stat = file.clone();
        let size = self
            .blocking(&token, move |fs| {
                fs.file_size(&stat).map_err(|e| ScanError::io(&stat, e))
            })
            .await?;
        FileStat::new(file, size)
    }

    /// Run a blocking filesystem call on the blocking pool.
    ///
    /// Cancellation is checked before queueing, again when a blocking thread
    /// picks the call up, and after it returns. Calls still queued when the
    /// scope is cancelled never touch the filesystem; a call already in
    /// progress runs to completion.
    async fn blocking<T, Op>(&self, token: &CancellationToken, op: Op) -> ScanResult<T>
    where
        T: Send + 'static,
        Op: FnOnce(&F) -> ScanResult<T> + Send + 'static,
    {
        if token.is_cancelled() {
            return Err(ScanError::Cancelled);
        }
        let fs = Arc::clone(&self.fs);
        let queued = token.clone();
        let result = tokio::task::spawn_blocking(move || {
            if queued.is_cancelled() {
                return Err(ScanError::Cancelled);
            }
            op(&*fs)
        })
        .await
        .map_err(join_failure)?;
        if token.is_cancelled() {
            return Err(ScanError::Cancelled);
        }
        result
    }
}

fn join_failure(error: tokio::task::JoinError) -> ScanError {
    if error.is_cancelled() {
        ScanError::Cancelled
    } else {
        ScanError::TaskPanicked {
            message: error.to_string(),
        }
    }
}
