//! Scan report and summary statistics.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use serde::Serialize;

use crate::config::Strategy;
use crate::stats::{FolderStat, Stats};

/// Summary statistics for a scanned tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    /// Total size in bytes.
    pub total_size: u64,
    /// Total number of files.
    pub total_files: u64,
    /// Total number of folders below the root.
    pub total_dirs: u64,
    /// Maximum depth reached (direct children of the root are at depth 1).
    pub max_depth: u32,
    /// Largest file (path, size).
    pub largest_file: Option<(PathBuf, u64)>,
}

impl ScanSummary {
    /// Compute the summary of a finished tree.
    pub fn from_tree(root: &FolderStat) -> Self {
        let mut summary = Self {
            total_size: root.size(),
            ..Self::default()
        };
        for child in root.children() {
            summary.record(child, 1);
        }
        summary
    }

    fn record(&mut self, node: &Stats, depth: u32) {
        self.max_depth = self.max_depth.max(depth);
        match node {
            Stats::File(file) => {
                self.total_files += 1;
                if self
                    .largest_file
                    .as_ref()
                    .is_none_or(|(_, size)| file.size() > *size)
                {
                    self.largest_file = Some((file.path().to_path_buf(), file.size()));
                }
            }
            Stats::Folder(folder) => {
                self.total_dirs += 1;
                for child in folder.children() {
                    self.record(child, depth + 1);
                }
            }
        }
    }
}

/// Complete result of one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    /// Root of the stats tree.
    pub root: FolderStat,

    /// Strategy that produced the tree.
    pub strategy: Strategy,

    /// When this scan finished.
    pub scanned_at: SystemTime,

    /// Wall-clock duration of the scan.
    pub elapsed: Duration,

    /// Tasks spawned by the analyzer so far, when it counts them.
    pub tasks_created: Option<u64>,

    /// Summary statistics.
    pub summary: ScanSummary,
}

impl ScanReport {
    /// Create a new report.
    pub fn new(
        root: FolderStat,
        strategy: Strategy,
        elapsed: Duration,
        tasks_created: Option<u64>,
    ) -> Self {
        let summary = ScanSummary::from_tree(&root);
        Self {
            root,
            strategy,
            scanned_at: SystemTime::now(),
            elapsed,
            tasks_created,
            summary,
        }
    }

    /// Get the total size of the tree.
    pub fn total_size(&self) -> u64 {
        self.root.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::FileStat;

    fn sample_tree() -> FolderStat {
        let deep = FolderStat::new("/r/c/e", vec![FileStat::new("/r/c/e/f", 2).unwrap().into()])
            .unwrap();
        let inner = FolderStat::new(
            "/r/c",
            vec![FileStat::new("/r/c/d", 5).unwrap().into(), deep.into()],
        )
        .unwrap();
        FolderStat::new(
            "/r",
            vec![
                FileStat::new("/r/a", 10).unwrap().into(),
                FileStat::new("/r/b", 20).unwrap().into(),
                inner.into(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_summary_default() {
        let summary = ScanSummary::default();
        assert_eq!(summary.total_size, 0);
        assert_eq!(summary.total_files, 0);
        assert_eq!(summary.total_dirs, 0);
        assert!(summary.largest_file.is_none());
    }

    #[test]
    fn test_summary_from_tree() {
        let summary = ScanSummary::from_tree(&sample_tree());
        assert_eq!(summary.total_size, 37);
        assert_eq!(summary.total_files, 4);
        assert_eq!(summary.total_dirs, 2);
        assert_eq!(summary.max_depth, 3);
        assert_eq!(summary.largest_file, Some((PathBuf::from("/r/b"), 20)));
    }

    #[test]
    fn test_report_carries_task_count() {
        let report = ScanReport::new(
            sample_tree(),
            Strategy::Virtual,
            Duration::from_millis(3),
            Some(6),
        );
        assert_eq!(report.total_size(), 37);
        assert_eq!(report.tasks_created, Some(6));
        assert_eq!(report.summary.total_files, 4);
    }
}
