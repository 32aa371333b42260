//! The analyzer interface shared by both strategies.

use std::path::Path;

use fanout_core::{FolderStat, ScanResult, Strategy};
use futures::future::BoxFuture;

use crate::counter::AnalyzerStats;
use crate::sequential::SequentialAnalyzer;
use crate::structured::StructuredAnalyzer;

/// Computes a [`FolderStat`] tree for a directory.
pub trait Analyzer: Send + Sync {
    /// Strategy this analyzer implements.
    fn strategy(&self) -> Strategy;

    /// Analyze `folder` and everything below it.
    ///
    /// Symbolic links are skipped. The first I/O failure aborts the whole
    /// scan and is returned unchanged.
    fn analyze_folder<'a>(&'a self, folder: &'a Path) -> BoxFuture<'a, ScanResult<FolderStat>>;

    /// Instrumentation collected so far.
    fn analyzer_stats(&self) -> AnalyzerStats {
        AnalyzerStats::default()
    }

    /// Ask in-flight scans to stop. They end with
    /// [`ScanError::Cancelled`](fanout_core::ScanError::Cancelled), as does
    /// every scan started afterwards.
    fn cancel(&self);
}

/// Build an analyzer over the local filesystem.
pub fn analyzer_for(strategy: Strategy) -> Box<dyn Analyzer> {
    match strategy {
        Strategy::Single => Box::new(SequentialAnalyzer::new()),
        Strategy::Virtual => Box::new(StructuredAnalyzer::new()),
    }
}
