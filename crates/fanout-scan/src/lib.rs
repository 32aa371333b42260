//! Directory analyzers for fanout.
//!
//! Two strategies compute the same [`FolderStat`] tree:
//!
//! - [`SequentialAnalyzer`] walks the tree on one thread of control and is
//!   the correctness baseline.
//! - [`StructuredAnalyzer`] spawns one task per filesystem entry, with a
//!   [`TaskScope`](fanout_core::TaskScope) per folder that joins every child
//!   before the folder's result is built, and aborts the whole scan on the
//!   first failure.
//!
//! Symbolic links are never followed and contribute nothing to a tree.
//!
//! # Example
//!
//! ```rust,no_run
//! use fanout_scan::{Analyzer, StructuredAnalyzer};
//!
//! # async fn demo() -> fanout_scan::ScanResult<()> {
//! let analyzer = StructuredAnalyzer::new();
//! let stats = analyzer.analyze("/path/to/scan").await?;
//!
//! println!("Total size: {} bytes", stats.size());
//! println!("{}", analyzer.analyzer_stats());
//! # Ok(())
//! # }
//! ```

mod analyzer;
mod counter;
pub mod fs;
mod sequential;
mod structured;

pub use analyzer::{Analyzer, analyzer_for};
pub use counter::{AnalyzerStats, TaskCounter};
pub use fs::{DirEntry, EntryKind, FileSystem, LocalFs};
pub use sequential::SequentialAnalyzer;
pub use structured::StructuredAnalyzer;

// Re-export core types for convenience
pub use fanout_core::{FileStat, FolderStat, ScanError, ScanResult, Stats, Strategy};
