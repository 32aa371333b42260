//! Core types for fanout.
//!
//! This crate provides the data structures shared by the analyzers: the
//! stats tree, errors, configuration, the scan report, and [`TaskScope`],
//! the structured-concurrency primitive the fan-out analyzer is built on.

mod config;
mod error;
mod report;
pub mod scope;
mod stats;

pub use config::{AnalyzeConfig, AnalyzeConfigBuilder, Strategy};
pub use error::{ScanError, ScanResult};
pub use report::{ScanReport, ScanSummary};
pub use scope::{ScopeError, TaskScope};
pub use stats::{FileStat, FolderStat, Stats, StatsIter};
