//! Task-count instrumentation.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free, monotonically increasing count of spawned tasks.
///
/// Increments are relaxed atomic adds, so any number of tasks can bump the
/// counter concurrently and readers never wait on in-flight scans.
#[derive(Debug, Default)]
pub struct TaskCounter {
    created: AtomicU64,
}

impl TaskCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one spawned task.
    pub fn increment(&self) {
        self.created.fetch_add(1, Ordering::Relaxed);
    }

    /// Tasks created so far.
    pub fn get(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }
}

/// Instrumentation snapshot exposed by an analyzer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalyzerStats {
    /// Tasks created over the analyzer's lifetime, for analyzers that spawn.
    pub tasks_created: Option<u64>,
}

impl fmt::Display for AnalyzerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tasks_created {
            Some(count) => write!(f, "Number of created tasks: {count}"),
            None => Ok(()),
        }
    }
}
