//! File and folder stats produced by a scan.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{ScanError, ScanResult};

/// Size of a single non-directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileStat {
    path: PathBuf,
    size: u64,
}

impl FileStat {
    /// Create a new file stat. Fails if `path` is empty.
    pub fn new(path: impl Into<PathBuf>, size: u64) -> ScanResult<Self> {
        let path = require_path(path.into())?;
        Ok(Self { path, size })
    }

    /// Path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }
}

impl fmt::Display for FileStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileStat: path='{}', size={}", self.path.display(), self.size)
    }
}

/// Aggregate size of a directory and everything reachable below it.
///
/// The size is always the sum of the children's sizes; it is computed here
/// and cannot be set independently. Children keep the order they were
/// handed in, which is the directory listing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderStat {
    path: PathBuf,
    size: u64,
    children: Box<[Stats]>,
}

impl FolderStat {
    /// Create a folder stat from its children.
    ///
    /// Fails if `path` is empty or the children's sizes overflow a `u64`.
    pub fn new(path: impl Into<PathBuf>, children: Vec<Stats>) -> ScanResult<Self> {
        let path = require_path(path.into())?;
        let size = children
            .iter()
            .try_fold(0u64, |total, child| total.checked_add(child.size()))
            .ok_or_else(|| {
                ScanError::invalid_argument(format!(
                    "size of {} overflows u64",
                    path.display()
                ))
            })?;
        Ok(Self {
            path,
            size,
            children: children.into_boxed_slice(),
        })
    }

    /// Path of the folder.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Total size in bytes of all files below this folder.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Direct children in listing order.
    pub fn children(&self) -> &[Stats] {
        &self.children
    }

    /// Number of files in this subtree.
    pub fn file_count(&self) -> u64 {
        self.descendants().filter(|s| s.is_file()).count() as u64
    }

    /// Number of folders in this subtree, not counting this one.
    pub fn dir_count(&self) -> u64 {
        self.descendants().filter(|s| s.is_folder()).count() as u64
    }

    /// Depth-first, pre-order iterator over every node below this folder.
    pub fn descendants(&self) -> StatsIter<'_> {
        StatsIter {
            stack: self.children.iter().rev().collect(),
        }
    }
}

impl fmt::Display for FolderStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FolderStat: path='{}', size={}", self.path.display(), self.size)
    }
}

/// A node in a stats tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Stats {
    File(FileStat),
    Folder(FolderStat),
}

impl Stats {
    pub fn path(&self) -> &Path {
        match self {
            Stats::File(file) => file.path(),
            Stats::Folder(folder) => folder.path(),
        }
    }

    pub fn size(&self) -> u64 {
        match self {
            Stats::File(file) => file.size(),
            Stats::Folder(folder) => folder.size(),
        }
    }

    /// Children of this node; always empty for files.
    pub fn children(&self) -> &[Stats] {
        match self {
            Stats::File(_) => &[],
            Stats::Folder(folder) => folder.children(),
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Stats::File(_))
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Stats::Folder(_))
    }
}

impl From<FileStat> for Stats {
    fn from(file: FileStat) -> Self {
        Stats::File(file)
    }
}

impl From<FolderStat> for Stats {
    fn from(folder: FolderStat) -> Self {
        Stats::Folder(folder)
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stats::File(file) => fmt::Display::fmt(file, f),
            Stats::Folder(folder) => fmt::Display::fmt(folder, f),
        }
    }
}

/// Pre-order traversal over a stats tree.
pub struct StatsIter<'a> {
    stack: Vec<&'a Stats>,
}

impl<'a> Iterator for StatsIter<'a> {
    type Item = &'a Stats;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}

fn require_path(path: PathBuf) -> ScanResult<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(ScanError::invalid_argument("path cannot be empty"));
    }
    Ok(path)
}
