//! The filesystem operations the analyzers rely on.

use std::io;
use std::path::{Path, PathBuf};

use fanout_core::{ScanError, ScanResult};

/// Type of a directory entry, as reported by the listing itself.
///
/// Symbolic links are reported as [`EntryKind::Symlink`] and never resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Directory,
    File,
    Symlink,
    /// Sockets, fifos, devices. Analyzed like files.
    Other,
}

/// One immediate child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub path: PathBuf,
    pub kind: EntryKind,
}

impl DirEntry {
    pub fn new(path: impl Into<PathBuf>, kind: EntryKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_symlink(&self) -> bool {
        self.kind == EntryKind::Symlink
    }
}

/// Read-only view of a filesystem.
///
/// Every call is a single blocking read against a live filesystem; nothing
/// guarantees a consistent snapshot across calls.
pub trait FileSystem: Send + Sync + 'static {
    /// List the immediate children of `path`, in listing order.
    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    /// Whether `path` is a directory.
    fn is_dir(&self, path: &Path) -> io::Result<bool>;

    /// Size in bytes of the entry at `path`.
    fn file_size(&self, path: &Path) -> io::Result<u64>;
}

/// The local filesystem via `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl FileSystem for LocalFs {
    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let kind = if file_type.is_symlink() {
                EntryKind::Symlink
            } else if file_type.is_dir() {
                EntryKind::Directory
            } else if file_type.is_file() {
                EntryKind::File
            } else {
                EntryKind::Other
            };
            entries.push(DirEntry::new(entry.path(), kind));
        }
        Ok(entries)
    }

    fn is_dir(&self, path: &Path) -> io::Result<bool> {
        Ok(std::fs::metadata(path)?.is_dir())
    }

    fn file_size(&self, path: &Path) -> io::Result<u64> {
        Ok(std::fs::metadata(path)?.len())
    }
}

/// Fail with `NotADirectory` unless `path` is a directory.
pub(crate) fn ensure_dir<F: FileSystem + ?Sized>(fs: &F, path: &Path) -> ScanResult<()> {
    if fs.is_dir(path).map_err(|e| ScanError::io(path, e))? {
        Ok(())
    } else {
        Err(ScanError::NotADirectory {
            path: path.to_path_buf(),
        })
    }
}
