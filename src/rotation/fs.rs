//! Filesystem capability used by log rotation.
//!
//! # Responsibilities
//! - Stat, rename, recreate, list and remove files
//! - Keep rotation logic independent of the storage backend
//!
//! # Design Decisions
//! - Synchronous `std::io` signatures; a rotation pass is sequential
//! - Directory listing takes a filter so callers only see candidate names

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;

/// Subset of file metadata the rotator needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    /// File length in bytes.
    pub len: u64,
    /// Whether the path is a regular file.
    pub is_file: bool,
}

/// A directory entry as seen by a listing filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    /// File name without its directory.
    pub name: String,
    /// Whether the entry is a regular file.
    pub is_file: bool,
}

/// Narrow filesystem interface for log rotation.
pub trait Filesystem: Send + Sync {
    /// Stat a path. A missing file yields `io::ErrorKind::NotFound`.
    fn stat(&self, path: &Path) -> io::Result<FileStat>;

    /// Rename `from` to `to`.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Create `path` if missing and open it for appending (mode 0666).
    fn create_append(&self, path: &Path) -> io::Result<()>;

    /// List the names of entries in `dir` accepted by `filter`.
    fn list_dir(
        &self,
        dir: &Path,
        filter: &dyn Fn(&DirEntryInfo) -> bool,
    ) -> io::Result<Vec<String>>;

    /// Remove a file.
    fn remove(&self, path: &Path) -> io::Result<()>;
}

/// [`Filesystem`] backed by the local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFilesystem;

impl Filesystem for OsFilesystem {
    fn stat(&self, path: &Path) -> io::Result<FileStat> {
        let metadata = fs::metadata(path)?;
        Ok(FileStat {
            len: metadata.len(),
            is_file: metadata.is_file(),
        })
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn create_append(&self, path: &Path) -> io::Result<()> {
        let mut options = OpenOptions::new();
        options.create(true).append(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o666);
        }

        options.open(path).map(drop)
    }

    fn list_dir(
        &self,
        dir: &Path,
        filter: &dyn Fn(&DirEntryInfo) -> bool,
    ) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            // Non UTF-8 names can never match a rotated log name.
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            let info = DirEntryInfo {
                name,
                is_file: entry.file_type()?.is_file(),
            };
            if filter(&info) {
                names.push(info.name);
            }
        }
        Ok(names)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}

/// In-memory filesystem with failure injection, for rotation tests.
#[cfg(test)]
pub(crate) mod memory {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    pub(crate) struct MemoryFilesystem {
        files: Mutex<BTreeMap<PathBuf, u64>>,
        dirs: Mutex<BTreeSet<PathBuf>>,
        pub(crate) stat_error: Mutex<Option<io::ErrorKind>>,
        pub(crate) rename_error: Mutex<Option<io::ErrorKind>>,
        pub(crate) create_error: Mutex<Option<io::ErrorKind>>,
        pub(crate) list_error: Mutex<Option<io::ErrorKind>>,
        pub(crate) remove_errors: Mutex<BTreeSet<PathBuf>>,
        pub(crate) removed: Mutex<Vec<PathBuf>>,
    }

    impl MemoryFilesystem {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn write(&self, path: impl Into<PathBuf>, len: u64) {
            self.files.lock().unwrap().insert(path.into(), len);
        }

        pub(crate) fn mkdir(&self, path: impl Into<PathBuf>) {
            self.dirs.lock().unwrap().insert(path.into());
        }

        pub(crate) fn len(&self, path: &Path) -> Option<u64> {
            self.files.lock().unwrap().get(path).copied()
        }

        pub(crate) fn paths(&self) -> Vec<PathBuf> {
            self.files.lock().unwrap().keys().cloned().collect()
        }

        fn injected(slot: &Mutex<Option<io::ErrorKind>>) -> io::Result<()> {
            match *slot.lock().unwrap() {
                Some(kind) => Err(io::Error::new(kind, "injected failure")),
                None => Ok(()),
            }
        }
    }

    impl Filesystem for MemoryFilesystem {
        fn stat(&self, path: &Path) -> io::Result<FileStat> {
            Self::injected(&self.stat_error)?;
            match self.files.lock().unwrap().get(path) {
                Some(len) => Ok(FileStat {
                    len: *len,
                    is_file: true,
                }),
                None => Err(io::Error::new(io::ErrorKind::NotFound, "no such file")),
            }
        }

        fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
            Self::injected(&self.rename_error)?;
            let mut files = self.files.lock().unwrap();
            let len = files
                .remove(from)
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))?;
            files.insert(to.to_path_buf(), len);
            Ok(())
        }

        fn create_append(&self, path: &Path) -> io::Result<()> {
            Self::injected(&self.create_error)?;
            self.files
                .lock()
                .unwrap()
                .entry(path.to_path_buf())
                .or_insert(0);
            Ok(())
        }

        fn list_dir(
            &self,
            dir: &Path,
            filter: &dyn Fn(&DirEntryInfo) -> bool,
        ) -> io::Result<Vec<String>> {
            Self::injected(&self.list_error)?;
            let files = self.files.lock().unwrap();
            let dirs = self.dirs.lock().unwrap();
            let entries = files
                .keys()
                .map(|p| (p, true))
                .chain(dirs.iter().map(|p| (p, false)));

            let mut names = Vec::new();
            for (path, is_file) in entries {
                if path.parent() != Some(dir) {
                    continue;
                }
                let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                let info = DirEntryInfo {
                    name: name.to_string(),
                    is_file,
                };
                if filter(&info) {
                    names.push(info.name);
                }
            }
            Ok(names)
        }

        fn remove(&self, path: &Path) -> io::Result<()> {
            if self.remove_errors.lock().unwrap().contains(path) {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    format!("cannot remove {}", path.display()),
                ));
            }
            self.files
                .lock()
                .unwrap()
                .remove(path)
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))?;
            self.removed.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }
}
