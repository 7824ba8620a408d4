//! Scheduled log rotation.
//!
//! # Responsibilities
//! - Rotate non-empty registered log files on a wall-clock aligned timer
//! - Prune rotated files beyond the retention count
//! - Invoke the reopen hook once per tick
//!
//! # Design Decisions
//! - The path list has its own mutex, held only to append or snapshot
//! - A start-once flag launches exactly one background loop
//! - Per-path failures are logged and never end the loop
//! - Stopping is terminal: registration fails afterwards

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::watch;

use crate::config::RotationConfig;
use crate::observability::metrics;
use crate::rotation::fs::{DirEntryInfo, Filesystem, OsFilesystem};
use crate::rotation::naming::{delay_until_next_tick, is_rotated_name, rotated_name, split_extension};

/// Error returned by a reopen hook.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Invoked after every rotation tick so writers can reopen their files.
pub type ReopenHook = Arc<dyn Fn() -> Result<(), HookError> + Send + Sync>;

/// Source of the current UTC time.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Errors that can occur during log rotation.
#[derive(Debug, Error)]
pub enum RotationError {
    /// The rotator was stopped and cannot accept new paths.
    #[error("cannot restart stopped log rotator")]
    Stopped,

    /// No Tokio runtime was available to run the rotation loop.
    #[error("no async runtime available for the rotation loop")]
    NoRuntime,

    /// A filesystem operation failed.
    #[error("failed to {op} {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RotationError {
    fn io(op: &'static str, path: &Path, source: io::Error) -> Self {
        RotationError::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Validated rotation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationSettings {
    /// Interval of the wall-clock grid ticks fall on.
    pub frequency: Duration,
    /// Number of rotated files kept per log.
    pub keep: usize,
}

impl From<&RotationConfig> for RotationSettings {
    fn from(config: &RotationConfig) -> Self {
        Self {
            frequency: config.frequency(),
            keep: config.keep as usize,
        }
    }
}

/// Rotates registered log files on a schedule.
///
/// Cloning yields another handle to the same rotator.
#[derive(Clone)]
pub struct LogRotator {
    inner: Arc<Inner>,
}

struct Inner {
    settings: RotationSettings,
    fs: Arc<dyn Filesystem>,
    clock: Clock,
    reopen: ReopenHook,
    paths: Mutex<Vec<PathBuf>>,
    loop_started: AtomicBool,
    stopped: AtomicBool,
    stop_tx: watch::Sender<bool>,
}

impl LogRotator {
    /// Create a rotator operating on the local disk.
    pub fn new(settings: RotationSettings, reopen: ReopenHook) -> Self {
        Self::with_parts(settings, Arc::new(OsFilesystem), Arc::new(Utc::now), reopen)
    }

    /// Create a rotator with an explicit filesystem and clock.
    pub fn with_parts(
        settings: RotationSettings,
        fs: Arc<dyn Filesystem>,
        clock: Clock,
        reopen: ReopenHook,
    ) -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                settings,
                fs,
                clock,
                reopen,
                paths: Mutex::new(Vec::new()),
                loop_started: AtomicBool::new(false),
                stopped: AtomicBool::new(false),
                stop_tx,
            }),
        }
    }

    /// Rotate `path` now, then keep rotating it on schedule.
    ///
    /// A log file that does not exist yet is not an error. The background
    /// loop is launched by the first successful registration. Outside a Tokio
    /// runtime this fails with `NoRuntime` before touching the file.
    pub fn register_and_start(&self, path: impl AsRef<Path>) -> Result<(), RotationError> {
        let path = path.as_ref();
        if self.is_stopped() {
            return Err(RotationError::Stopped);
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| RotationError::NoRuntime)?;

        tracing::info!(path = %path.display(), "Adding log file to rotation");

        self.inner.rotate_and_cleanup(path)?;
        self.inner.add_path(path.to_path_buf());
        self.ensure_loop(&runtime);
        Ok(())
    }

    /// Signal the rotation loop to stop. Never blocks.
    pub fn stop_all(&self) {
        self.inner.stop_tx.send_replace(true);
        tracing::debug!("Log rotation stop requested");
    }

    /// Whether the rotator was stopped or asked to stop.
    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::Acquire) || *self.inner.stop_tx.borrow()
    }

    /// Whether the background loop has exited.
    pub fn loop_exited(&self) -> bool {
        self.inner.stopped.load(Ordering::Acquire)
    }

    /// Snapshot of registered paths, in registration order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.inner.snapshot_paths()
    }

    /// Configured settings.
    pub fn settings(&self) -> RotationSettings {
        self.inner.settings
    }

    fn ensure_loop(&self, runtime: &tokio::runtime::Handle) {
        if self
            .inner
            .loop_started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            let inner = Arc::clone(&self.inner);
            let stop_rx = inner.stop_tx.subscribe();
            runtime.spawn(run_loop(inner, stop_rx));
        }
    }

    #[cfg(test)]
    fn rotate(&self, path: &Path) -> Result<bool, RotationError> {
        self.inner.rotate(path)
    }

    #[cfg(test)]
    fn cleanup(&self, path: &Path) -> Result<usize, RotationError> {
        self.inner.cleanup(path)
    }
}

async fn run_loop(inner: Arc<Inner>, mut stop_rx: watch::Receiver<bool>) {
    tracing::info!(
        frequency_secs = inner.settings.frequency.as_secs(),
        keep = inner.settings.keep,
        "Log rotation loop starting"
    );

    loop {
        if *stop_rx.borrow_and_update() {
            break;
        }

        let delay = delay_until_next_tick((inner.clock)(), inner.settings.frequency);
        tracing::debug!(delay_secs = delay.as_secs(), "Waiting for next rotation tick");

        tokio::select! {
            _ = tokio::time::sleep(delay) => {
                inner.rotate_all();
            }
            changed = stop_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    inner.stopped.store(true, Ordering::Release);
    tracing::info!("Log rotation loop stopped");
}

impl Inner {
    fn add_path(&self, path: PathBuf) {
        self.paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path);
    }

    fn snapshot_paths(&self) -> Vec<PathBuf> {
        self.paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// One scheduled pass over every registered path.
    fn rotate_all(&self) {
        let paths = self.snapshot_paths();
        tracing::debug!(count = paths.len(), "Rotation tick");

        for path in &paths {
            // Failures are logged inside.
            let _ = self.rotate_and_cleanup(path);
        }

        if let Err(e) = (self.reopen)() {
            tracing::error!(error = %e, "Failed to reopen logs");
            metrics::record_reopen_failure();
        }
    }

    /// Rotate, then prune if a rotation happened. Only rotation errors are
    /// returned.
    fn rotate_and_cleanup(&self, path: &Path) -> Result<(), RotationError> {
        let rotated = match self.rotate(path) {
            Ok(rotated) => rotated,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Error rotating log file");
                metrics::record_rotation_error();
                return Err(e);
            }
        };

        if rotated {
            if let Err(e) = self.cleanup(path) {
                tracing::warn!(path = %path.display(), error = %e, "Error cleaning up rotated logs");
            }
        }

        Ok(())
    }

    fn rotate(&self, path: &Path) -> Result<bool, RotationError> {
        let stat = match self.fs.stat(path) {
            Ok(stat) => stat,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(RotationError::io("stat", path, e)),
        };

        if stat.len == 0 {
            return Ok(false);
        }

        let target = rotated_name(path, (self.clock)());
        self.fs
            .rename(path, &target)
            .map_err(|e| RotationError::io("rename", path, e))?;

        tracing::info!(
            log = %path.display(),
            rotated_to = %target.display(),
            size_bytes = stat.len,
            "Rotated log file"
        );
        metrics::record_rotation();

        // The old file is already moved aside; a failure here still counts as
        // a rotation but is reported.
        self.fs
            .create_append(path)
            .map_err(|e| RotationError::io("recreate", path, e))?;

        Ok(true)
    }

    /// Delete the oldest rotated siblings of `path` beyond the retention
    /// count. Every deletion is attempted; the first failure is returned.
    fn cleanup(&self, path: &Path) -> Result<usize, RotationError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (stem, ext) = split_extension(&file_name);
        let prefix = format!("{stem}.");
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let filter = |entry: &DirEntryInfo| entry.is_file && is_rotated_name(&entry.name, &prefix, ext);
        let mut matched = self
            .fs
            .list_dir(&dir, &filter)
            .map_err(|e| RotationError::io("list", &dir, e))?;

        let keep = self.settings.keep;
        if matched.len() <= keep {
            return Ok(0);
        }

        matched.sort_unstable_by(|a, b| b.cmp(a));

        let mut first_error = None;
        let mut removed = 0;
        for name in &matched[keep..] {
            let target = dir.join(name);
            match self.fs.remove(&target) {
                Ok(()) => {
                    removed += 1;
                    tracing::debug!(path = %target.display(), "Deleted old rotated log");
                }
                Err(e) => {
                    tracing::warn!(path = %target.display(), error = %e, "Failed to delete old rotated log");
                    if first_error.is_none() {
                        first_error = Some(RotationError::io("remove", &target, e));
                    }
                }
            }
        }
        metrics::record_pruned(removed as u64);

        match first_error {
            Some(e) => Err(e),
            None => Ok(removed),
        }
    }
}
