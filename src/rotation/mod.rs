//! Log rotation subsystem.
//!
//! # Data Flow
//! ```text
//! register_and_start(path)
//!     → immediate rotate + cleanup (scheduler.rs)
//!     → path appended to the registered list
//!     → background loop launched once
//!
//! Every tick (aligned to the frequency grid, naming.rs):
//!     snapshot paths → rotate each (fs.rs) → prune old files → reopen hook
//! ```
//!
//! # Design Decisions
//! - Filesystem access goes through the `Filesystem` trait
//! - Rotated names sort chronologically, so pruning is a string sort
//! - Ticks are anchored to the wall clock, not to process start

pub mod fs;
pub mod naming;
pub mod scheduler;

pub use fs::{DirEntryInfo, FileStat, Filesystem, OsFilesystem};
pub use scheduler::{Clock, HookError, LogRotator, ReopenHook, RotationError, RotationSettings};
