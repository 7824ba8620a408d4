//! Rotated file naming and tick alignment.
//!
//! Rotated files are named `<stem>.<yyyyMMdd-HHmmss><ext>` using UTC. The
//! timestamp is fixed width, so sorting names in reverse lexicographic order
//! yields newest first.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};

/// `chrono` format of the rotation timestamp.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

const TIMESTAMP_LEN: usize = 15;

/// Split a file name into stem and extension at the last `.`.
///
/// The extension keeps its leading dot, and is empty when the name has none.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) => name.split_at(idx),
        None => (name, ""),
    }
}

/// Name a log file is moved to when rotated at `now`.
pub fn rotated_name(path: &Path, now: DateTime<Utc>) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (stem, ext) = split_extension(&file_name);
    let stamp = now.format(TIMESTAMP_FORMAT);
    path.with_file_name(format!("{stem}.{stamp}{ext}"))
}

/// Parse a rotation timestamp, rejecting anything but the exact format.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    if value.len() != TIMESTAMP_LEN || !value.is_ascii() {
        return None;
    }
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).ok()
}

/// Whether `name` is a rotated sibling of a log named `<stem><ext>`.
///
/// `prefix` is `<stem>.`; the part between prefix and extension must be a
/// valid rotation timestamp.
pub fn is_rotated_name(name: &str, prefix: &str, ext: &str) -> bool {
    name.strip_prefix(prefix)
        .and_then(|rest| rest.strip_suffix(ext))
        .and_then(parse_timestamp)
        .is_some()
}

/// Time until the next tick on the wall-clock grid of `frequency`.
///
/// Ticks fall on multiples of `frequency` since the Unix epoch, so an hourly
/// rotation always fires at the top of the hour. The result lies in
/// `[0, frequency)`.
pub fn delay_until_next_tick(now: DateTime<Utc>, frequency: Duration) -> Duration {
    let freq = frequency.as_nanos() as i128;
    if freq == 0 {
        return Duration::ZERO;
    }

    let now_nanos =
        i128::from(now.timestamp()) * 1_000_000_000 + i128::from(now.timestamp_subsec_nanos());
    let offset = now_nanos.rem_euclid(freq);
    let delay = (freq - offset) % freq;

    Duration::from_nanos(u64::try_from(delay).unwrap_or(u64::MAX))
}
