//! Filesystem timestamps, used when a file carries no usable capture date.
//!
//! Platforms disagree on what "when was this file made" means, so the lookup
//! walks a chain: creation time where the platform records one (Windows),
//! then birth time where the kernel and filesystem support it (`statx` on
//! Linux, `st_birthtime` on the BSDs and macOS), then modification time,
//! which every platform has.

use crate::error::{ErrorKind, Result};
use std::fs::Metadata;
use std::time::SystemTime;

/// Which tier of the fallback chain produced a [`FileTimestamp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampSource {
    Created,
    Birth,
    Modified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileTimestamp {
    pub time: SystemTime,
    pub source: TimestampSource,
}

/// Resolves the best available timestamp from file metadata.
///
/// Only fails when even the modification time is unavailable.
pub fn file_timestamp(metadata: &Metadata) -> Result<FileTimestamp> {
    if let Some(time) = creation_time(metadata) {
        return Ok(FileTimestamp { time, source: TimestampSource::Created });
    }
    if let Some(time) = birth_time(metadata) {
        return Ok(FileTimestamp { time, source: TimestampSource::Birth });
    }
    let time = metadata.modified().map_err(ErrorKind::Io)?;
    Ok(FileTimestamp { time, source: TimestampSource::Modified })
}

#[cfg(windows)]
fn creation_time(metadata: &Metadata) -> Option<SystemTime> {
    metadata.created().ok()
}

#[cfg(not(windows))]
fn creation_time(_metadata: &Metadata) -> Option<SystemTime> {
    None
}

// On Unix `Metadata::created()` reports the birth time, and returns an
// `Unsupported` error when the filesystem doesn't record one.
#[cfg(not(windows))]
fn birth_time(metadata: &Metadata) -> Option<SystemTime> {
    metadata.created().ok()
}

#[cfg(windows)]
fn birth_time(_metadata: &Metadata) -> Option<SystemTime> {
    None
}
