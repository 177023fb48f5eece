use crate::date::TagDecoder;
use crate::date::error::{ErrorKind, Result};
use chrono::{DateTime, Local, NaiveDateTime, SubsecRound};
use exn::ResultExt;
use shoebox_storage::{TimestampSource, file_timestamp};
use std::fmt;
use std::fs::File;
use std::io::Seek;
use tracing::instrument;

/// The exact layout of an EXIF `DateTimeOriginal` value.
pub const CAPTURE_TAG_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// What happens when one file's metadata can't produce a date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MetadataFailure {
    /// Log it and date that file from the filesystem instead.
    #[default]
    Fallback,
    /// Fail the file, which aborts the whole run.
    Abort,
}
impl From<bool> for MetadataFailure {
    fn from(fallback: bool) -> Self {
        match fallback {
            true => Self::Fallback,
            false => Self::Abort,
        }
    }
}

/// Where a resolved capture date came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    Metadata,
    Filesystem(TimestampSource),
}
impl fmt::Display for DateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Metadata => f.write_str("metadata"),
            Self::Filesystem(TimestampSource::Created) => f.write_str("created"),
            Self::Filesystem(TimestampSource::Birth) => f.write_str("birth"),
            Self::Filesystem(TimestampSource::Modified) => f.write_str("modified"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    /// Local wall-clock time, truncated to whole seconds.
    pub timestamp: NaiveDateTime,
    pub source: DateSource,
}

enum Strategy {
    Metadata { decoder: Box<dyn TagDecoder>, on_failure: MetadataFailure },
    Filesystem,
}

/// Resolves a file's capture date.
///
/// The strategy is fixed when the resolver is built: either embedded metadata
/// first (with a per-file [`MetadataFailure`] policy), or filesystem
/// timestamps only.
pub struct DateResolver {
    strategy: Strategy,
}
impl DateResolver {
    /// Picks the best strategy this build supports.
    ///
    /// With the `exif` feature compiled in, dates come from EXIF metadata.
    #[cfg(feature = "exif")]
    pub fn probe(on_failure: MetadataFailure) -> Self {
        Self::metadata(crate::date::ExifDecoder, on_failure)
    }

    /// Picks the best strategy this build supports.
    ///
    /// Built without the `exif` feature, so every file is dated from the
    /// filesystem and a warning says so once.
    #[cfg(not(feature = "exif"))]
    pub fn probe(on_failure: MetadataFailure) -> Self {
        tracing::warn!(
            policy = ?on_failure,
            "Built without metadata support; dating every file from filesystem timestamps"
        );
        Self::filesystem()
    }

    pub fn metadata(decoder: impl TagDecoder + 'static, on_failure: MetadataFailure) -> Self {
        let decoder = Box::new(decoder);
        Self { strategy: Strategy::Metadata { decoder, on_failure } }
    }

    pub fn filesystem() -> Self {
        Self { strategy: Strategy::Filesystem }
    }

    /// Returns `true` when embedded metadata is consulted first.
    pub fn uses_metadata(&self) -> bool {
        matches!(self.strategy, Strategy::Metadata { .. })
    }

    /// Resolves the capture date of an open file.
    ///
    /// The handle's read position is unspecified afterwards; rewind before
    /// reading its contents.
    ///
    /// # Errors
    /// - a metadata error ([`ErrorKind::is_metadata`]) when the tag can't be
    ///   used and the policy is [`MetadataFailure::Abort`].
    /// - [`ErrorKind::Stat`] when no filesystem timestamp is available.
    #[instrument(level = "debug", skip_all)]
    pub fn resolve(&self, file: &mut File) -> Result<Resolved> {
        let Strategy::Metadata { decoder, on_failure } = &self.strategy else {
            return filesystem_date(file);
        };
        match metadata_date(decoder.as_ref(), file) {
            Ok(timestamp) => Ok(Resolved { timestamp, source: DateSource::Metadata }),
            Err(e) if *on_failure == MetadataFailure::Fallback => {
                tracing::warn!(error = %e, "Metadata date unavailable; using filesystem timestamp");
                filesystem_date(file)
            },
            Err(e) => Err(e),
        }
    }
}

/// Parses an original-capture tag (`YYYY:MM:DD HH:MM:SS`).
///
/// ```
/// use shoebox_library::date::parse_capture_tag;
///
/// let taken = parse_capture_tag("2021:03:04 13:05:09").unwrap();
/// assert_eq!(taken.to_string(), "2021-03-04 13:05:09");
/// assert!(parse_capture_tag("2021-03-04 13:05:09").is_err());
/// assert!(parse_capture_tag("0000:00:00 00:00:00").is_err());
/// ```
pub fn parse_capture_tag(tag: &str) -> Result<NaiveDateTime> {
    // EXIF ASCII values are NUL-terminated; some writers pad with spaces.
    let trimmed = tag.trim_end_matches('\0').trim();
    NaiveDateTime::parse_from_str(trimmed, CAPTURE_TAG_FORMAT).or_raise(|| ErrorKind::Malformed(tag.to_string()))
}

fn metadata_date(decoder: &dyn TagDecoder, file: &mut File) -> Result<NaiveDateTime> {
    file.rewind().or_raise(|| ErrorKind::Decode)?;
    let tag = decoder.original_capture(file)?;
    parse_capture_tag(&tag)
}

fn filesystem_date(file: &File) -> Result<Resolved> {
    let metadata = file.metadata().or_raise(|| ErrorKind::Stat)?;
    let stamp = file_timestamp(&metadata).or_raise(|| ErrorKind::Stat)?;
    let timestamp = DateTime::<Local>::from(stamp.time).naive_local().trunc_subsecs(0);
    Ok(Resolved { timestamp, source: DateSource::Filesystem(stamp.source) })
}
