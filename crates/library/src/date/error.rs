//! Error types for the [`date`](super) module.
//!
//! Uses [`exn`] for automatic location tracking and error tree construction.

use derive_more::{Display, Error};

/// A date resolution error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for date resolution.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies why a capture date couldn't be resolved.
///
/// ### Metadata Errors
/// Recoverable per file when [`MetadataFailure::Fallback`](super::MetadataFailure)
/// is in effect.
/// - [`ErrorKind::Decode`]
/// - [`ErrorKind::MissingTag`]
/// - [`ErrorKind::Malformed`]
///
/// ### Filesystem Errors
/// - [`ErrorKind::Stat`]
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The file's embedded metadata couldn't be decoded at all.
    #[display("could not decode embedded metadata")]
    Decode,
    /// Metadata decoded fine but has no original-capture tag.
    #[display("no original capture tag")]
    MissingTag,
    /// The original-capture tag isn't `YYYY:MM:DD HH:MM:SS`.
    #[display("malformed capture tag: {_0:?}")]
    Malformed(#[error(not(source))] String),
    /// Reading filesystem timestamps failed.
    #[display("could not read filesystem timestamps")]
    Stat,
}

impl ErrorKind {
    /// Returns `true` for failures the filesystem fallback can stand in for.
    pub fn is_metadata(&self) -> bool {
        matches!(self, Self::Decode | Self::MissingTag | Self::Malformed(_))
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Stat)
    }
}
