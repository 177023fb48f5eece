//! Configuration Error Types
//!
//! Every variant is fatal: configuration is read once at startup and nothing
//! is touched until it validates.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A source (file or environment) couldn't be read or didn't match the
    /// expected shape.
    #[display("could not load configuration")]
    Load,
    /// A required key has no value anywhere.
    #[display("missing required setting `{_0}`")]
    Missing(#[error(not(source))] &'static str),
    /// A key has a value that doesn't parse.
    #[display("invalid value for `{_0}`")]
    Invalid(#[error(not(source))] &'static str),
    #[display("could not save configuration to {}", _0.display())]
    Save(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
