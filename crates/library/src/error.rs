//! Library Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Each submodule raises its own kind,
//! which is wrapped in one of these on the way out of the public API.

use derive_more::{Display, Error};

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("issue with path generation from template")]
    Template,
    #[display("could not resolve capture date")]
    Date,
    #[display("could not discover source files")]
    Walk,
    #[display("could not place file")]
    Place,
    /// The configured transfer mode isn't implemented.
    #[display("transfer mode `{_0}` is not supported")]
    Unsupported(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
