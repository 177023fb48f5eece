//! Error types for the [`place`](super) module.
//!
//! Uses [`exn`] for automatic location tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A placement error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for placement operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a placement failure.
///
/// ### Operational Errors
/// - [`ErrorKind::Template`]
/// - [`ErrorKind::Conflict`]
///
/// ### Dependency Errors
/// - [`ErrorKind::Source`]
/// - [`ErrorKind::Date`]
/// - [`ErrorKind::Storage`]
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The source file couldn't be opened or read.
    #[display("could not read source file: {}", _0.display())]
    Source(#[error(not(source))] PathBuf),
    /// No capture date could be resolved (and fallback wasn't allowed).
    Date,
    /// The [`PathGenerator`](crate::PathGenerator) could not render a path.
    Template,
    /// A destination operation (existence check, directory creation, write)
    /// failed.
    Storage,
    /// The destination is occupied and the collision policy refuses to
    /// proceed, or every rename attempt was taken.
    #[display("destination already occupied: {}", _0.display())]
    Conflict(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
