//! Binary Error Types
//!
//! Each variant names the stage that failed; the underlying library error is
//! attached as the cause and printed with it.

use derive_more::{Display, Error};
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("invalid configuration")]
    Config,
    #[display("interactive setup failed")]
    Setup,
    #[display("could not open log file {}", _0.display())]
    Logging(#[error(not(source))] PathBuf),
    #[display("could not prepare destination {}", _0.display())]
    Destination(#[error(not(source))] PathBuf),
    #[display("`copy-vs-move = \"{_0}\"` is not supported; only \"copy\" is implemented")]
    Unsupported(#[error(not(source))] String),
    #[display("run aborted")]
    Run,
}
