//! Destination trait and implementations.
//!
//! A [`Destination`] is the tree that organized files are written into. All
//! paths handed to it are relative to its root and are validated with
//! [`validate_path`](crate::validate_path) before touching the filesystem.

mod local;
mod ro;

pub use self::local::LocalBackend;
pub use self::ro::ReadOnlyBackend;
use crate::error::Result;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Where placed files end up.
///
/// Everything is synchronous: placement copies one file at a time.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use shoebox_storage::{Destination, error::Result};
///
/// fn place_once(destination: &dyn Destination, bytes: &[u8]) -> Result<bool> {
///     let path = Path::new("2021/03/04_130509.jpg");
///     if destination.exists(path)? {
///         return Ok(false);
///     }
///     destination.write_from(path, &mut &bytes[..])?;
///     Ok(true)
/// }
/// ```
pub trait Destination {
    /// Name of the destination, used for logging only.
    fn name(&self) -> &str;

    /// Absolute location of a relative destination path.
    fn resolve(&self, path: &Path) -> Result<PathBuf>;

    /// Check if a file already exists.
    fn exists(&self, path: &Path) -> Result<bool>;

    /// Root directory on the local filesystem, if the destination has one.
    fn on_disk(&self) -> Option<&Path> {
        None
    }

    /// Stream `reader` to completion into `path`, returning the number of
    /// bytes written.
    ///
    /// # Notes
    /// - Implementations create missing parent directories.
    /// - An existing file at `path` is replaced, never truncated in place, so
    ///   other hard links to it keep their contents.
    fn write_from(&self, path: &Path, reader: &mut dyn Read) -> Result<u64>;
}
