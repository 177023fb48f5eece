//! Read-only destination, used for dry runs.
//!
//! Wraps another destination and drops every write while reporting success.

use crate::error::{ErrorKind, Result};
use crate::{Destination, DestinationHandle};
use std::cell::RefCell;
use std::collections::HashSet;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Read-only destination.
///
/// Lookups go to the wrapped destination; writes are logged as an
/// [`info event`](tracing::Event) and discarded. The source reader is still
/// drained so the reported byte count matches what a real run would write.
///
/// Paths written during the run are remembered and reported as existing
/// afterwards, so collisions play out the same way they would for real.
pub struct ReadOnlyBackend {
    inner: DestinationHandle,
    written: RefCell<HashSet<PathBuf>>,
}
impl ReadOnlyBackend {
    pub fn new(inner: DestinationHandle) -> Self {
        Self { inner, written: RefCell::default() }
    }
}

impl Destination for ReadOnlyBackend {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn resolve(&self, path: &Path) -> Result<PathBuf> {
        self.inner.resolve(path)
    }

    fn exists(&self, path: &Path) -> Result<bool> {
        if self.written.borrow().contains(&self.inner.resolve(path)?) {
            return Ok(true);
        }
        self.inner.exists(path)
    }

    fn on_disk(&self) -> Option<&Path> {
        self.inner.on_disk()
    }

    fn write_from(&self, path: &Path, reader: &mut dyn Read) -> Result<u64> {
        let absolute = self.inner.resolve(path)?;
        let bytes = io::copy(reader, &mut io::sink()).map_err(ErrorKind::Io)?;
        tracing::info!(path = %path.display(), bytes, "Skipping write during dry run");
        self.written.borrow_mut().insert(absolute);
        Ok(bytes)
    }
}
