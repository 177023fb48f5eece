//! Local filesystem destination.
//!
//! Organized files are written below a configured root directory using plain
//! `std::fs` calls.

use crate::Destination;
use crate::error::{ErrorKind, Result};
use crate::path::validate as validate_path;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Local filesystem destination.
///
/// # Examples
///
/// ```no_run
/// use shoebox_storage::backend::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = LocalBackend::new("organized", "/srv/photos/organized")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct LocalBackend {
    name: String,
    root: PathBuf,
}
impl LocalBackend {
    /// Create a new local destination, creating the root directory if it
    /// doesn't exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not absolute, exists but isn't a
    /// directory, or can't be created.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let backend = Self::untouched(name, root)?;
        if !backend.root.exists() {
            fs::create_dir_all(&backend.root).map_err(|e| ErrorKind::from_io(e, &backend.root))?;
        }
        Ok(backend)
    }

    /// Like [`new`](Self::new), but a missing root is left missing. Used for
    /// dry runs.
    pub fn untouched(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() || (root.exists() && !root.is_dir()) {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        Ok(Self { name: name.into(), root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Destination for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn resolve(&self, path: &Path) -> Result<PathBuf> {
        Ok(self.root.join(validate_path(path)?))
    }

    fn exists(&self, path: &Path) -> Result<bool> {
        let abs_path = self.resolve(path)?;
        abs_path.try_exists().map_err(|e| ErrorKind::from_io(e, &abs_path).into())
    }

    fn on_disk(&self) -> Option<&Path> {
        Some(&self.root)
    }

    fn write_from(&self, path: &Path, reader: &mut dyn Read) -> Result<u64> {
        let abs_path = self.resolve(path)?;
        if let Some(parent) = abs_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ErrorKind::from_io(e, parent))?;
        }
        // Bytes go to a sibling first and are renamed over the target, so an
        // existing file is swapped out rather than truncated. A target that
        // shares an inode with the reader (hard link) is left untouched.
        let staged = staged_path(&abs_path);
        match stage(&staged, reader).and_then(|written| fs::rename(&staged, &abs_path).map(|()| written)) {
            Ok(written) => Ok(written),
            Err(e) => {
                let _ = fs::remove_file(&staged);
                Err(ErrorKind::from_io(e, &abs_path).into())
            },
        }
    }
}

fn staged_path(path: &Path) -> PathBuf {
    let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    path.with_file_name(format!(".{name}.partial-{}", std::process::id()))
}

fn stage(path: &Path, reader: &mut dyn Read) -> io::Result<u64> {
    let mut writer = BufWriter::new(File::create(path)?);
    let written = io::copy(reader, &mut writer)?;
    writer.flush()?;
    Ok(written)
}
