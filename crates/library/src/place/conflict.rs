use crate::error::{Error as LibraryError, ErrorKind as LibraryErrorKind};
use crate::place::error::{ErrorKind as PlaceErrorKind, Result as PlaceResult};
use exn::ResultExt;
use shoebox_storage::Destination;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Maximum numbered alternatives tried by [`CollisionPolicy::Rename`] before
/// bailing with [`PlaceErrorKind::Conflict`].
const MAX_RENAME_ATTEMPTS: usize = 999;

/// What to do when a file already sits at the destination path.
///
/// Two photos taken in the same second with the same extension render to the
/// same path, so this is hit more often than one might expect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// Replace the existing file. Last writer wins, nothing is reported.
    #[default]
    Overwrite,
    /// Leave the existing file and don't copy.
    Skip,
    /// Abort the run.
    Fail,
    /// Copy to the first free `name-N.ext` alongside it.
    Rename,
}
impl FromStr for CollisionPolicy {
    type Err = LibraryError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "overwrite" => Ok(Self::Overwrite),
            "skip" => Ok(Self::Skip),
            "fail" => Ok(Self::Fail),
            "rename" => Ok(Self::Rename),
            _ => exn::bail!(LibraryErrorKind::Unsupported(s.to_string())),
        }
    }
}
impl fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Overwrite => "overwrite",
            Self::Skip => "skip",
            Self::Fail => "fail",
            Self::Rename => "rename",
        })
    }
}

/// The slot a file will be written to, or why it won't be.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Slot {
    /// Nothing there yet.
    Free(PathBuf),
    /// Something there, and it's going to be replaced.
    Occupied(PathBuf),
    /// The rendered path was taken; this numbered alternative isn't.
    Renamed(PathBuf),
    /// Something there, and it stays.
    Skip(PathBuf),
    /// The file at the destination *is* the source (destination tree nested
    /// in the source tree, or a re-run).
    AlreadyCorrect(PathBuf),
}

/// Decides where `source` goes, given it wants to be at `target`.
pub(crate) fn claim_slot(
    destination: &dyn Destination,
    policy: CollisionPolicy,
    source: &Path,
    target: PathBuf,
) -> PlaceResult<Slot> {
    if !destination.exists(&target).or_raise(|| PlaceErrorKind::Storage)? {
        return Ok(Slot::Free(target));
    }
    if is_same_file(destination, source, &target)? {
        return Ok(Slot::AlreadyCorrect(target));
    }
    match policy {
        CollisionPolicy::Overwrite => {
            tracing::debug!(destination = %target.display(), "Overwriting existing file");
            Ok(Slot::Occupied(target))
        },
        CollisionPolicy::Skip => Ok(Slot::Skip(target)),
        CollisionPolicy::Fail => exn::bail!(PlaceErrorKind::Conflict(target)),
        CollisionPolicy::Rename => {
            for attempt in 1..=MAX_RENAME_ATTEMPTS {
                let alternative = numbered(&target, attempt);
                if !destination.exists(&alternative).or_raise(|| PlaceErrorKind::Storage)? {
                    return Ok(Slot::Renamed(alternative));
                }
                if is_same_file(destination, source, &alternative)? {
                    return Ok(Slot::AlreadyCorrect(alternative));
                }
            }
            exn::bail!(PlaceErrorKind::Conflict(target))
        },
    }
}

/// `2021/03/04_130509.jpg` → `2021/03/04_130509-2.jpg`
fn numbered(target: &Path, n: usize) -> PathBuf {
    let stem = target.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    let name = match target.extension() {
        Some(ext) => format!("{stem}-{n}.{}", ext.to_string_lossy()),
        None => format!("{stem}-{n}"),
    };
    target.with_file_name(name)
}

fn is_same_file(destination: &dyn Destination, source: &Path, target: &Path) -> PlaceResult<bool> {
    let absolute = destination.resolve(target).or_raise(|| PlaceErrorKind::Storage)?;
    // Sources are canonical already (see `walk`). A destination that can't be
    // read (dry run, vanished file) can't be the source either.
    if fs::canonicalize(&absolute).is_ok_and(|resolved| resolved == source) {
        return Ok(true);
    }
    match (fs::metadata(&absolute), fs::metadata(source)) {
        (Ok(target), Ok(source)) => Ok(same_inode(&target, &source)),
        _ => Ok(false),
    }
}

/// Hard links have distinct paths but share the device and inode.
#[cfg(unix)]
fn same_inode(a: &fs::Metadata, b: &fs::Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    a.dev() == b.dev() && a.ino() == b.ino()
}

#[cfg(not(unix))]
fn same_inode(_: &fs::Metadata, _: &fs::Metadata) -> bool {
    false
}
