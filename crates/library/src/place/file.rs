use crate::date::{DateResolver, DateSource};
use crate::error::{ErrorKind as LibraryErrorKind, Result as LibraryResult};
use crate::place::conflict::{CollisionPolicy, Slot, claim_slot};
use crate::place::error::{ErrorKind as PlaceErrorKind, Result as PlaceResult};
use crate::template::PathGenerator;
use chrono::NaiveDateTime;
use exn::ResultExt;
use shoebox_storage::{Candidate, Destination};
use std::fs::File;
use std::io::Seek;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Everything placement needs besides the destination itself.
///
/// Built once per run from configuration; nothing in it changes while files
/// are being placed.
pub struct Context {
    pub resolver: DateResolver,
    pub template: PathGenerator,
    pub collision: CollisionPolicy,
}

/// The outcome of (successfully) placing a single file.
///
/// Each variant carries the destination path, relative to the destination
/// root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Copied to a path that was free.
    Copied(PathBuf),
    /// Copied over a different file that was already there.
    Overwrote(PathBuf),
    /// The rendered path was taken, so it was copied to a numbered alternative.
    Renamed(PathBuf),
    /// Something was already at the destination; nothing was copied.
    Skipped(PathBuf),
    /// The source already lives at its destination; nothing was copied.
    AlreadyCorrect(PathBuf),
}
impl Action {
    pub fn destination(&self) -> &Path {
        match self {
            Self::Copied(p) | Self::Overwrote(p) | Self::Renamed(p) | Self::Skipped(p) | Self::AlreadyCorrect(p) => p,
        }
    }
}

/// A record of one placed file.
#[derive(Debug, Clone)]
pub struct Placement {
    pub source: PathBuf,
    pub taken: NaiveDateTime,
    pub date_source: DateSource,
    pub action: Action,
    /// Bytes transferred; zero when nothing was copied.
    pub bytes: u64,
}

/// Copies a single file to its date-derived location.
///
/// Opens the source, resolves its capture date, renders the destination path
/// from the [`Context`]'s template, settles any collision according to its
/// [`CollisionPolicy`], then streams the bytes across. Parent directories are
/// created as needed and the source is never modified.
///
/// # Errors
/// Returns [`Exn<LibraryErrorKind::Place>`](LibraryErrorKind::Place) raised
/// from an inner [`Exn<PlaceErrorKind>`](PlaceErrorKind). Any failure is
/// meant to stop the run.
pub fn place_file(destination: &dyn Destination, ctx: &Context, candidate: &Candidate) -> LibraryResult<Placement> {
    place_file_inner(destination, ctx, candidate).or_raise(|| LibraryErrorKind::Place)
}

#[instrument(skip_all, fields(source = %candidate.path().display()))]
pub(crate) fn place_file_inner(
    destination: &dyn Destination,
    ctx: &Context,
    candidate: &Candidate,
) -> PlaceResult<Placement> {
    let source = candidate.path().to_path_buf();
    let mut file = File::open(&source).or_raise(|| PlaceErrorKind::Source(source.clone()))?;

    let resolved = ctx.resolver.resolve(&mut file).or_raise(|| PlaceErrorKind::Date)?;
    let target =
        ctx.template.generate_with_ext(&resolved.timestamp, candidate.extension()).or_raise(|| PlaceErrorKind::Template)?;

    let placement = |action, bytes| Placement {
        source: source.clone(),
        taken: resolved.timestamp,
        date_source: resolved.source,
        action,
        bytes,
    };

    let action = match claim_slot(destination, ctx.collision, &source, target)? {
        Slot::Free(t) => Action::Copied(t),
        Slot::Occupied(t) => Action::Overwrote(t),
        Slot::Renamed(t) => Action::Renamed(t),
        Slot::Skip(t) => {
            tracing::info!(destination = %t.display(), "Destination occupied; skipping");
            return Ok(placement(Action::Skipped(t), 0));
        },
        Slot::AlreadyCorrect(t) => return Ok(placement(Action::AlreadyCorrect(t), 0)),
    };

    // Date resolution may have read part of the file.
    file.rewind().or_raise(|| PlaceErrorKind::Source(source.clone()))?;
    let target = action.destination();
    let bytes = destination.write_from(target, &mut file).or_raise(|| PlaceErrorKind::Storage)?;
    tracing::debug!(destination = %target.display(), bytes, date_source = %resolved.source, "Placed file");
    Ok(placement(action, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::MetadataFailure;
    use crate::date::error::{ErrorKind as DateErrorKind, Result as DateResult};
    use shoebox_storage::backend::LocalBackend;
    use std::fs;
    use std::io::Read;
    use std::ops::Deref;

    /// Test images are text files whose first line is their capture tag.
    fn first_line_tag(file: &mut File) -> DateResult<String> {
        let mut body = String::new();
        file.read_to_string(&mut body).or_raise(|| DateErrorKind::Decode)?;
        match body.lines().next() {
            Some(line) if !line.is_empty() => Ok(line.to_string()),
            _ => exn::bail!(DateErrorKind::MissingTag),
        }
    }

    fn context(collision: CollisionPolicy, on_failure: MetadataFailure) -> Context {
        Context {
            resolver: DateResolver::metadata(first_line_tag, on_failure),
            template: PathGenerator::default(),
            collision,
        }
    }

    fn candidate(root: &Path, name: &str, body: &str) -> Candidate {
        let path = root.join(name);
        fs::write(&path, body).unwrap();
        let ext = format!(".{}", path.extension().unwrap().to_string_lossy().to_lowercase());
        Candidate::new(fs::canonicalize(path).unwrap(), ext)
    }

    #[test]
    fn test_copies_to_dated_path() {
        let source_dir = tempfile::tempdir().unwrap();
        let dest_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("organized", dest_dir.path()).unwrap();
        let ctx = context(CollisionPolicy::Overwrite, MetadataFailure::Abort);
        let body = "2021:03:04 13:05:09\npixels";
        let file = candidate(source_dir.path(), "IMG_0001.JPG", body);

        let placement = place_file(&backend, &ctx, &file).unwrap();
        assert_eq!(placement.action, Action::Copied("2021/03/04_130509.jpg".into()));
        assert_eq!(placement.date_source, DateSource::Metadata);
        assert_eq!(placement.bytes, body.len() as u64);
        assert_eq!(fs::read_to_string(dest_dir.path().join("2021/03/04_130509.jpg")).unwrap(), body);
        // Source is left alone.
        assert_eq!(fs::read_to_string(file.path()).unwrap(), body);
    }

    #[test]
    fn test_same_second_overwrites_by_default() {
        let source_dir = tempfile::tempdir().unwrap();
        let dest_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("organized", dest_dir.path()).unwrap();
        let ctx = context(CollisionPolicy::Overwrite, MetadataFailure::Abort);
        let first = candidate(source_dir.path(), "a.jpg", "2021:03:04 13:05:09\nfirst");
        let second = candidate(source_dir.path(), "b.jpg", "2021:03:04 13:05:09\nsecond");

        assert_eq!(place_file(&backend, &ctx, &first).unwrap().action, Action::Copied("2021/03/04_130509.jpg".into()));
        assert_eq!(
            place_file(&backend, &ctx, &second).unwrap().action,
            Action::Overwrote("2021/03/04_130509.jpg".into())
        );
        let placed = fs::read_to_string(dest_dir.path().join("2021/03/04_130509.jpg")).unwrap();
        assert_eq!(placed, "2021:03:04 13:05:09\nsecond");
    }

    #[test]
    fn test_same_second_rename_keeps_both() {
        let source_dir = tempfile::tempdir().unwrap();
        let dest_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("organized", dest_dir.path()).unwrap();
        let ctx = context(CollisionPolicy::Rename, MetadataFailure::Abort);
        let first = candidate(source_dir.path(), "a.jpg", "2021:03:04 13:05:09\nfirst");
        let second = candidate(source_dir.path(), "b.jpg", "2021:03:04 13:05:09\nsecond");

        place_file(&backend, &ctx, &first).unwrap();
        let placement = place_file(&backend, &ctx, &second).unwrap();
        assert_eq!(placement.action, Action::Renamed("2021/03/04_130509-1.jpg".into()));
        assert!(dest_dir.path().join("2021/03/04_130509.jpg").exists());
        assert!(dest_dir.path().join("2021/03/04_130509-1.jpg").exists());
    }

    #[test]
    fn test_same_second_skip_keeps_first() {
        let source_dir = tempfile::tempdir().unwrap();
        let dest_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("organized", dest_dir.path()).unwrap();
        let ctx = context(CollisionPolicy::Skip, MetadataFailure::Abort);
        let first = candidate(source_dir.path(), "a.jpg", "2021:03:04 13:05:09\nfirst");
        let second = candidate(source_dir.path(), "b.jpg", "2021:03:04 13:05:09\nsecond");

        place_file(&backend, &ctx, &first).unwrap();
        let placement = place_file(&backend, &ctx, &second).unwrap();
        assert_eq!(placement.action, Action::Skipped("2021/03/04_130509.jpg".into()));
        assert_eq!(placement.bytes, 0);
        let placed = fs::read_to_string(dest_dir.path().join("2021/03/04_130509.jpg")).unwrap();
        assert_eq!(placed, "2021:03:04 13:05:09\nfirst");
    }

    #[test]
    fn test_missing_tag_aborts_without_fallback() {
        let source_dir = tempfile::tempdir().unwrap();
        let dest_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("organized", dest_dir.path()).unwrap();
        let ctx = context(CollisionPolicy::Overwrite, MetadataFailure::Abort);
        let file = candidate(source_dir.path(), "a.png", "");

        let err = place_file_inner(&backend, &ctx, &file).unwrap_err();
        assert!(matches!(err.deref(), PlaceErrorKind::Date));
        assert_eq!(fs::read_dir(dest_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_tag_falls_back() {
        let source_dir = tempfile::tempdir().unwrap();
        let dest_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("organized", dest_dir.path()).unwrap();
        let ctx = context(CollisionPolicy::Overwrite, MetadataFailure::Fallback);
        let file = candidate(source_dir.path(), "a.png", "no tag here\n");

        let placement = place_file(&backend, &ctx, &file).unwrap();
        assert!(matches!(placement.date_source, DateSource::Filesystem(_)));
        let expected = ctx.template.generate_with_ext(&placement.taken, ".png").unwrap();
        assert_eq!(placement.action, Action::Copied(expected.clone()));
        assert_eq!(fs::read_to_string(dest_dir.path().join(expected)).unwrap(), "no tag here\n");
    }

    #[test]
    fn test_source_inside_destination_is_left_alone() {
        let dest_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("organized", dest_dir.path()).unwrap();
        let ctx = context(CollisionPolicy::Overwrite, MetadataFailure::Abort);
        fs::create_dir_all(dest_dir.path().join("2021/03")).unwrap();
        let file = candidate(&dest_dir.path().join("2021/03"), "04_130509.jpg", "2021:03:04 13:05:09\nx");

        let placement = place_file(&backend, &ctx, &file).unwrap();
        assert_eq!(placement.action, Action::AlreadyCorrect("2021/03/04_130509.jpg".into()));
        assert_eq!(fs::read_to_string(file.path()).unwrap(), "2021:03:04 13:05:09\nx");
    }

    #[test]
    fn test_vanished_source() {
        let source_dir = tempfile::tempdir().unwrap();
        let dest_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("organized", dest_dir.path()).unwrap();
        let ctx = context(CollisionPolicy::Overwrite, MetadataFailure::Abort);
        let file = Candidate::new(source_dir.path().join("gone.jpg"), ".jpg");

        let err = place_file_inner(&backend, &ctx, &file).unwrap_err();
        assert!(matches!(err.deref(), PlaceErrorKind::Source(_)));
    }
}
