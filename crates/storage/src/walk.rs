//! Source tree discovery.
//!
//! Walks a directory tree depth-first with an explicit stack, collecting every
//! file whose extension is in the [`Extensions`] allowlist. Directories that
//! can't be listed because of permissions are skipped with a single warning
//! each; any other I/O failure aborts the walk.

use crate::Extensions;
use crate::error::{ErrorKind, Result};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::hash::{Hash, Hasher};
use std::io;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// A discovered file waiting to be placed.
///
/// Identity is the canonical path alone, so the same file reached through a
/// symlinked directory collapses into one candidate.
#[derive(Debug, Clone)]
pub struct Candidate {
    path: PathBuf,
    extension: String,
}
impl Candidate {
    pub fn new(path: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self { path: path.into(), extension: extension.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lower-cased extension including the leading dot, e.g. `".jpg"`.
    pub fn extension(&self) -> &str {
        &self.extension
    }
}
impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}
impl Eq for Candidate {}
impl Hash for Candidate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}
impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.path.cmp(&other.path)
    }
}

/// Everything a walk found.
#[derive(Debug, Default)]
pub struct Walk {
    /// Matching files, ordered by path.
    pub candidates: BTreeSet<Candidate>,
    /// Directories that were skipped because listing them was denied.
    pub denied: Vec<PathBuf>,
}

enum WalkEntry {
    File(Candidate),
    Descend(PathBuf),
    Skip,
}

/// Collects all files under `root` whose extension is in `allowlist`.
///
/// Symlinks are followed. Each directory is listed at most once (by canonical
/// path), which keeps symlink cycles from looping forever. When `exclude`
/// names a directory nested inside `root` (typically the destination tree),
/// that subtree is left out so earlier output isn't picked up again.
///
/// # Errors
/// Fails if `root` itself can't be resolved, or on any I/O error other than a
/// permission error while listing a directory.
#[instrument(skip_all, fields(root = %root.as_ref().display()))]
pub fn walk(root: impl AsRef<Path>, allowlist: &Extensions, exclude: Option<&Path>) -> Result<Walk> {
    walk_with(root.as_ref(), allowlist, exclude, list_dir)
}

fn list_dir(dir: &Path) -> io::Result<Vec<PathBuf>> {
    fs::read_dir(dir)?.map(|entry| entry.map(|e| e.path())).collect()
}

fn walk_with(
    root: &Path,
    allowlist: &Extensions,
    exclude: Option<&Path>,
    mut list: impl FnMut(&Path) -> io::Result<Vec<PathBuf>>,
) -> Result<Walk> {
    let root = fs::canonicalize(root).map_err(|e| ErrorKind::from_io(e, root))?;
    // A destination that doesn't exist yet has nothing in it to exclude.
    let excluded = exclude.and_then(|dir| fs::canonicalize(dir).ok()).filter(|dir| *dir != root);
    let mut result = Walk::default();
    let mut visited = HashSet::new();
    let mut stack = vec![root];

    'dirs: while let Some(current) = stack.pop() {
        if !visited.insert(current.clone()) {
            continue;
        }
        if excluded.as_ref() == Some(&current) {
            tracing::debug!(dir = %current.display(), "Skipping destination tree");
            continue;
        }
        tracing::debug!(dir = %current.display(), "Listing directory");
        let entries = match list(&current) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                deny(&mut result, current, &e);
                continue 'dirs;
            },
            Err(e) => exn::bail!(ErrorKind::from_io(e, &current)),
        };

        for entry in entries {
            match process_entry(&entry, allowlist) {
                Ok(WalkEntry::File(candidate)) => {
                    result.candidates.insert(candidate);
                },
                Ok(WalkEntry::Descend(dir)) => stack.push(dir),
                Ok(WalkEntry::Skip) => {},
                // Readable names but unreadable inodes (`r` without `x`) is
                // still a directory we aren't allowed to look into.
                Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                    deny(&mut result, current, &e);
                    continue 'dirs;
                },
                Err(e) => exn::bail!(ErrorKind::from_io(e, &current)),
            }
        }
    }

    tracing::debug!(found = result.candidates.len(), denied = result.denied.len(), "Walk complete");
    Ok(result)
}

fn deny(result: &mut Walk, dir: PathBuf, err: &io::Error) {
    tracing::warn!(dir = %dir.display(), error = %err, "Permission denied; skipping directory");
    result.denied.push(dir);
}

fn process_entry(path: &Path, allowlist: &Extensions) -> io::Result<WalkEntry> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "Skipping broken symlink");
            return Ok(WalkEntry::Skip);
        },
        Err(e) => return Err(e),
    };
    if metadata.is_dir() {
        return Ok(WalkEntry::Descend(fs::canonicalize(path)?));
    }
    if !metadata.is_file() {
        return Ok(WalkEntry::Skip);
    }
    match allowlist.classify(path) {
        Some(extension) => Ok(WalkEntry::File(Candidate::new(fs::canonicalize(path)?, extension))),
        None => Ok(WalkEntry::Skip),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, relative.as_bytes()).unwrap();
    }

    fn relative_paths(root: &Path, walk: &Walk) -> Vec<String> {
        let root = fs::canonicalize(root).unwrap();
        walk.candidates
            .iter()
            .map(|c| c.path().strip_prefix(&root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_classifies_case_insensitively() {
        let temp_dir = tempfile::tempdir().unwrap();
        touch(temp_dir.path(), "a.jpg");
        touch(temp_dir.path(), "b.txt");
        touch(temp_dir.path(), "sub/c.PNG");
        let allowlist: Extensions = ".jpg,.png".parse().unwrap();

        let walk = walk(temp_dir.path(), &allowlist, None).unwrap();
        assert_eq!(relative_paths(temp_dir.path(), &walk), vec!["a.jpg", "sub/c.PNG"]);
        let extensions: Vec<_> = walk.candidates.iter().map(Candidate::extension).collect();
        assert_eq!(extensions, vec![".jpg", ".png"]);
        assert!(walk.denied.is_empty());
    }

    #[test]
    fn test_descends_deeply() {
        let temp_dir = tempfile::tempdir().unwrap();
        touch(temp_dir.path(), "2019/holiday/day1/IMG_1.JPG");
        touch(temp_dir.path(), "2019/holiday/day2/IMG_2.cr2");
        touch(temp_dir.path(), "2019/notes.md");
        let walk = walk(temp_dir.path(), &Extensions::default(), None).unwrap();
        assert_eq!(
            relative_paths(temp_dir.path(), &walk),
            vec!["2019/holiday/day1/IMG_1.JPG", "2019/holiday/day2/IMG_2.cr2"]
        );
    }

    #[test]
    fn test_empty_tree() {
        let temp_dir = tempfile::tempdir().unwrap();
        let walk = walk(temp_dir.path(), &Extensions::default(), None).unwrap();
        assert!(walk.candidates.is_empty());
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = walk(temp_dir.path().join("nope"), &Extensions::default(), None).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[test]
    fn test_candidate_identity_is_path() {
        let a = Candidate::new("/photos/a.jpg", ".jpg");
        let b = Candidate::new("/photos/a.jpg", ".jpeg");
        assert_eq!(a, b);
        let set: BTreeSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directory_collapses() {
        let temp_dir = tempfile::tempdir().unwrap();
        touch(temp_dir.path(), "real/a.jpg");
        std::os::unix::fs::symlink(temp_dir.path().join("real"), temp_dir.path().join("alias")).unwrap();
        // A cycle back to the root must not loop forever either.
        std::os::unix::fs::symlink(temp_dir.path(), temp_dir.path().join("real/loop")).unwrap();

        let walk = walk(temp_dir.path(), &Extensions::default(), None).unwrap();
        assert_eq!(relative_paths(temp_dir.path(), &walk), vec!["real/a.jpg"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_broken_symlink_is_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        touch(temp_dir.path(), "a.jpg");
        std::os::unix::fs::symlink(temp_dir.path().join("gone.jpg"), temp_dir.path().join("dangling.jpg")).unwrap();
        let walk = walk(temp_dir.path(), &Extensions::default(), None).unwrap();
        assert_eq!(relative_paths(temp_dir.path(), &walk), vec!["a.jpg"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_permission_denied_skips_subtree() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempfile::tempdir().unwrap();
        touch(temp_dir.path(), "open/a.jpg");
        touch(temp_dir.path(), "locked/b.jpg");
        touch(temp_dir.path(), "sibling/c.jpg");
        let locked = temp_dir.path().join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        // Privileged users ignore permission bits; nothing to test there.
        let enforced = fs::read_dir(&locked).is_err();

        let result = walk(temp_dir.path(), &Extensions::default(), None);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        let walk = result.unwrap();

        if enforced {
            assert_eq!(relative_paths(temp_dir.path(), &walk), vec!["open/a.jpg", "sibling/c.jpg"]);
            assert_eq!(walk.denied, vec![fs::canonicalize(&locked).unwrap()]);
        } else {
            assert_eq!(walk.candidates.len(), 3);
        }
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);
    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn with_captured_logs<R>(run: impl FnOnce() -> R) -> (R, String) {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .without_time()
            .with_writer(move || writer.clone())
            .finish();
        let result = tracing::subscriber::with_default(subscriber, run);
        let logs = String::from_utf8_lossy(&buffer.0.lock().unwrap()).into_owned();
        (result, logs)
    }

    #[test]
    fn test_each_denied_directory_warns_once() {
        let temp_dir = tempfile::tempdir().unwrap();
        touch(temp_dir.path(), "open/a.jpg");
        touch(temp_dir.path(), "locked/b.jpg");
        touch(temp_dir.path(), "locked/inner/c.jpg");
        touch(temp_dir.path(), "vault/d.jpg");
        touch(temp_dir.path(), "vault/e.jpg");
        let root = fs::canonicalize(temp_dir.path()).unwrap();
        let refused = [root.join("locked"), root.join("vault")];

        let (result, logs) = with_captured_logs(|| {
            walk_with(temp_dir.path(), &Extensions::default(), None, |dir| match refused.iter().any(|r| r == dir) {
                true => Err(io::Error::from(io::ErrorKind::PermissionDenied)),
                false => list_dir(dir),
            })
        });
        let mut walk = result.unwrap();

        assert_eq!(relative_paths(temp_dir.path(), &walk), vec!["open/a.jpg"]);
        walk.denied.sort();
        assert_eq!(walk.denied, refused.to_vec());
        assert_eq!(logs.matches("Permission denied; skipping directory").count(), 2);
        for dir in &refused {
            assert_eq!(logs.matches(&*dir.display().to_string()).count(), 1, "{logs}");
        }
    }

    #[test]
    fn test_other_listing_errors_abort() {
        let temp_dir = tempfile::tempdir().unwrap();
        touch(temp_dir.path(), "broken/a.jpg");
        let broken = fs::canonicalize(temp_dir.path().join("broken")).unwrap();
        let err = walk_with(temp_dir.path(), &Extensions::default(), None, |dir| match dir == broken {
            true => Err(io::Error::other("disk on fire")),
            false => list_dir(dir),
        })
        .unwrap_err();
        assert!(matches!(&*err, ErrorKind::Io(_)));
    }

    #[test]
    fn test_excluded_subtree_is_not_walked() {
        let temp_dir = tempfile::tempdir().unwrap();
        touch(temp_dir.path(), "camera/a.jpg");
        touch(temp_dir.path(), "organized/2021/03/01_120000.jpg");
        touch(temp_dir.path(), "organized/2021/03/01_120000-1.jpg");
        let walk = walk(temp_dir.path(), &Extensions::default(), Some(&temp_dir.path().join("organized"))).unwrap();
        assert_eq!(relative_paths(temp_dir.path(), &walk), vec!["camera/a.jpg"]);
    }

    #[rstest::rstest]
    #[case::missing("not-created-yet")]
    #[case::is_root(".")]
    fn test_exclusion_that_cannot_apply(#[case] excluded: &str) {
        let temp_dir = tempfile::tempdir().unwrap();
        touch(temp_dir.path(), "a.jpg");
        let walk = walk(temp_dir.path(), &Extensions::default(), Some(&temp_dir.path().join(excluded))).unwrap();
        assert_eq!(relative_paths(temp_dir.path(), &walk), vec!["a.jpg"]);
    }
}
