//! Relative path validation for the destination tree.
//!
//! Every path rendered from a template is relative to the destination root
//! and must stay below it.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates and normalizes a path relative to the destination root.
///
/// `.` components and repeated or trailing separators are dropped, `..`
/// components are resolved lexically. The result must be non-empty and must
/// not climb above the root.
///
/// > **Note:** Windows drive prefixes are rejected, null bytes too.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use shoebox_storage::validate_path;
/// assert!(validate_path("2021/03/04_130509.jpg").is_ok());
/// assert!(validate_path("2021/../2022/a.jpg").is_ok());
/// assert!(validate_path("../outside.jpg").is_err());
/// assert!(validate_path("2021/../../outside.jpg").is_err());
/// assert_eq!(
///     validate_path("./2021//03/./04.jpg/").unwrap(),
///     Path::new("2021/03/04.jpg")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let original = path.as_ref();
    let invalid = || ErrorKind::InvalidPath(original.to_path_buf());
    let mut segments = Vec::new();
    for component in original.components() {
        match component {
            Component::Normal(segment) => {
                // Path::components() lets null bytes through on Unix.
                if segment.as_encoded_bytes().contains(&0) {
                    exn::bail!(invalid());
                }
                segments.push(segment);
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(invalid()),
            Component::ParentDir => {
                if segments.pop().is_none() {
                    exn::bail!(invalid());
                }
            },
        }
    }
    if segments.is_empty() {
        exn::bail!(invalid());
    }
    Ok(segments.into_iter().collect())
}
