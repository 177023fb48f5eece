//! The extension allowlist used to classify files during a walk.

use crate::error::{Error, ErrorKind, Result};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Extensions recognised when no allowlist is configured.
pub const DEFAULT_EXTENSIONS: &str = ".jpg,.jpeg,.cr2,.png";

/// An ordered, case-insensitive set of file extensions.
///
/// Entries are stored lower-cased with a single leading dot (`".jpg"`), in the
/// order they were first seen. Duplicates collapse to the first occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extensions(Vec<String>);

impl Extensions {
    /// Builds an allowlist from individual entries such as `"jpg"`, `".JPG"`
    /// or `" .png "`. Blank entries are ignored.
    ///
    /// Fails with [`ErrorKind::InvalidExtension`] when an entry contains a
    /// dot or separator past its leading dot (those could never equal the
    /// final extension of a path), or when nothing is left.
    pub fn new<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for entry in entries {
            let trimmed = entry.as_ref().trim();
            if trimmed.is_empty() {
                continue;
            }
            let bare = trimmed.strip_prefix('.').unwrap_or(trimmed).to_lowercase();
            if bare.is_empty() || bare.contains(['.', '/', '\\']) || bare.chars().any(char::is_whitespace) {
                exn::bail!(ErrorKind::InvalidExtension(trimmed.to_string()));
            }
            let dotted = format!(".{bare}");
            if !normalized.contains(&dotted) {
                normalized.push(dotted);
            }
        }
        if normalized.is_empty() {
            exn::bail!(ErrorKind::InvalidExtension(String::new()));
        }
        Ok(Self(normalized))
    }

    /// Returns the lower-cased, dot-prefixed extension of `path` if it is in
    /// the allowlist.
    ///
    /// Dotfiles such as `.jpg` have no extension and never match.
    pub fn classify(&self, path: impl AsRef<Path>) -> Option<String> {
        let ext = path.as_ref().extension()?.to_str()?;
        let dotted = format!(".{}", ext.to_lowercase());
        self.0.contains(&dotted).then_some(dotted)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for Extensions {
    fn default() -> Self {
        Self(DEFAULT_EXTENSIONS.split(',').map(str::to_string).collect())
    }
}

impl FromStr for Extensions {
    type Err = Error;

    /// Parses a comma-separated list, e.g. `"jpg, .JPEG,png"`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::new(s.split(','))
    }
}

impl fmt::Display for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(","))
    }
}
