//! Path templating for date-based organization.
//!
//! Converts a capture timestamp into a deterministic relative path using a
//! `strftime`-style template (the `%` specifiers understood by
//! [`chrono::format::strftime`]). Directory separators in the template become
//! directories in the destination tree.
//!
//! # Common Specifiers
//!
//! | Specifier | Example | Description                    |
//! |-----------|---------|--------------------------------|
//! | `%Y`      | `2021`  | Year, four digits              |
//! | `%m`      | `03`    | Month, zero-padded             |
//! | `%d`      | `04`    | Day of month, zero-padded      |
//! | `%H`      | `13`    | Hour (24h), zero-padded        |
//! | `%M`      | `05`    | Minute, zero-padded            |
//! | `%S`      | `09`    | Second, zero-padded            |
//! | `%B`      | `March` | Full month name                |
//!
//! Timestamps carry no timezone, so offset specifiers (`%z`, `%Z`, `%+`) are
//! rejected when the template is compiled.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use shoebox_library::PathGenerator;
//!
//! let taken = NaiveDate::from_ymd_opt(2021, 3, 4).unwrap().and_hms_opt(13, 5, 9).unwrap();
//! let generator: PathGenerator = "%Y/%m/%d_%H%M%S".parse().unwrap();
//! let path = generator.generate_with_ext(&taken, ".JPG").unwrap();
//! assert_eq!(path, std::path::Path::new("2021/03/04_130509.jpg"));
//! ```

use crate::error::{Error, ErrorKind, Result};
use chrono::{NaiveDate, NaiveDateTime};
use exn::ResultExt;
use shoebox_storage::validate_path;
use std::fmt::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;

/// Template used when none is configured.
pub const DEFAULT_TEMPLATE: &str = "%Y/%m/%d_%H%M%S";

/// Generates deterministic relative paths from capture timestamps and a
/// user-defined template string.
///
/// Constructed via [`FromStr`], which test-renders the template so that bad
/// specifiers or paths escaping the destination root surface at creation
/// time rather than halfway through a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathGenerator {
    template: String,
}
impl FromStr for PathGenerator {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let generator = Self { template: s.trim().to_string() };
        // Rendering only ever substitutes digits and names for specifiers, so
        // if one date renders to a valid path, every date does.
        let probe = NaiveDate::from_ymd_opt(2000, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0)).unwrap_or_default();
        generator.generate(&probe)?;
        Ok(generator)
    }
}
impl Default for PathGenerator {
    fn default() -> Self {
        Self { template: DEFAULT_TEMPLATE.to_string() }
    }
}
impl fmt::Display for PathGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}
impl PathGenerator {
    /// Renders the template for `timestamp`, returning the normalized path
    /// without any file extension.
    pub fn generate(&self, timestamp: &NaiveDateTime) -> Result<PathBuf> {
        Self::normalize(self.render(timestamp)?)
    }

    /// Renders the template and appends the lower-cased file extension.
    ///
    /// The extension is trimmed of surrounding dots, so both `"jpg"` and
    /// `".JPG"` produce the same result.
    ///
    /// ```text
    /// generate(…)                  → "2021/03/04_130509"
    /// generate_with_ext(…, ".JPG") → "2021/03/04_130509.jpg"
    /// ```
    pub fn generate_with_ext(&self, timestamp: &NaiveDateTime, ext: impl AsRef<str>) -> Result<PathBuf> {
        let path = self.render(timestamp)?;
        let ext = ext.as_ref().trim().trim_matches('.').to_lowercase();
        match ext.is_empty() {
            true => Self::normalize(path),
            false => Self::normalize(format!("{}.{ext}", path.trim_end())),
        }
    }

    fn render(&self, timestamp: &NaiveDateTime) -> Result<String> {
        let mut rendered = String::new();
        // `to_string()` would panic on unsupported specifiers, `write!` lets
        // us turn that into an error instead.
        write!(rendered, "{}", timestamp.format(&self.template)).or_raise(|| ErrorKind::Template)?;
        // The last segment becomes the file name; `2021/03/` would otherwise
        // place files at `2021/03/.jpg`.
        let name = rendered.rsplit('/').next().unwrap_or_default().trim();
        if matches!(name, "" | "." | "..") {
            exn::bail!(ErrorKind::Template);
        }
        Ok(rendered)
    }

    /// Trims each path segment, joins them with `/`, then validates via
    /// [`shoebox_storage::validate_path`].
    fn normalize(s: impl Into<String>) -> Result<PathBuf> {
        let path = s.into().trim().split('/').map(str::trim).collect::<Vec<_>>().join("/");
        validate_path(&path).or_raise(|| ErrorKind::Template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::path::Path;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d).unwrap().and_hms_opt(h, mi, s).unwrap()
    }

    #[test]
    fn test_default_template() {
        let generator = PathGenerator::default();
        let path = generator.generate_with_ext(&at(2021, 3, 4, 13, 5, 9), ".jpg").unwrap();
        assert_eq!(path, Path::new("2021/03/04_130509.jpg"));
        assert_eq!(generator.to_string(), DEFAULT_TEMPLATE);
    }

    #[rstest]
    #[case("%Y/%m/%d_%H%M%S", ".jpg", "2021/03/04_130509.jpg")]
    #[case("%Y/%B/%d", "PNG", "2021/March/04.png")]
    #[case("%Y-%m/%Y%m%d-%H%M%S", ".CR2", "2021-03/20210304-130509.cr2")]
    #[case("photos/%Y/ %m /%H%M%S", "jpeg", "photos/2021/03/130509.jpeg")]
    #[case("%Y//%m/./%d", ".jpg", "2021/03/04.jpg")]
    #[case("%Y/%m/%d", "", "2021/03/04")]
    fn test_generate_with_ext(#[case] template: &str, #[case] ext: &str, #[case] expected: &str) {
        let generator: PathGenerator = template.parse().unwrap();
        let path = generator.generate_with_ext(&at(2021, 3, 4, 13, 5, 9), ext).unwrap();
        assert_eq!(path, Path::new(expected));
    }

    #[test]
    fn test_file_name_is_never_just_the_extension() {
        let generator: PathGenerator = "%Y/%m/%d".parse().unwrap();
        let path = generator.generate_with_ext(&at(2021, 3, 4, 13, 5, 9), ".jpg").unwrap();
        assert_eq!(path.file_stem().unwrap(), "04");
        assert!("%Y/%m/".parse::<PathGenerator>().is_err());
    }

    #[test]
    fn test_generate_without_ext() {
        let generator: PathGenerator = "%Y/%m/%d_%H%M%S".parse().unwrap();
        assert_eq!(generator.generate(&at(1999, 12, 31, 23, 59, 59)).unwrap(), Path::new("1999/12/31_235959"));
    }

    #[test]
    fn test_deterministic() {
        let generator: PathGenerator = "%Y/%m/%d_%H%M%S".parse().unwrap();
        let taken = at(2021, 3, 4, 13, 5, 9);
        let first = generator.generate_with_ext(&taken, ".jpg").unwrap();
        for _ in 0..3 {
            assert_eq!(generator.generate_with_ext(&taken, ".jpg").unwrap(), first);
        }
    }

    #[rstest]
    #[case("%Y/%Q")]
    #[case("%Y/%z")]
    #[case("%Y/%Z")]
    #[case("%+")]
    #[case("")]
    #[case("../%Y")]
    #[case("%Y/../../%m")]
    #[case("%Y/%m/")]
    #[case("%Y/%m/ ")]
    #[case("%Y/%m/.")]
    #[case("%Y/%m/..")]
    #[case("/")]
    fn test_rejects_invalid_templates(#[case] template: &str) {
        let err = template.parse::<PathGenerator>().unwrap_err();
        assert!(matches!(&*err, ErrorKind::Template));
    }
}
