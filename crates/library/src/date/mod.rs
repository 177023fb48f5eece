//! Capture date resolution.
//!
//! A file's capture date comes from its embedded metadata when possible (the
//! EXIF `DateTimeOriginal` tag) and from filesystem timestamps otherwise. The
//! [`DateResolver`] decides which, once per run, and applies a
//! [`MetadataFailure`] policy to files whose metadata is missing or broken.

mod decoder;
pub mod error;
mod resolver;

#[cfg(feature = "exif")]
pub use self::decoder::ExifDecoder;
pub use self::decoder::TagDecoder;
pub use self::resolver::{CAPTURE_TAG_FORMAT, DateResolver, DateSource, MetadataFailure, Resolved, parse_capture_tag};
