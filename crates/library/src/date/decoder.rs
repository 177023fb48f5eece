use crate::date::error::Result;
use std::fs::File;

/// Reads the raw "original capture" tag from a file's embedded metadata.
///
/// Implementations return the tag exactly as stored (for EXIF that's
/// `YYYY:MM:DD HH:MM:SS`); parsing happens in the
/// [`DateResolver`](super::DateResolver). The file handle is positioned at
/// the start and may be left anywhere.
pub trait TagDecoder {
    fn original_capture(&self, file: &mut File) -> Result<String>;
}

impl<F> TagDecoder for F
where
    F: Fn(&mut File) -> Result<String>,
{
    fn original_capture(&self, file: &mut File) -> Result<String> {
        self(file)
    }
}

#[cfg(feature = "exif")]
pub use self::exif_decoder::ExifDecoder;

#[cfg(feature = "exif")]
mod exif_decoder {
    use super::TagDecoder;
    use crate::date::error::{ErrorKind, Result};
    use exif::{In, Reader, Tag, Value};
    use exn::{OptionExt, ResultExt};
    use std::fs::File;
    use std::io::BufReader;

    /// Reads `DateTimeOriginal` from the primary image's EXIF block.
    ///
    /// Works with any container `kamadak-exif` understands: JPEG, TIFF-based
    /// raw formats (CR2 included), PNG, HEIF and WebP.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct ExifDecoder;

    impl TagDecoder for ExifDecoder {
        fn original_capture(&self, file: &mut File) -> Result<String> {
            let mut reader = BufReader::new(file);
            let exif = Reader::new().read_from_container(&mut reader).or_raise(|| ErrorKind::Decode)?;
            let field = exif.get_field(Tag::DateTimeOriginal, In::PRIMARY).ok_or_raise(|| ErrorKind::MissingTag)?;
            match &field.value {
                Value::Ascii(values) => values
                    .first()
                    .map(|raw| String::from_utf8_lossy(raw).into_owned())
                    .ok_or_raise(|| ErrorKind::MissingTag),
                _ => exn::bail!(ErrorKind::Malformed(field.display_value().to_string())),
            }
        }
    }

}
