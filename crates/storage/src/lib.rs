pub mod backend;
pub mod error;
mod extension;
mod path;
mod timestamp;
pub mod walk;

pub use crate::backend::Destination;
pub use crate::extension::{DEFAULT_EXTENSIONS, Extensions};
pub use crate::path::validate as validate_path;
pub use crate::timestamp::{FileTimestamp, TimestampSource, file_timestamp};
pub use crate::walk::{Candidate, walk};

pub type DestinationHandle = Box<dyn Destination>;
