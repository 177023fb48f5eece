pub mod date;
pub mod error;
pub mod pipeline;
pub mod place;
mod template;

pub use crate::template::{DEFAULT_TEMPLATE, PathGenerator};
