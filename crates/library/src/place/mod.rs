//! Placing source files into the destination tree.
//!
//! Each [`Candidate`](shoebox_storage::Candidate) is dated, given a path by
//! the template, checked against what's already at the destination and then
//! copied. See [`place_file`].

mod conflict;
pub mod error;
mod file;

pub use self::conflict::CollisionPolicy;
pub use self::file::{Action, Context, Placement, place_file};
