//! Standard-name entry model and structural validation.

mod model;
mod validate;

pub use model::{Entry, Kind, Link, Provenance, Status};
pub use validate::validate;
