//! Catalog: read facade, staged mutation sessions, and semantic diffs.

#[allow(clippy::module_inception)]
mod catalog;
mod diff;
mod edit;
mod uow;

pub use catalog::{Catalog, SearchFilter};
pub use diff::{CatalogDiff, DiffCounts, RenamePair};
pub use edit::{EditCatalog, WriteReport};
pub use uow::{Intent, Projection, UnitOfWork};
