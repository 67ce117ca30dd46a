//! SurrealDB store implementations.

mod intent;
mod segment;
mod supplier;
mod view;

pub use intent::WriteIntent;
pub use segment::SurrealSegmentRepository;
pub use supplier::{SurrealSupplierStore, WriteMode};
pub use view::SurrealSupplierViewStore;

use surrealdb_types::SurrealValue;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
pub(crate) struct CountRow {
    pub(crate) total: u64,
}
