//! Supplydesk Service — supplier reconciliation, directory search,
//! segment management and debounced search control.
//!
//! Generic over the `supplydesk-core` store traits so that the service
//! layer has no dependency on the database crate.

pub mod config;
mod debounce;
pub mod directory;
pub mod reconciler;
pub mod search;
pub mod segment_search;
pub mod segments;

pub use config::DirectoryConfig;
pub use debounce::SEARCH_DEBOUNCE;
pub use directory::{DirectoryQueryEngine, SupplierDirectory};
pub use reconciler::AssociationReconciler;
pub use search::{SearchController, SearchDraft, SearchSnapshot};
pub use segment_search::{SegmentSearch, SegmentSnapshot};
pub use segments::SegmentCatalog;
