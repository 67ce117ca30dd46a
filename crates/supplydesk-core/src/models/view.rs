//! Denormalized read model used for listing and search.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A supplier joined with its identifiers and segment names.
///
/// Never written directly; the store derives it from the write tables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SupplierView {
    pub id: Uuid,
    pub name: String,
    pub logo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub identifiers: Vec<String>,
    pub segments: Vec<String>,
}

/// A row of the projection as the store returns it. The join can leave
/// null placeholders in both sequences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierViewRecord {
    pub id: Uuid,
    pub name: String,
    pub logo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub identifiers: Vec<Option<String>>,
    pub segments: Vec<Option<String>>,
}

impl SupplierViewRecord {
    /// Drops the null placeholders.
    pub fn into_view(self) -> SupplierView {
        SupplierView {
            id: self.id,
            name: self.name,
            logo: self.logo,
            created_at: self.created_at,
            identifiers: self.identifiers.into_iter().flatten().collect(),
            segments: self.segments.into_iter().flatten().collect(),
        }
    }
}

/// Directory filters. Empty strings count as absent.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SupplierFilters {
    /// Case-insensitive substring of the supplier name.
    pub name: Option<String>,
    /// Case-insensitive substring of any identifier.
    pub identifier: Option<String>,
    /// Exact segment name.
    pub segment: Option<String>,
}

impl SupplierFilters {
    /// Returns the filters with blank values replaced by `None`.
    pub fn normalized(&self) -> Self {
        fn active(value: &Option<String>) -> Option<String> {
            value.as_ref().filter(|v| !v.is_empty()).cloned()
        }
        Self {
            name: active(&self.name),
            identifier: active(&self.identifier),
            segment: active(&self.segment),
        }
    }
}
