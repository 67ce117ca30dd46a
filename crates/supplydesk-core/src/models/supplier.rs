//! Supplier domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Supplier {
    pub id: Uuid,
    pub name: String,
    /// Absolute URL of the supplier logo.
    pub logo: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Full submission for a create or an update.
///
/// Updates have replace semantics: the association sets of the supplier
/// become exactly `identifiers` and `segment_ids`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SupplierInput {
    pub name: String,
    pub logo: Option<String>,
    /// Raw identifiers; separators are ignored, 14 digits must remain.
    pub identifiers: Vec<String>,
    pub segment_ids: Vec<Uuid>,
}

/// Current association sets of one supplier.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SupplierAssociations {
    /// Canonical identifier values.
    pub identifiers: Vec<String>,
    pub segment_ids: Vec<Uuid>,
}

/// A supplier together with its association sets, as loaded for editing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierDetails {
    pub supplier: Supplier,
    pub associations: SupplierAssociations,
}
