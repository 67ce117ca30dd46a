//! Error types for the supplier directory.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SupplyError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Entity still in use: {entity} {id} is referenced by {references} link(s)")]
    InUse {
        entity: String,
        id: String,
        references: u64,
    },

    #[error("Store error: {0}")]
    Store(String),

    /// Some steps of a non-atomic write were applied before a later step
    /// failed. The association state of the supplier must be repaired.
    #[error(
        "Partial write on supplier {supplier_id}: {completed} of {total} steps applied: {message}"
    )]
    PartialWrite {
        supplier_id: String,
        completed: usize,
        total: usize,
        message: String,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SupplyError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

pub type SupplyResult<T> = Result<T, SupplyError>;
