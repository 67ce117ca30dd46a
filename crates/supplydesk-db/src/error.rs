//! Database-specific error types and conversions.

use supplydesk_core::error::SupplyError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Invalid stored value: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<DbError> for SupplyError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => SupplyError::NotFound { entity, id },
            other => SupplyError::Store(other.to_string()),
        }
    }
}

pub(crate) fn parse_uuid(value: &str, what: &str) -> Result<uuid::Uuid, DbError> {
    uuid::Uuid::parse_str(value).map_err(|e| DbError::Decode(format!("invalid {what} UUID: {e}")))
}
