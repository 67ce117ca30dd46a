//! Schema definitions and migration runner for SurrealDB.
//!
//! Tables are SCHEMAFULL. UUIDs are stored as strings; segment
//! membership is a graph edge from `supplier` to `segment`.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct AppliedVersion {
    version: u32,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "supplier_directory",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- Suppliers
DEFINE TABLE supplier SCHEMAFULL;
DEFINE FIELD name ON TABLE supplier TYPE string \
    ASSERT string::len($value) >= 2 AND string::len($value) <= 255;
DEFINE FIELD logo ON TABLE supplier TYPE option<string>;
DEFINE FIELD created_at ON TABLE supplier TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_supplier_name ON TABLE supplier COLUMNS name;

-- Tax-registration identifiers, owned by one supplier
DEFINE TABLE identifier SCHEMAFULL;
DEFINE FIELD supplier_id ON TABLE identifier TYPE string;
DEFINE FIELD value ON TABLE identifier TYPE string;
DEFINE FIELD created_at ON TABLE identifier TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_identifier_supplier ON TABLE identifier \
    COLUMNS supplier_id;

-- Retail segments
DEFINE TABLE segment SCHEMAFULL;
DEFINE FIELD name ON TABLE segment TYPE string \
    ASSERT string::len($value) >= 2 AND string::len($value) <= 100;
DEFINE FIELD created_at ON TABLE segment TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_segment_name ON TABLE segment COLUMNS name;

-- Supplier -> Segment membership
DEFINE TABLE in_segment TYPE RELATION SCHEMAFULL;
DEFINE FIELD created_at ON TABLE in_segment TYPE datetime \
    DEFAULT time::now();

-- Sequential write plans in flight
DEFINE TABLE write_intent SCHEMAFULL;
DEFINE FIELD supplier_id ON TABLE write_intent TYPE string;
DEFINE FIELD operation ON TABLE write_intent TYPE string \
    ASSERT $value IN ['create', 'update'];
DEFINE FIELD total_steps ON TABLE write_intent TYPE int;
DEFINE FIELD plan ON TABLE write_intent TYPE object FLEXIBLE;
DEFINE FIELD created_at ON TABLE write_intent TYPE datetime \
    DEFAULT time::now();
";

/// Projection joining each supplier with its identifier values and
/// segment names. Every directory read selects from this.
///
/// A link whose segment record is gone yields a `NONE` entry.
pub(crate) const SUPPLIER_VIEW: &str = "\
SELECT \
    meta::id(id) AS record_id, \
    name, \
    logo, \
    created_at, \
    array::sort((SELECT VALUE value FROM identifier \
        WHERE supplier_id = meta::id($parent.id))) AS identifiers, \
    array::sort(->in_segment->segment.name) AS segments \
FROM supplier";

async fn current_version<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let applied: Vec<AppliedVersion> = result.take(0)?;
    Ok(applied.first().map(|m| m.version).unwrap_or(0))
}

async fn apply<C: Connection>(db: &Surreal<C>, migration: &Migration) -> Result<(), DbError> {
    db.query(migration.sql).await?.check().map_err(|e| {
        DbError::Migration(format!(
            "v{} '{}' failed: {e}",
            migration.version, migration.name
        ))
    })?;

    db.query("CREATE _migration SET version = $version, name = $name")
        .bind(("version", migration.version))
        .bind(("name", migration.name))
        .await?
        .check()
        .map_err(|e| {
            DbError::Migration(format!(
                "could not record v{}: {e}",
                migration.version
            ))
        })?;
    Ok(())
}

/// Run all pending migrations against the given SurrealDB client.
///
/// Safe to call on every start: versions at or below the recorded
/// maximum are skipped.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let current = current_version(db).await?;
    let pending = MIGRATIONS.iter().filter(|m| m.version > current);

    for migration in pending {
        info!(
            version = migration.version,
            name = migration.name,
            "Applying migration"
        );
        apply(db, migration).await?;
    }

    info!(
        version = MIGRATIONS.last().map(|m| m.version).unwrap_or(0),
        "Schema up to date"
    );
    Ok(())
}

/// Returns the raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
