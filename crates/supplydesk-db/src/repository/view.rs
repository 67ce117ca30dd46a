//! SurrealDB implementation of [`SupplierViewStore`].

use chrono::{DateTime, Utc};
use supplydesk_core::error::SupplyResult;
use supplydesk_core::models::view::SupplierViewRecord;
use supplydesk_core::repository::{SupplierViewStore, ViewQuery, ViewQueryResult};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use super::CountRow;
use crate::error::{DbError, parse_uuid};
use crate::schema::SUPPLIER_VIEW;

#[derive(Debug, SurrealValue)]
struct SupplierViewRow {
    record_id: String,
    name: String,
    logo: Option<String>,
    created_at: DateTime<Utc>,
    identifiers: Vec<Option<String>>,
    segments: Vec<Option<String>>,
}

impl SupplierViewRow {
    fn try_into_record(self) -> Result<SupplierViewRecord, DbError> {
        Ok(SupplierViewRecord {
            id: parse_uuid(&self.record_id, "supplier")?,
            name: self.name,
            logo: self.logo,
            created_at: self.created_at,
            identifiers: self.identifiers,
            segments: self.segments,
        })
    }
}

/// Builds the count and row statements for one projection query.
fn view_script(query: &ViewQuery) -> String {
    let mut conditions = Vec::new();
    if query.name.is_some() {
        conditions.push("string::contains(string::lowercase(name), $name)");
    }
    if query.segment.is_some() {
        conditions.push("segments CONTAINS $segment");
    }
    let filter = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };
    let window = if query.window.is_some() {
        " LIMIT $limit START $offset"
    } else {
        ""
    };

    format!(
        "SELECT count() AS total FROM ({SUPPLIER_VIEW}){filter} GROUP ALL;\n\
         SELECT * FROM ({SUPPLIER_VIEW}){filter} ORDER BY name ASC{window};"
    )
}

/// SurrealDB implementation of the supplier projection reader.
#[derive(Clone)]
pub struct SurrealSupplierViewStore<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSupplierViewStore<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SupplierViewStore for SurrealSupplierViewStore<C> {
    async fn query(&self, query: ViewQuery) -> SupplyResult<ViewQueryResult> {
        let script = view_script(&query);

        let mut builder = self.db.query(&script);
        if let Some(name) = &query.name {
            builder = builder.bind(("name", name.to_lowercase()));
        }
        if let Some(segment) = &query.segment {
            builder = builder.bind(("segment", segment.clone()));
        }
        if let Some(window) = query.window {
            builder = builder
                .bind(("limit", window.limit))
                .bind(("offset", window.offset));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let rows: Vec<SupplierViewRow> = result.take(1).map_err(DbError::from)?;
        let rows = rows
            .into_iter()
            .map(SupplierViewRow::try_into_record)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(ViewQueryResult { rows, total })
    }
}
