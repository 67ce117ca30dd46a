//! SurrealDB implementation of [`SegmentRepository`].

use chrono::{DateTime, Utc};
use supplydesk_core::error::{SupplyError, SupplyResult};
use supplydesk_core::models::segment::{CreateSegment, Segment, UpdateSegment};
use supplydesk_core::repository::{PaginatedResult, Pagination, SegmentRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::warn;
use uuid::Uuid;

use super::CountRow;
use crate::error::{DbError, parse_uuid};

// Existence check, link check and delete run as one transaction.
const DELETE_SEGMENT: &str = "\
BEGIN TRANSACTION;
LET $segment = type::record('segment', $id);
IF array::len((SELECT VALUE id FROM $segment)) = 0 {
    THROW string::concat('segment not found: ', $id);
};
IF array::len((SELECT VALUE id FROM in_segment WHERE out = $segment)) > 0 {
    THROW string::concat('segment still linked: ', $id);
};
DELETE $segment;
COMMIT TRANSACTION;";

#[derive(Debug, SurrealValue)]
struct SegmentRow {
    name: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct SegmentRowWithId {
    record_id: String,
    name: String,
    created_at: DateTime<Utc>,
}

impl SegmentRowWithId {
    fn try_into_segment(self) -> Result<Segment, DbError> {
        Ok(Segment {
            id: parse_uuid(&self.record_id, "segment")?,
            name: self.name,
            created_at: self.created_at,
        })
    }
}

fn single(rows: Vec<SegmentRow>, id: Uuid) -> Result<Segment, DbError> {
    let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
        entity: "segment".into(),
        id: id.to_string(),
    })?;
    Ok(Segment {
        id,
        name: row.name,
        created_at: row.created_at,
    })
}

/// SurrealDB implementation of the Segment repository.
#[derive(Clone)]
pub struct SurrealSegmentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSegmentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn exists(&self, id: Uuid) -> Result<bool, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM segment \
                 WHERE id = type::record('segment', $id) GROUP ALL",
            )
            .bind(("id", id.to_string()))
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0) > 0)
    }

    async fn link_count(&self, id: Uuid) -> Result<u64, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM in_segment \
                 WHERE out = type::record('segment', $id) GROUP ALL",
            )
            .bind(("id", id.to_string()))
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}

impl<C: Connection> SegmentRepository for SurrealSegmentRepository<C> {
    async fn create(&self, input: CreateSegment) -> SupplyResult<Segment> {
        let id = Uuid::new_v4();

        let result = self
            .db
            .query("CREATE type::record('segment', $id) SET name = $name")
            .bind(("id", id.to_string()))
            .bind(("name", input.name))
            .await
            .map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<SegmentRow> = result.take(0).map_err(DbError::from)?;
        Ok(single(rows, id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> SupplyResult<Segment> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('segment', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SegmentRow> = result.take(0).map_err(DbError::from)?;
        Ok(single(rows, id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateSegment) -> SupplyResult<Segment> {
        let result = self
            .db
            .query("UPDATE type::record('segment', $id) SET name = $name")
            .bind(("id", id.to_string()))
            .bind(("name", input.name))
            .await
            .map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<SegmentRow> = result.take(0).map_err(DbError::from)?;
        Ok(single(rows, id)?)
    }

    async fn delete(&self, id: Uuid) -> SupplyResult<()> {
        let outcome = self
            .db
            .query(DELETE_SEGMENT)
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check();
        let Err(err) = outcome else {
            return Ok(());
        };

        // The transaction was cancelled; find out which guard tripped.
        if !self.exists(id).await? {
            return Err(DbError::NotFound {
                entity: "segment".into(),
                id: id.to_string(),
            }
            .into());
        }
        let references = self.link_count(id).await?;
        if references > 0 {
            warn!(segment_id = %id, references, "Refusing to delete linked segment");
            return Err(SupplyError::InUse {
                entity: "segment".into(),
                id: id.to_string(),
                references,
            });
        }
        Err(DbError::Query(err.to_string()).into())
    }

    async fn list(
        &self,
        name: Option<&str>,
        pagination: Pagination,
    ) -> SupplyResult<PaginatedResult<Segment>> {
        let filter = if name.is_some() {
            " WHERE string::contains(string::lowercase(name), $name)"
        } else {
            ""
        };
        let script = format!(
            "SELECT count() AS total FROM segment{filter} GROUP ALL;\n\
             SELECT meta::id(id) AS record_id, * FROM segment{filter} \
             ORDER BY name ASC LIMIT $limit START $offset;"
        );

        let mut builder = self
            .db
            .query(&script)
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset));
        if let Some(name) = name {
            builder = builder.bind(("name", name.to_lowercase()));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let rows: Vec<SegmentRowWithId> = result.take(1).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(SegmentRowWithId::try_into_segment)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn list_all(&self) -> SupplyResult<Vec<Segment>> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM segment ORDER BY name ASC")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SegmentRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(SegmentRowWithId::try_into_segment)
            .collect::<Result<Vec<_>, DbError>>()?)
    }
}
