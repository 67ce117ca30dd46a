//! Write-intent log for plans executed without a transaction.
//!
//! An intent row is written before the first step of a sequential plan
//! and removed after the last one. A row that survives marks a supplier
//! whose associations may be half replaced.

use chrono::{DateTime, Utc};
use supplydesk_core::plan::WritePlan;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{DbError, parse_uuid};

/// A sequential write plan that has not been confirmed complete.
#[derive(Debug, Clone)]
pub struct WriteIntent {
    pub id: Uuid,
    pub supplier_id: Uuid,
    /// `create` or `update`.
    pub operation: String,
    pub total_steps: u64,
    /// The submitted plan, as JSON, for manual replay.
    pub plan: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct WriteIntentRow {
    record_id: String,
    supplier_id: String,
    operation: String,
    total_steps: u64,
    plan: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl WriteIntentRow {
    fn try_into_intent(self) -> Result<WriteIntent, DbError> {
        Ok(WriteIntent {
            id: parse_uuid(&self.record_id, "write intent")?,
            supplier_id: parse_uuid(&self.supplier_id, "supplier")?,
            operation: self.operation,
            total_steps: self.total_steps,
            plan: self.plan,
            created_at: self.created_at,
        })
    }
}

#[derive(Clone)]
pub(crate) struct WriteIntentLog<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> WriteIntentLog<C> {
    pub(crate) fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    pub(crate) async fn record(
        &self,
        supplier_id: Uuid,
        plan: &WritePlan,
    ) -> Result<Uuid, DbError> {
        let id = Uuid::new_v4();
        let payload = serde_json::to_value(plan)
            .map_err(|e| DbError::Query(format!("cannot encode write plan: {e}")))?;

        self.db
            .query(
                "CREATE type::record('write_intent', $id) SET \
                 supplier_id = $supplier_id, \
                 operation = $operation, \
                 total_steps = $total_steps, \
                 plan = $plan",
            )
            .bind(("id", id.to_string()))
            .bind(("supplier_id", supplier_id.to_string()))
            .bind(("operation", plan.operation()))
            .bind(("total_steps", plan.total_steps() as u64))
            .bind(("plan", payload))
            .await?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(id)
    }

    pub(crate) async fn resolve(&self, id: Uuid) -> Result<(), DbError> {
        self.db
            .query("DELETE type::record('write_intent', $id)")
            .bind(("id", id.to_string()))
            .await?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;
        Ok(())
    }

    pub(crate) async fn pending(&self) -> Result<Vec<WriteIntent>, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM write_intent \
                 ORDER BY created_at ASC",
            )
            .await?;
        let rows: Vec<WriteIntentRow> = result.take(0)?;
        rows.into_iter().map(WriteIntentRow::try_into_intent).collect()
    }
}
