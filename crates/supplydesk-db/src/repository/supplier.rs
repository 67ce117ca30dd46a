//! SurrealDB implementation of [`SupplierStore`].

use chrono::{DateTime, Utc};
use supplydesk_core::error::SupplyResult;
use supplydesk_core::models::supplier::{Supplier, SupplierAssociations};
use supplydesk_core::plan::{AssociationStep, PlanFailure, PlanTarget, WritePlan, WriteReceipt};
use supplydesk_core::repository::SupplierStore;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, warn};
use uuid::Uuid;

use super::CountRow;
use super::intent::{WriteIntent, WriteIntentLog};
use crate::error::{DbError, parse_uuid};

/// How a [`WritePlan`] reaches the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// All steps inside one transaction; a failure rolls everything back.
    #[default]
    Atomic,
    /// One statement per step, bracketed by a write-intent record.
    Sequential,
}

impl std::str::FromStr for WriteMode {
    type Err = DbError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "atomic" => Ok(Self::Atomic),
            "sequential" => Ok(Self::Sequential),
            other => Err(DbError::Config(format!(
                "unknown write mode '{other}' (expected atomic or sequential)"
            ))),
        }
    }
}

const INSERT_SUPPLIER: &str = "CREATE type::record('supplier', $id) SET \
     name = $name, logo = $logo";

// UPDATE on a missing record writes nothing and succeeds, which would let
// the association steps after it run against a deleted supplier.
const UPDATE_SUPPLIER: &str = "\
LET $current = (SELECT VALUE id FROM type::record('supplier', $id)); \
IF array::len($current) = 0 { THROW string::concat('supplier does not exist: ', $id); }; \
UPDATE type::record('supplier', $id) SET name = $name, logo = $logo";

const CLEAR_IDENTIFIERS: &str = "DELETE identifier WHERE supplier_id = $id";

const CLEAR_SEGMENT_LINKS: &str = "DELETE in_segment WHERE in = type::record('supplier', $id)";

fn insert_identifiers(param: &str) -> String {
    format!(
        "FOR $identifier IN ${param} {{ \
         CREATE identifier SET supplier_id = $id, value = $identifier; \
         }}"
    )
}

// RELATE does not require the target to exist, so check it first.
fn insert_segment_links(param: &str) -> String {
    format!(
        "FOR $segment_id IN ${param} {{ \
         LET $supplier = type::record('supplier', $id); \
         LET $segment = type::record('segment', $segment_id); \
         LET $found = (SELECT VALUE id FROM $segment); \
         IF array::len($found) = 0 {{ \
             THROW string::concat('unknown segment: ', $segment_id); \
         }}; \
         RELATE $supplier->in_segment->$segment; \
         }}"
    )
}

/// One statement of a plan plus the list it iterates, if any.
#[derive(Debug)]
struct Statement {
    sql: String,
    values: Option<(String, Vec<String>)>,
}

impl Statement {
    fn plain(sql: &str) -> Self {
        Self {
            sql: sql.to_owned(),
            values: None,
        }
    }

    fn for_step(index: usize, step: &AssociationStep) -> Self {
        match step {
            AssociationStep::ClearIdentifiers => Self::plain(CLEAR_IDENTIFIERS),
            AssociationStep::ClearSegmentLinks => Self::plain(CLEAR_SEGMENT_LINKS),
            AssociationStep::InsertIdentifiers(values) => {
                let param = format!("identifiers_{index}");
                Self {
                    sql: insert_identifiers(&param),
                    values: Some((param, values.clone())),
                }
            }
            AssociationStep::InsertSegmentLinks(ids) => {
                let param = format!("segment_ids_{index}");
                Self {
                    sql: insert_segment_links(&param),
                    values: Some((param, ids.iter().map(Uuid::to_string).collect())),
                }
            }
        }
    }
}

fn plan_statements(plan: &WritePlan) -> Vec<Statement> {
    let scalar = match plan.target {
        PlanTarget::New => INSERT_SUPPLIER,
        PlanTarget::Existing(_) => UPDATE_SUPPLIER,
    };
    std::iter::once(Statement::plain(scalar))
        .chain(
            plan.associations
                .iter()
                .enumerate()
                .map(|(index, step)| Statement::for_step(index, step)),
        )
        .collect()
}

fn transaction_script(statements: &[Statement]) -> String {
    let body = statements
        .iter()
        .map(|s| s.sql.as_str())
        .collect::<Vec<_>>()
        .join(";\n");
    format!("BEGIN TRANSACTION;\n{body};\nCOMMIT TRANSACTION;")
}

#[derive(Debug, SurrealValue)]
struct SupplierRow {
    name: String,
    logo: Option<String>,
    created_at: DateTime<Utc>,
}

/// SurrealDB implementation of the supplier write store.
#[derive(Clone)]
pub struct SurrealSupplierStore<C: Connection> {
    db: Surreal<C>,
    write_mode: WriteMode,
    intents: WriteIntentLog<C>,
}

impl<C: Connection> SurrealSupplierStore<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self {
            intents: WriteIntentLog::new(db.clone()),
            db,
            write_mode: WriteMode::default(),
        }
    }

    pub fn with_write_mode(mut self, write_mode: WriteMode) -> Self {
        self.write_mode = write_mode;
        self
    }

    pub fn write_mode(&self) -> WriteMode {
        self.write_mode
    }

    /// Sequential plans that failed part-way, oldest first.
    pub async fn pending_intents(&self) -> SupplyResult<Vec<WriteIntent>> {
        Ok(self.intents.pending().await?)
    }

    /// Drop an intent once the supplier has been repaired.
    pub async fn resolve_intent(&self, id: Uuid) -> SupplyResult<()> {
        Ok(self.intents.resolve(id).await?)
    }

    async fn execute(
        &self,
        sql: &str,
        supplier_id: Uuid,
        plan: &WritePlan,
        lists: &[&Statement],
    ) -> Result<(), DbError> {
        let mut query = self
            .db
            .query(sql)
            .bind(("id", supplier_id.to_string()))
            .bind(("name", plan.fields.name.clone()))
            .bind(("logo", plan.fields.logo.clone()));

        for (param, values) in lists.iter().filter_map(|s| s.values.as_ref()) {
            query = query.bind((param.clone(), values.clone()));
        }

        query
            .await?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;
        Ok(())
    }

    async fn apply_atomic(
        &self,
        supplier_id: Uuid,
        plan: &WritePlan,
        statements: &[Statement],
    ) -> Result<(), PlanFailure> {
        let script = transaction_script(statements);
        let lists: Vec<&Statement> = statements.iter().collect();

        self.execute(&script, supplier_id, plan, &lists)
            .await
            .map_err(|e| PlanFailure {
                supplier_id,
                completed: 0,
                total: statements.len(),
                rolled_back: true,
                target_missing: false,
                message: e.to_string(),
            })
    }

    async fn apply_sequential(
        &self,
        supplier_id: Uuid,
        plan: &WritePlan,
        statements: &[Statement],
    ) -> Result<(), PlanFailure> {
        let total = statements.len();
        let failure = |completed: usize, err: DbError| PlanFailure {
            supplier_id,
            completed,
            total,
            rolled_back: false,
            target_missing: false,
            message: err.to_string(),
        };

        let intent_id = self
            .intents
            .record(supplier_id, plan)
            .await
            .map_err(|e| failure(0, e))?;

        for (completed, statement) in statements.iter().enumerate() {
            if let Err(err) = self
                .execute(&statement.sql, supplier_id, plan, &[statement])
                .await
            {
                if completed == 0 {
                    // Nothing was applied, so there is nothing to repair.
                    self.resolve_quietly(intent_id).await;
                } else {
                    warn!(
                        supplier_id = %supplier_id,
                        %intent_id,
                        completed,
                        total,
                        error = %err,
                        "Sequential write stopped part-way"
                    );
                }
                return Err(failure(completed, err));
            }
        }

        self.resolve_quietly(intent_id).await;
        Ok(())
    }

    async fn resolve_quietly(&self, intent_id: Uuid) {
        if let Err(err) = self.intents.resolve(intent_id).await {
            warn!(%intent_id, error = %err, "Write intent was not cleared");
        }
    }

    /// Whether a failed plan targeted a supplier that no longer exists.
    async fn target_missing(&self, plan: &WritePlan) -> bool {
        match plan.target {
            PlanTarget::New => false,
            PlanTarget::Existing(id) => matches!(self.exists(id).await, Ok(false)),
        }
    }

    async fn fetch(&self, id: Uuid) -> Result<Supplier, DbError> {
        let id_str = id.to_string();
        let mut result = self
            .db
            .query("SELECT * FROM type::record('supplier', $id)")
            .bind(("id", id_str.clone()))
            .await?;

        let rows: Vec<SupplierRow> = result.take(0)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "supplier".into(),
            id: id_str,
        })?;

        Ok(Supplier {
            id,
            name: row.name,
            logo: row.logo,
            created_at: row.created_at,
        })
    }
}

impl<C: Connection> SupplierStore for SurrealSupplierStore<C> {
    async fn apply(&self, plan: WritePlan) -> Result<WriteReceipt, PlanFailure> {
        let supplier_id = match plan.target {
            PlanTarget::New => Uuid::new_v4(),
            PlanTarget::Existing(id) => id,
        };
        let statements = plan_statements(&plan);

        debug!(
            supplier_id = %supplier_id,
            operation = plan.operation(),
            steps = statements.len(),
            mode = ?self.write_mode,
            "Applying write plan"
        );

        let outcome = match self.write_mode {
            WriteMode::Atomic => self.apply_atomic(supplier_id, &plan, &statements).await,
            WriteMode::Sequential => {
                self.apply_sequential(supplier_id, &plan, &statements)
                    .await
            }
        };
        if let Err(mut failure) = outcome {
            if failure.completed == 0 && self.target_missing(&plan).await {
                debug!(supplier_id = %supplier_id, "Update target no longer exists");
                failure.target_missing = true;
            }
            return Err(failure);
        }

        Ok(WriteReceipt {
            supplier_id,
            steps: statements.len(),
        })
    }

    async fn exists(&self, id: Uuid) -> SupplyResult<bool> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM supplier \
                 WHERE id = type::record('supplier', $id) GROUP ALL",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0) > 0)
    }

    async fn get_by_id(&self, id: Uuid) -> SupplyResult<Supplier> {
        Ok(self.fetch(id).await?)
    }

    async fn get_associations(&self, id: Uuid) -> SupplyResult<SupplierAssociations> {
        let mut result = self
            .db
            .query(
                "SELECT VALUE value FROM identifier WHERE supplier_id = $id; \
                 SELECT VALUE meta::id(out) FROM in_segment \
                 WHERE in = type::record('supplier', $id);",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let identifiers: Vec<String> = result.take(0).map_err(DbError::from)?;
        let segment_ids: Vec<String> = result.take(1).map_err(DbError::from)?;
        let segment_ids = segment_ids
            .iter()
            .map(|s| parse_uuid(s, "segment"))
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(SupplierAssociations {
            identifiers,
            segment_ids,
        })
    }

    async fn delete(&self, id: Uuid) -> SupplyResult<()> {
        self.db
            .query(
                "BEGIN TRANSACTION; \
                 DELETE identifier WHERE supplier_id = $id; \
                 DELETE in_segment WHERE in = type::record('supplier', $id); \
                 DELETE type::record('supplier', $id); \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;
        Ok(())
    }
}
