//! Write plans: the ordered steps of one supplier reconciliation.
//!
//! The service layer decides which steps a create or an update consists
//! of; the store only executes them in order, either inside one
//! transaction or statement by statement.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SupplyError;

/// Which supplier row the scalar step writes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum PlanTarget {
    /// Insert a new row; the store assigns the id.
    New,
    /// Update the row with this id.
    Existing(Uuid),
}

/// Scalar columns of a supplier row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SupplierFields {
    pub name: String,
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "step", content = "values", rename_all = "snake_case")]
pub enum AssociationStep {
    /// Delete every identifier row of the supplier.
    ClearIdentifiers,
    /// Insert one identifier row per canonical value.
    InsertIdentifiers(Vec<String>),
    /// Delete every segment link of the supplier.
    ClearSegmentLinks,
    /// Insert one segment link per segment id.
    InsertSegmentLinks(Vec<Uuid>),
}

/// The scalar step followed by the association steps, in execution order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WritePlan {
    pub target: PlanTarget,
    pub fields: SupplierFields,
    pub associations: Vec<AssociationStep>,
}

impl WritePlan {
    /// Number of steps including the scalar one.
    pub fn total_steps(&self) -> usize {
        1 + self.associations.len()
    }

    pub fn operation(&self) -> &'static str {
        match self.target {
            PlanTarget::New => "create",
            PlanTarget::Existing(_) => "update",
        }
    }
}

/// Result of a plan that ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteReceipt {
    /// Id of the written supplier; assigned by the store for `New`.
    pub supplier_id: Uuid,
    /// Steps applied, including the scalar one.
    pub steps: usize,
}

/// Failure report of a plan.
#[derive(Debug, Clone)]
pub struct PlanFailure {
    pub supplier_id: Uuid,
    /// Steps applied before the failing one.
    pub completed: usize,
    pub total: usize,
    /// Whether the store undid the applied steps.
    pub rolled_back: bool,
    /// The supplier an update targets was gone when the plan ran.
    pub target_missing: bool,
    pub message: String,
}

impl From<PlanFailure> for SupplyError {
    fn from(failure: PlanFailure) -> Self {
        if failure.target_missing {
            SupplyError::not_found("supplier", failure.supplier_id)
        } else if failure.rolled_back || failure.completed == 0 {
            SupplyError::Store(failure.message)
        } else {
            SupplyError::PartialWrite {
                supplier_id: failure.supplier_id.to_string(),
                completed: failure.completed,
                total: failure.total,
                message: failure.message,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(completed: usize, rolled_back: bool) -> PlanFailure {
        PlanFailure {
            supplier_id: Uuid::nil(),
            completed,
            total: 5,
            rolled_back,
            target_missing: false,
            message: "connection reset".into(),
        }
    }

    #[test]
    fn missing_target_is_not_found() {
        let err: SupplyError = PlanFailure {
            target_missing: true,
            ..failure(0, true)
        }
        .into();
        assert!(matches!(err, SupplyError::NotFound { ref entity, .. } if entity == "supplier"));
    }

    #[test]
    fn rolled_back_failure_is_a_store_error() {
        let err: SupplyError = failure(3, true).into();
        assert!(matches!(err, SupplyError::Store(ref m) if m == "connection reset"));
    }

    #[test]
    fn failure_before_first_step_is_a_store_error() {
        let err: SupplyError = failure(0, false).into();
        assert!(matches!(err, SupplyError::Store(_)));
    }

    #[test]
    fn failure_after_applied_steps_is_a_partial_write() {
        let err: SupplyError = failure(2, false).into();
        match err {
            SupplyError::PartialWrite {
                completed, total, ..
            } => {
                assert_eq!(completed, 2);
                assert_eq!(total, 5);
            }
            other => panic!("expected PartialWrite, got {other:?}"),
        }
    }

    #[test]
    fn plan_serializes_with_tagged_steps() {
        let plan = WritePlan {
            target: PlanTarget::New,
            fields: SupplierFields {
                name: "Acme".into(),
                logo: None,
            },
            associations: vec![
                AssociationStep::ClearIdentifiers,
                AssociationStep::InsertIdentifiers(vec!["12.345.678/0001-95".into()]),
            ],
        };

        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["target"]["kind"], "new");
        assert_eq!(json["associations"][0]["step"], "clear_identifiers");
        assert_eq!(json["associations"][1]["values"][0], "12.345.678/0001-95");
        assert_eq!(plan.total_steps(), 3);
        assert_eq!(plan.operation(), "create");
    }
}
