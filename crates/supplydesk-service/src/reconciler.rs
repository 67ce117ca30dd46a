//! Supplier writes: scalar row plus full replacement of both association
//! sets, expressed as one [`WritePlan`].

use supplydesk_core::error::{SupplyError, SupplyResult};
use supplydesk_core::models::supplier::{Supplier, SupplierDetails, SupplierInput};
use supplydesk_core::plan::{AssociationStep, PlanFailure, PlanTarget, WritePlan};
use supplydesk_core::repository::SupplierStore;
use supplydesk_core::validation::{CanonicalSupplier, canonicalize_supplier};
use tracing::{info, warn};
use uuid::Uuid;

/// Steps for a new supplier. Empty sets produce no insert step.
fn create_plan(supplier: CanonicalSupplier) -> WritePlan {
    let mut associations = Vec::new();
    if !supplier.identifiers.is_empty() {
        associations.push(AssociationStep::InsertIdentifiers(supplier.identifiers));
    }
    if !supplier.segment_ids.is_empty() {
        associations.push(AssociationStep::InsertSegmentLinks(supplier.segment_ids));
    }
    WritePlan {
        target: PlanTarget::New,
        fields: supplier.fields,
        associations,
    }
}

/// Steps for a full replace. Both clears always run, so an empty
/// submission leaves the supplier without associations.
fn update_plan(id: Uuid, supplier: CanonicalSupplier) -> WritePlan {
    let mut associations = vec![AssociationStep::ClearIdentifiers];
    if !supplier.identifiers.is_empty() {
        associations.push(AssociationStep::InsertIdentifiers(supplier.identifiers));
    }
    associations.push(AssociationStep::ClearSegmentLinks);
    if !supplier.segment_ids.is_empty() {
        associations.push(AssociationStep::InsertSegmentLinks(supplier.segment_ids));
    }
    WritePlan {
        target: PlanTarget::Existing(id),
        fields: supplier.fields,
        associations,
    }
}

fn plan_error(failure: PlanFailure) -> SupplyError {
    let err = SupplyError::from(failure);
    if let SupplyError::PartialWrite {
        supplier_id,
        completed,
        total,
        message,
    } = &err
    {
        warn!(
            supplier_id = %supplier_id,
            completed,
            total,
            error = %message,
            "Supplier associations left partially replaced"
        );
    }
    err
}

/// Keeps a supplier row consistent with its identifier and segment sets.
pub struct AssociationReconciler<S: SupplierStore> {
    store: S,
}

impl<S: SupplierStore> AssociationReconciler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validate `input`, insert the supplier and its associations.
    pub async fn create(&self, input: SupplierInput) -> SupplyResult<Supplier> {
        let plan = create_plan(canonicalize_supplier(input)?);

        let receipt = self.store.apply(plan).await.map_err(plan_error)?;
        info!(
            supplier_id = %receipt.supplier_id,
            steps = receipt.steps,
            "Supplier created"
        );

        self.store.get_by_id(receipt.supplier_id).await
    }

    /// Replace the supplier's fields and both association sets with
    /// exactly what `input` holds.
    pub async fn update(&self, id: Uuid, input: SupplierInput) -> SupplyResult<()> {
        let supplier = canonicalize_supplier(input)?;
        if !self.store.exists(id).await? {
            return Err(SupplyError::not_found("supplier", id));
        }

        let receipt = self
            .store
            .apply(update_plan(id, supplier))
            .await
            .map_err(plan_error)?;
        info!(supplier_id = %id, steps = receipt.steps, "Supplier updated");
        Ok(())
    }

    /// Remove the supplier with its identifiers and segment links.
    pub async fn delete(&self, id: Uuid) -> SupplyResult<()> {
        if !self.store.exists(id).await? {
            return Err(SupplyError::not_found("supplier", id));
        }
        self.store.delete(id).await?;
        info!(supplier_id = %id, "Supplier deleted");
        Ok(())
    }

    /// The supplier with its current association sets.
    pub async fn details(&self, id: Uuid) -> SupplyResult<SupplierDetails> {
        let supplier = self.store.get_by_id(id).await?;
        let associations = self.store.get_associations(id).await?;
        Ok(SupplierDetails {
            supplier,
            associations,
        })
    }
}
