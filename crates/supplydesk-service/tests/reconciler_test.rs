//! End-to-end tests for the association reconciler against in-memory
//! SurrealDB.

use supplydesk_core::error::SupplyError;
use supplydesk_core::models::supplier::SupplierInput;
use supplydesk_db::WriteMode;
use supplydesk_db::repository::{SurrealSegmentRepository, SurrealSupplierStore};
use supplydesk_service::{AssociationReconciler, DirectoryConfig, SegmentCatalog};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

/// Helper: in-memory DB with migrations, a reconciler in the given
/// write mode and two segments.
async fn setup(mode: WriteMode) -> (AssociationReconciler<SurrealSupplierStore<Db>>, Uuid, Uuid) {
    let db: Surreal<Db> = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    supplydesk_db::run_migrations(&db).await.unwrap();

    let catalog = SegmentCatalog::new(
        SurrealSegmentRepository::new(db.clone()),
        DirectoryConfig::default(),
    );
    let food = catalog.create("Food").await.unwrap().id;
    let tools = catalog.create("Tools").await.unwrap().id;

    let store = SurrealSupplierStore::new(db).with_write_mode(mode);
    (AssociationReconciler::new(store), food, tools)
}

fn input(identifiers: &[&str], segment_ids: &[Uuid]) -> SupplierInput {
    SupplierInput {
        name: "Acme Ltda".into(),
        logo: Some("https://cdn.example.com/acme.png".into()),
        identifiers: identifiers.iter().map(|s| s.to_string()).collect(),
        segment_ids: segment_ids.to_vec(),
    }
}

fn sorted<T: Ord>(mut values: Vec<T>) -> Vec<T> {
    values.sort();
    values
}

#[tokio::test]
async fn create_stores_canonical_identifiers() {
    let (reconciler, food, tools) = setup(WriteMode::Atomic).await;

    let supplier = reconciler
        .create(input(&["12345678000195", "98.765.432/0001-10"], &[food, tools]))
        .await
        .unwrap();
    assert_eq!(supplier.name, "Acme Ltda");

    let details = reconciler.details(supplier.id).await.unwrap();
    assert_eq!(details.supplier, supplier);
    assert_eq!(
        sorted(details.associations.identifiers),
        vec!["12.345.678/0001-95", "98.765.432/0001-10"]
    );
    assert_eq!(
        sorted(details.associations.segment_ids),
        sorted(vec![food, tools])
    );
}

#[tokio::test]
async fn create_keeps_duplicate_identifiers() {
    let (reconciler, _, _) = setup(WriteMode::Atomic).await;

    let supplier = reconciler
        .create(input(&["12345678000195", "12.345.678/0001-95"], &[]))
        .await
        .unwrap();

    let details = reconciler.details(supplier.id).await.unwrap();
    assert_eq!(details.associations.identifiers.len(), 2);
    assert!(details.associations.segment_ids.is_empty());
}

#[tokio::test]
async fn invalid_input_writes_nothing() {
    let (reconciler, food, _) = setup(WriteMode::Atomic).await;

    let mut bad = input(&["1234"], &[food]);
    let err = reconciler.create(bad.clone()).await.unwrap_err();
    assert!(matches!(err, SupplyError::Validation { .. }));

    bad.identifiers.clear();
    bad.logo = Some("not a url".into());
    let err = reconciler.create(bad).await.unwrap_err();
    assert!(matches!(err, SupplyError::Validation { .. }));
}

#[tokio::test]
async fn update_replaces_both_sets() {
    let (reconciler, food, tools) = setup(WriteMode::Atomic).await;
    let supplier = reconciler
        .create(input(&["12345678000195"], &[food]))
        .await
        .unwrap();

    reconciler
        .update(supplier.id, input(&["98765432000110"], &[tools]))
        .await
        .unwrap();

    let details = reconciler.details(supplier.id).await.unwrap();
    assert_eq!(details.associations.identifiers, vec!["98.765.432/0001-10"]);
    assert_eq!(details.associations.segment_ids, vec![tools]);
}

#[tokio::test]
async fn update_with_empty_sets_clears_associations() {
    for mode in [WriteMode::Atomic, WriteMode::Sequential] {
        let (reconciler, food, tools) = setup(mode).await;
        let supplier = reconciler
            .create(input(&["12345678000195", "98765432000110"], &[food, tools]))
            .await
            .unwrap();

        reconciler
            .update(supplier.id, input(&[], &[]))
            .await
            .unwrap();

        let details = reconciler.details(supplier.id).await.unwrap();
        assert!(details.associations.identifiers.is_empty(), "{mode:?}");
        assert!(details.associations.segment_ids.is_empty(), "{mode:?}");
    }
}

#[tokio::test]
async fn update_is_idempotent() {
    let (reconciler, food, tools) = setup(WriteMode::Atomic).await;
    let supplier = reconciler.create(input(&[], &[])).await.unwrap();
    let submission = input(&["12345678000195"], &[food, tools]);

    reconciler
        .update(supplier.id, submission.clone())
        .await
        .unwrap();
    let once = reconciler.details(supplier.id).await.unwrap();

    reconciler.update(supplier.id, submission).await.unwrap();
    let twice = reconciler.details(supplier.id).await.unwrap();

    assert_eq!(
        sorted(once.associations.identifiers),
        sorted(twice.associations.identifiers)
    );
    assert_eq!(
        sorted(once.associations.segment_ids),
        sorted(twice.associations.segment_ids)
    );
    assert_eq!(once.supplier, twice.supplier);
}

#[tokio::test]
async fn update_missing_supplier_is_not_found() {
    let (reconciler, _, _) = setup(WriteMode::Atomic).await;

    let err = reconciler
        .update(Uuid::new_v4(), input(&[], &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, SupplyError::NotFound { .. }));
}

#[tokio::test]
async fn atomic_update_with_unknown_segment_keeps_previous_state() {
    let (reconciler, food, _) = setup(WriteMode::Atomic).await;
    let supplier = reconciler
        .create(input(&["12345678000195"], &[food]))
        .await
        .unwrap();

    let err = reconciler
        .update(supplier.id, input(&["98765432000110"], &[Uuid::new_v4()]))
        .await
        .unwrap_err();
    assert!(matches!(err, SupplyError::Store(_)));

    let details = reconciler.details(supplier.id).await.unwrap();
    assert_eq!(details.associations.identifiers, vec!["12.345.678/0001-95"]);
    assert_eq!(details.associations.segment_ids, vec![food]);
}

#[tokio::test]
async fn sequential_update_with_unknown_segment_is_partial_write() {
    let (reconciler, food, _) = setup(WriteMode::Sequential).await;
    let supplier = reconciler
        .create(input(&["12345678000195"], &[food]))
        .await
        .unwrap();

    let err = reconciler
        .update(supplier.id, input(&["98765432000110"], &[Uuid::new_v4()]))
        .await
        .unwrap_err();
    match err {
        SupplyError::PartialWrite {
            supplier_id,
            completed,
            total,
            ..
        } => {
            assert_eq!(supplier_id, supplier.id.to_string());
            assert_eq!(completed, 4);
            assert_eq!(total, 5);
        }
        other => panic!("expected PartialWrite, got {other:?}"),
    }

    let intents = reconciler.store().pending_intents().await.unwrap();
    assert_eq!(intents.len(), 1);
    assert_eq!(intents[0].supplier_id, supplier.id);
}

#[tokio::test]
async fn delete_removes_supplier_and_rejects_missing() {
    let (reconciler, food, _) = setup(WriteMode::Atomic).await;
    let supplier = reconciler
        .create(input(&["12345678000195"], &[food]))
        .await
        .unwrap();

    reconciler.delete(supplier.id).await.unwrap();

    let err = reconciler.details(supplier.id).await.unwrap_err();
    assert!(matches!(err, SupplyError::NotFound { .. }));
    let err = reconciler.delete(supplier.id).await.unwrap_err();
    assert!(matches!(err, SupplyError::NotFound { .. }));
}
