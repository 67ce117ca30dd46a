//! Integration tests for the segment repository using in-memory SurrealDB.

use supplydesk_core::error::SupplyError;
use supplydesk_core::models::segment::{CreateSegment, UpdateSegment};
use supplydesk_core::plan::{AssociationStep, PlanTarget, SupplierFields, WritePlan};
use supplydesk_core::repository::{Pagination, SegmentRepository, SupplierStore};
use supplydesk_db::repository::{SurrealSegmentRepository, SurrealSupplierStore};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    supplydesk_db::run_migrations(&db).await.unwrap();
    db
}

fn create(name: &str) -> CreateSegment {
    CreateSegment { name: name.into() }
}

#[tokio::test]
async fn create_and_get_segment() {
    let db = setup().await;
    let repo = SurrealSegmentRepository::new(db);

    let segment = repo.create(create("Hardware")).await.unwrap();
    assert_eq!(segment.name, "Hardware");

    let fetched = repo.get_by_id(segment.id).await.unwrap();
    assert_eq!(fetched, segment);
}

#[tokio::test]
async fn get_missing_segment_is_not_found() {
    let db = setup().await;
    let repo = SurrealSegmentRepository::new(db);

    let err = repo.get_by_id(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, SupplyError::NotFound { ref entity, .. } if entity == "segment"));
}

#[tokio::test]
async fn rename_segment() {
    let db = setup().await;
    let repo = SurrealSegmentRepository::new(db);
    let segment = repo.create(create("Hardware")).await.unwrap();

    let renamed = repo
        .update(
            segment.id,
            UpdateSegment {
                name: "Tools".into(),
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.id, segment.id);
    assert_eq!(renamed.name, "Tools");
    assert_eq!(repo.get_by_id(segment.id).await.unwrap().name, "Tools");
}

#[tokio::test]
async fn list_filters_orders_and_pages() {
    let db = setup().await;
    let repo = SurrealSegmentRepository::new(db);
    for name in ["Seafood", "Tools", "Food", "Hardware", "Fast Food"] {
        repo.create(create(name)).await.unwrap();
    }

    let page = repo
        .list(
            Some("FOOD"),
            Pagination {
                offset: 0,
                limit: 2,
            },
        )
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    let names: Vec<_> = page.items.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Fast Food", "Food"]);

    let rest = repo
        .list(
            Some("food"),
            Pagination {
                offset: 2,
                limit: 2,
            },
        )
        .await
        .unwrap();
    assert_eq!(rest.items.len(), 1);
    assert_eq!(rest.items[0].name, "Seafood");

    let all = repo.list(None, Pagination::default()).await.unwrap();
    assert_eq!(all.total, 5);
}

#[tokio::test]
async fn list_all_is_ordered_by_name() {
    let db = setup().await;
    let repo = SurrealSegmentRepository::new(db);
    for name in ["Tools", "Food", "Hardware"] {
        repo.create(create(name)).await.unwrap();
    }

    let names: Vec<_> = repo
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, vec!["Food", "Hardware", "Tools"]);
}

#[tokio::test]
async fn delete_unlinked_segment() {
    let db = setup().await;
    let repo = SurrealSegmentRepository::new(db);
    let segment = repo.create(create("Hardware")).await.unwrap();

    repo.delete(segment.id).await.unwrap();

    let err = repo.get_by_id(segment.id).await.unwrap_err();
    assert!(matches!(err, SupplyError::NotFound { .. }));
    let err = repo.delete(segment.id).await.unwrap_err();
    assert!(matches!(err, SupplyError::NotFound { .. }));
}

#[tokio::test]
async fn delete_linked_segment_is_rejected() {
    let db = setup().await;
    let repo = SurrealSegmentRepository::new(db.clone());
    let store = SurrealSupplierStore::new(db);
    let segment = repo.create(create("Hardware")).await.unwrap();

    let receipt = store
        .apply(WritePlan {
            target: PlanTarget::New,
            fields: SupplierFields {
                name: "Acme Ltda".into(),
                logo: None,
            },
            associations: vec![AssociationStep::InsertSegmentLinks(vec![segment.id])],
        })
        .await
        .unwrap();

    let err = repo.delete(segment.id).await.unwrap_err();
    assert!(matches!(err, SupplyError::InUse { references: 1, .. }));
    assert!(repo.get_by_id(segment.id).await.is_ok());
    let associations = store.get_associations(receipt.supplier_id).await.unwrap();
    assert_eq!(associations.segment_ids, vec![segment.id]);

    store.delete(receipt.supplier_id).await.unwrap();
    repo.delete(segment.id).await.unwrap();
}
