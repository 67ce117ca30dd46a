//! Directory listing against in-memory SurrealDB, covering both the
//! store-windowed path and the identifier post-filter path.

use supplydesk_core::error::SupplyError;
use supplydesk_core::models::supplier::SupplierInput;
use supplydesk_core::models::view::SupplierFilters;
use supplydesk_core::repository::PageRequest;
use supplydesk_db::repository::{
    SurrealSegmentRepository, SurrealSupplierStore, SurrealSupplierViewStore,
};
use supplydesk_service::{
    AssociationReconciler, DirectoryConfig, DirectoryQueryEngine, SegmentCatalog,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

/// Helper: 30 suppliers, every sixth carrying "345" in an identifier.
/// Even-numbered suppliers are in "Food", odd ones in "Tools".
async fn setup() -> DirectoryQueryEngine<SurrealSupplierViewStore<Db>> {
    let db: Surreal<Db> = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    supplydesk_db::run_migrations(&db).await.unwrap();

    let catalog = SegmentCatalog::new(
        SurrealSegmentRepository::new(db.clone()),
        DirectoryConfig::default(),
    );
    let food = catalog.create("Food").await.unwrap().id;
    let tools = catalog.create("Tools").await.unwrap().id;

    let reconciler = AssociationReconciler::new(SurrealSupplierStore::new(db.clone()));
    for i in 0..30u32 {
        let identifier = if i % 6 == 0 {
            format!("11345{i:03}000100")
        } else {
            format!("22111{i:03}000100")
        };
        reconciler
            .create(SupplierInput {
                name: format!("Supplier {i:02}"),
                logo: None,
                identifiers: vec![identifier],
                segment_ids: vec![if i % 2 == 0 { food } else { tools }],
            })
            .await
            .unwrap();
    }

    DirectoryQueryEngine::new(SurrealSupplierViewStore::new(db), DirectoryConfig::default())
}

fn by_identifier(needle: &str) -> SupplierFilters {
    SupplierFilters {
        identifier: Some(needle.into()),
        ..Default::default()
    }
}

#[tokio::test]
async fn identifier_filter_totals_only_matches() {
    let engine = setup().await;

    let page = engine
        .list(&by_identifier("345"), PageRequest::new(0, 20))
        .await
        .unwrap();

    assert_eq!(page.total, 5);
    assert_eq!(page.items.len(), 5);
    for view in &page.items {
        assert!(view.identifiers.iter().any(|i| i.contains("345")));
    }
}

#[tokio::test]
async fn identifier_filter_pages_the_filtered_set() {
    let engine = setup().await;

    let first = engine
        .list(&by_identifier("345"), PageRequest::new(0, 2))
        .await
        .unwrap();
    let third = engine
        .list(&by_identifier("345"), PageRequest::new(2, 2))
        .await
        .unwrap();

    assert_eq!(first.total, 5);
    assert_eq!(first.total_pages(), 3);
    let names: Vec<_> = first.items.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["Supplier 00", "Supplier 06"]);
    let names: Vec<_> = third.items.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["Supplier 24"]);
}

#[tokio::test]
async fn identifier_filter_combines_with_segment() {
    let engine = setup().await;
    let filters = SupplierFilters {
        identifier: Some("345".into()),
        segment: Some("Food".into()),
        ..Default::default()
    };

    let page = engine.list(&filters, PageRequest::new(0, 20)).await.unwrap();
    // 0, 6, 12, 18 and 24 are all even.
    assert_eq!(page.total, 5);

    let tools = SupplierFilters {
        segment: Some("Tools".into()),
        ..filters
    };
    let page = engine.list(&tools, PageRequest::new(0, 20)).await.unwrap();
    assert_eq!(page.total, 0);
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn native_path_pages_by_name() {
    let engine = setup().await;

    let page = engine
        .list(&SupplierFilters::default(), PageRequest::new(1, 20))
        .await
        .unwrap();
    assert_eq!(page.total, 30);
    assert_eq!(page.items.len(), 10);
    assert_eq!(page.items[0].name, "Supplier 20");

    let food = engine
        .list(
            &SupplierFilters {
                name: Some("SUPPLIER 1".into()),
                segment: Some("Food".into()),
                ..Default::default()
            },
            PageRequest::new(0, 20),
        )
        .await
        .unwrap();
    let names: Vec<_> = food.items.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Supplier 10",
            "Supplier 12",
            "Supplier 14",
            "Supplier 16",
            "Supplier 18"
        ]
    );
}

#[tokio::test]
async fn page_beyond_last_is_empty_with_total() {
    let engine = setup().await;

    let filtered = engine
        .list(&by_identifier("345"), PageRequest::new(5, 20))
        .await
        .unwrap();
    assert!(filtered.items.is_empty());
    assert_eq!(filtered.total, 5);

    let native = engine
        .list(&SupplierFilters::default(), PageRequest::new(5, 20))
        .await
        .unwrap();
    assert!(native.items.is_empty());
    assert_eq!(native.total, 30);
}

#[tokio::test]
async fn oversized_page_is_rejected() {
    let engine = setup().await;

    let err = engine
        .list(&SupplierFilters::default(), PageRequest::new(0, 1000))
        .await
        .unwrap_err();
    assert!(matches!(err, SupplyError::Validation { .. }));
}
