//! Supplydesk — brings the supplier directory store up to date and
//! reports sequential writes that never completed.

use std::process::ExitCode;

use supplydesk_core::repository::PageRequest;
use supplydesk_db::repository::{SurrealSupplierStore, SurrealSupplierViewStore};
use supplydesk_db::{DbConfig, DbError, DbManager};
use supplydesk_service::{DirectoryConfig, DirectoryQueryEngine, SupplierDirectory};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("supplydesk=info"));
    tracing_subscriber::fmt().with_env_filter(filter).json().init();

    info!("Starting supplydesk");

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "supplydesk failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), DbError> {
    let config = DbConfig::from_env()?;
    let manager = DbManager::connect(&config).await?;
    let db = manager.client().clone();

    supplydesk_db::run_migrations(&db).await?;

    let store = SurrealSupplierStore::new(db.clone()).with_write_mode(config.write_mode);
    let intents = store
        .pending_intents()
        .await
        .map_err(|e| DbError::Query(e.to_string()))?;
    for intent in &intents {
        warn!(
            intent_id = %intent.id,
            supplier_id = %intent.supplier_id,
            operation = %intent.operation,
            total_steps = intent.total_steps,
            created_at = %intent.created_at,
            "Incomplete supplier write needs manual reconciliation"
        );
    }

    let directory = DirectoryQueryEngine::new(
        SurrealSupplierViewStore::new(db),
        DirectoryConfig::default(),
    );
    let page_size = directory.config().default_page_size;
    let first_page = SupplierDirectory::list(
        &directory,
        Default::default(),
        PageRequest::new(0, page_size),
    )
    .await
    .map_err(|e| DbError::Query(e.to_string()))?;

    info!(
        write_mode = ?store.write_mode(),
        suppliers = first_page.total,
        pending_intents = intents.len(),
        "Supplier directory ready"
    );
    Ok(())
}
