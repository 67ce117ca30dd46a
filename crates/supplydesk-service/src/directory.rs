//! Filtered, ordered, paginated reads over the supplier projection.
//!
//! The name and segment predicates run inside the store. The identifier
//! substring predicate cannot, so when it is active the engine fetches
//! the whole matching set, filters it in process and only then slices
//! the requested page. Paging before that filter would make `total`
//! and the page disagree with what the caller sees.

use supplydesk_core::error::{SupplyError, SupplyResult};
use supplydesk_core::models::view::{SupplierFilters, SupplierView};
use supplydesk_core::repository::{PageRequest, PaginatedResult, SupplierViewStore, ViewQuery};
use tracing::debug;

use crate::config::DirectoryConfig;

/// Anything that can answer a directory listing.
pub trait SupplierDirectory: Send + Sync {
    fn list(
        &self,
        filters: SupplierFilters,
        page: PageRequest,
    ) -> impl Future<Output = SupplyResult<PaginatedResult<SupplierView>>> + Send;
}

/// Whether any identifier of `view` contains `needle`, ignoring case.
/// `needle` must already be lowercase.
fn matches_identifier(view: &SupplierView, needle: &str) -> bool {
    view.identifiers
        .iter()
        .any(|identifier| identifier.to_lowercase().contains(needle))
}

fn to_index(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

/// Answers directory listings against a [`SupplierViewStore`].
pub struct DirectoryQueryEngine<V: SupplierViewStore> {
    store: V,
    config: DirectoryConfig,
}

impl<V: SupplierViewStore> DirectoryQueryEngine<V> {
    pub fn new(store: V, config: DirectoryConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    /// One page of suppliers matching `filters`, ordered by name, plus
    /// the size of the whole matching set.
    pub async fn list(
        &self,
        filters: &SupplierFilters,
        page: PageRequest,
    ) -> SupplyResult<PaginatedResult<SupplierView>> {
        if page.page_size == 0 || page.page_size > self.config.max_page_size {
            return Err(SupplyError::validation(format!(
                "page size must be between 1 and {} (got {})",
                self.config.max_page_size, page.page_size
            )));
        }

        let filters = filters.normalized();
        let query = ViewQuery {
            name: filters.name,
            segment: filters.segment,
            window: None,
        };

        match filters.identifier {
            None => self.list_native(query, page).await,
            Some(needle) => self.list_filtered(query, &needle, page).await,
        }
    }

    async fn list_native(
        &self,
        mut query: ViewQuery,
        page: PageRequest,
    ) -> SupplyResult<PaginatedResult<SupplierView>> {
        query.window = Some(page.to_pagination());
        let result = self.store.query(query).await?;

        debug!(
            path = "native",
            total = result.total,
            returned = result.rows.len(),
            "Directory query"
        );

        Ok(PaginatedResult {
            items: result.rows.into_iter().map(|r| r.into_view()).collect(),
            total: result.total,
            offset: page.offset(),
            limit: page.page_size,
        })
    }

    async fn list_filtered(
        &self,
        query: ViewQuery,
        needle: &str,
        page: PageRequest,
    ) -> SupplyResult<PaginatedResult<SupplierView>> {
        let result = self.store.query(query).await?;
        let fetched = result.rows.len();

        let needle = needle.to_lowercase();
        let matching: Vec<SupplierView> = result
            .rows
            .into_iter()
            .map(|r| r.into_view())
            .filter(|view| matches_identifier(view, &needle))
            .collect();
        let total = matching.len() as u64;

        debug!(path = "filtered", fetched, total, "Directory query");

        let items = matching
            .into_iter()
            .skip(to_index(page.offset()))
            .take(to_index(page.page_size))
            .collect();

        Ok(PaginatedResult {
            items,
            total,
            offset: page.offset(),
            limit: page.page_size,
        })
    }
}

impl<V: SupplierViewStore> SupplierDirectory for DirectoryQueryEngine<V> {
    async fn list(
        &self,
        filters: SupplierFilters,
        page: PageRequest,
    ) -> SupplyResult<PaginatedResult<SupplierView>> {
        DirectoryQueryEngine::list(self, &filters, page).await
    }
}
