//! Store trait definitions for data access abstraction.
//!
//! All store operations are async. The write path goes through
//! [`SupplierStore::apply`], the read path through
//! [`SupplierViewStore::query`].

use uuid::Uuid;

use crate::error::SupplyResult;
use crate::models::segment::{CreateSegment, Segment, UpdateSegment};
use crate::models::supplier::{Supplier, SupplierAssociations};
use crate::models::view::SupplierViewRecord;
use crate::plan::{PlanFailure, WritePlan, WriteReceipt};

/// Offset/limit window for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// Zero-based page number and page size, as the UI addresses pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl PageRequest {
    pub fn new(page: u64, page_size: u64) -> Self {
        Self { page, page_size }
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.page_size)
    }

    pub fn to_pagination(self) -> Pagination {
        Pagination {
            offset: self.offset(),
            limit: self.page_size,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: 20,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

impl<T> PaginatedResult<T> {
    pub fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            0
        } else {
            self.total.div_ceil(self.limit)
        }
    }
}

/// Query against the supplier projection, always ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewQuery {
    /// Case-insensitive name substring.
    pub name: Option<String>,
    /// Exact segment name contained in the segment sequence.
    pub segment: Option<String>,
    /// `None` fetches the whole matching set.
    pub window: Option<Pagination>,
}

/// Rows of one projection query plus the size of the matching set.
#[derive(Debug, Clone)]
pub struct ViewQueryResult {
    pub rows: Vec<SupplierViewRecord>,
    /// Count of matching rows, ignoring the window.
    pub total: u64,
}

// ---------------------------------------------------------------------------
// Suppliers
// ---------------------------------------------------------------------------

pub trait SupplierStore: Send + Sync {
    /// Execute every step of `plan` in order.
    fn apply(
        &self,
        plan: WritePlan,
    ) -> impl Future<Output = Result<WriteReceipt, PlanFailure>> + Send;
    fn exists(&self, id: Uuid) -> impl Future<Output = SupplyResult<bool>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = SupplyResult<Supplier>> + Send;
    fn get_associations(
        &self,
        id: Uuid,
    ) -> impl Future<Output = SupplyResult<SupplierAssociations>> + Send;
    /// Delete the supplier together with its identifiers and segment links.
    fn delete(&self, id: Uuid) -> impl Future<Output = SupplyResult<()>> + Send;
}

pub trait SupplierViewStore: Send + Sync {
    fn query(
        &self,
        query: ViewQuery,
    ) -> impl Future<Output = SupplyResult<ViewQueryResult>> + Send;
}

// ---------------------------------------------------------------------------
// Segments
// ---------------------------------------------------------------------------

pub trait SegmentRepository: Send + Sync {
    fn create(&self, input: CreateSegment) -> impl Future<Output = SupplyResult<Segment>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = SupplyResult<Segment>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateSegment,
    ) -> impl Future<Output = SupplyResult<Segment>> + Send;
    /// Rejected with `InUse` while suppliers still link to the segment.
    fn delete(&self, id: Uuid) -> impl Future<Output = SupplyResult<()>> + Send;
    fn list(
        &self,
        name: Option<&str>,
        pagination: Pagination,
    ) -> impl Future<Output = SupplyResult<PaginatedResult<Segment>>> + Send;
    /// Every segment ordered by name.
    fn list_all(&self) -> impl Future<Output = SupplyResult<Vec<Segment>>> + Send;
}
