//! Segment lookup table management.

use supplydesk_core::error::{SupplyError, SupplyResult};
use supplydesk_core::models::segment::{CreateSegment, Segment, UpdateSegment};
use supplydesk_core::repository::{PageRequest, PaginatedResult, SegmentRepository};
use supplydesk_core::validation::validate_segment_name;
use tracing::info;
use uuid::Uuid;

use crate::config::DirectoryConfig;

/// Validated access to the segment catalogue.
pub struct SegmentCatalog<R: SegmentRepository> {
    repo: R,
    config: DirectoryConfig,
}

impl<R: SegmentRepository> SegmentCatalog<R> {
    pub fn new(repo: R, config: DirectoryConfig) -> Self {
        Self { repo, config }
    }

    pub async fn create(&self, name: impl Into<String>) -> SupplyResult<Segment> {
        let name = name.into();
        validate_segment_name(&name)?;
        let segment = self.repo.create(CreateSegment { name }).await?;
        info!(segment_id = %segment.id, name = %segment.name, "Segment created");
        Ok(segment)
    }

    pub async fn rename(&self, id: Uuid, name: impl Into<String>) -> SupplyResult<Segment> {
        let name = name.into();
        validate_segment_name(&name)?;
        let segment = self.repo.update(id, UpdateSegment { name }).await?;
        info!(segment_id = %id, name = %segment.name, "Segment renamed");
        Ok(segment)
    }

    /// Fails with `InUse` while any supplier links to the segment.
    pub async fn delete(&self, id: Uuid) -> SupplyResult<()> {
        self.repo.delete(id).await?;
        info!(segment_id = %id, "Segment deleted");
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> SupplyResult<Segment> {
        self.repo.get_by_id(id).await
    }

    /// One page of segments whose name contains `name`, ignoring case.
    pub async fn list(
        &self,
        name: Option<&str>,
        page: PageRequest,
    ) -> SupplyResult<PaginatedResult<Segment>> {
        if page.page_size == 0 || page.page_size > self.config.max_page_size {
            return Err(SupplyError::validation(format!(
                "page size must be between 1 and {} (got {})",
                self.config.max_page_size, page.page_size
            )));
        }
        let name = name.filter(|n| !n.is_empty());
        self.repo.list(name, page.to_pagination()).await
    }

    /// Every segment ordered by name, for selectors.
    pub async fn list_all(&self) -> SupplyResult<Vec<Segment>> {
        self.repo.list_all().await
    }
}
