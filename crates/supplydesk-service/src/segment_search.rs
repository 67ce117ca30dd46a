//! Debounced name filter over the segment catalogue.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use supplydesk_core::models::segment::Segment;
use supplydesk_core::repository::{PageRequest, SegmentRepository};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::debounce::Debounce;
use crate::segments::SegmentCatalog;

/// Last accepted segment listing.
#[derive(Debug, Clone, Default)]
pub struct SegmentSnapshot {
    /// Committed name filter, `None` when blank.
    pub name: Option<String>,
    pub page: u64,
    pub page_size: u64,
    pub items: Vec<Segment>,
    pub total: u64,
    pub error: Option<String>,
    pub generation: u64,
}

impl SegmentSnapshot {
    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            0
        } else {
            self.total.div_ceil(self.page_size)
        }
    }
}

struct Session {
    draft: String,
    name: Option<String>,
    page: u64,
    page_size: u64,
    issued: u64,
    timer: Debounce,
}

struct Request {
    generation: u64,
    name: Option<String>,
    page: PageRequest,
}

impl Session {
    fn issue(&mut self) -> Request {
        self.issued += 1;
        Request {
            generation: self.issued,
            name: self.name.clone(),
            page: PageRequest::new(self.page, self.page_size),
        }
    }
}

struct Shared<R: SegmentRepository> {
    catalog: SegmentCatalog<R>,
    session: Mutex<Session>,
    snapshots: watch::Sender<SegmentSnapshot>,
}

impl<R: SegmentRepository> Shared<R> {
    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn run(&self, request: Request) {
        let result = self
            .catalog
            .list(request.name.as_deref(), request.page)
            .await;

        let session = self.lock();
        if session.issued != request.generation {
            debug!(
                generation = request.generation,
                latest = session.issued,
                "Dropping superseded segment listing"
            );
            return;
        }

        let (items, total, error) = match result {
            Ok(page) => (page.items, page.total, None),
            Err(err) => {
                warn!(error = %err, "Segment listing failed");
                (Vec::new(), 0, Some(err.to_string()))
            }
        };
        self.snapshots.send_replace(SegmentSnapshot {
            name: request.name,
            page: request.page.page,
            page_size: request.page.page_size,
            items,
            total,
            error,
            generation: request.generation,
        });
        drop(session);
    }

    async fn fire(&self, token: u64) {
        let request = {
            let mut session = self.lock();
            if !session.timer.claim(token) {
                return;
            }
            let name = Some(session.draft.clone()).filter(|n| !n.is_empty());
            if name == session.name {
                return;
            }
            session.name = name;
            session.page = 0;
            session.issue()
        };
        self.run(request).await;
    }
}

/// Segment table front end: the name filter is debounced like the
/// supplier search, paging applies immediately.
///
/// Must be used from within a tokio runtime.
pub struct SegmentSearch<R: SegmentRepository + 'static> {
    shared: Arc<Shared<R>>,
}

impl<R: SegmentRepository + 'static> SegmentSearch<R> {
    pub fn new(catalog: SegmentCatalog<R>, page_size: u64) -> Self {
        let (snapshots, _) = watch::channel(SegmentSnapshot {
            page_size,
            ..Default::default()
        });
        Self {
            shared: Arc::new(Shared {
                catalog,
                session: Mutex::new(Session {
                    draft: String::new(),
                    name: None,
                    page: 0,
                    page_size,
                    issued: 0,
                    timer: Debounce::default(),
                }),
                snapshots,
            }),
        }
    }

    pub fn catalog(&self) -> &SegmentCatalog<R> {
        &self.shared.catalog
    }

    pub fn subscribe(&self) -> watch::Receiver<SegmentSnapshot> {
        self.shared.snapshots.subscribe()
    }

    pub fn snapshot(&self) -> SegmentSnapshot {
        self.shared.snapshots.borrow().clone()
    }

    pub fn is_pending(&self) -> bool {
        self.shared.lock().timer.is_pending()
    }

    pub fn type_name(&self, text: impl Into<String>) {
        let mut session = self.shared.lock();
        session.draft = text.into();
        let shared = Arc::clone(&self.shared);
        session
            .timer
            .arm(move |token| async move { shared.fire(token).await });
    }

    pub async fn set_page(&self, page: u64) {
        let request = {
            let mut session = self.shared.lock();
            session.page = page;
            session.issue()
        };
        self.shared.run(request).await;
    }

    pub async fn set_page_size(&self, page_size: u64) {
        let request = {
            let mut session = self.shared.lock();
            session.page_size = page_size;
            session.page = 0;
            session.issue()
        };
        self.shared.run(request).await;
    }

    /// Drop the name filter and its draft, then list page 0.
    pub async fn clear(&self) {
        let request = {
            let mut session = self.shared.lock();
            session.timer.cancel();
            session.draft.clear();
            session.name = None;
            session.page = 0;
            session.issue()
        };
        self.shared.run(request).await;
    }

    /// List again, typically after a create, rename or delete.
    pub async fn refresh(&self) {
        let request = self.shared.lock().issue();
        self.shared.run(request).await;
    }
}

impl<R: SegmentRepository + 'static> Drop for SegmentSearch<R> {
    fn drop(&mut self) {
        self.shared.lock().timer.cancel();
    }
}
