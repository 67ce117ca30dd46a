//! Debounced front end for the supplier directory.
//!
//! Keystrokes in the free-text fields only touch the draft and re-arm a
//! single-shot timer. When the timer runs out the draft is committed to
//! the active filters and one query is issued. Segment, page and page
//! size changes skip the timer.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use supplydesk_core::models::view::{SupplierFilters, SupplierView};
use supplydesk_core::repository::PageRequest;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::debounce::Debounce;
use crate::directory::SupplierDirectory;

/// Free-text values typed but not yet committed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchDraft {
    pub name: String,
    pub identifier: String,
}

/// What the last accepted query returned, and for which state.
#[derive(Debug, Clone, Default)]
pub struct SearchSnapshot {
    pub filters: SupplierFilters,
    pub page: u64,
    pub page_size: u64,
    pub items: Vec<SupplierView>,
    pub total: u64,
    /// Store or validation failure of the last query. `items` is empty.
    pub error: Option<String>,
    /// Sequence number of the query that produced this snapshot.
    /// Zero until the first query completes.
    pub generation: u64,
}

impl SearchSnapshot {
    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            0
        } else {
            self.total.div_ceil(self.page_size)
        }
    }
}

struct Session {
    draft: SearchDraft,
    filters: SupplierFilters,
    page: u64,
    page_size: u64,
    issued: u64,
    timer: Debounce,
}

impl Session {
    /// Freeze the current state into a request that supersedes every
    /// query issued before it.
    fn issue(&mut self) -> Request {
        self.issued += 1;
        Request {
            generation: self.issued,
            filters: self.filters.clone(),
            page: self.page,
            page_size: self.page_size,
        }
    }
}

struct Request {
    generation: u64,
    filters: SupplierFilters,
    page: u64,
    page_size: u64,
}

fn non_blank(text: &str) -> Option<String> {
    (!text.is_empty()).then(|| text.to_string())
}

struct Shared<D> {
    directory: D,
    session: Mutex<Session>,
    snapshots: watch::Sender<SearchSnapshot>,
}

impl<D: SupplierDirectory> Shared<D> {
    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn run(&self, request: Request) {
        let result = self
            .directory
            .list(
                request.filters.clone(),
                PageRequest::new(request.page, request.page_size),
            )
            .await;

        // Held while publishing so an older response cannot overwrite a
        // newer one between the check and the send.
        let session = self.lock();
        if session.issued != request.generation {
            debug!(
                generation = request.generation,
                latest = session.issued,
                "Dropping superseded directory response"
            );
            return;
        }

        let snapshot = match result {
            Ok(page) => SearchSnapshot {
                filters: request.filters,
                page: request.page,
                page_size: request.page_size,
                items: page.items,
                total: page.total,
                error: None,
                generation: request.generation,
            },
            Err(err) => {
                warn!(error = %err, "Directory query failed");
                SearchSnapshot {
                    filters: request.filters,
                    page: request.page,
                    page_size: request.page_size,
                    items: Vec::new(),
                    total: 0,
                    error: Some(err.to_string()),
                    generation: request.generation,
                }
            }
        };
        self.snapshots.send_replace(snapshot);
        drop(session);
    }

    /// Timer expiry. A token that no longer matches belongs to a timer
    /// that was replaced after it had already woken up.
    async fn fire(&self, token: u64) {
        let request = {
            let mut session = self.lock();
            if !session.timer.claim(token) {
                return;
            }

            let name = non_blank(&session.draft.name);
            let identifier = non_blank(&session.draft.identifier);
            if name == session.filters.name && identifier == session.filters.identifier {
                debug!("Search draft unchanged, skipping query");
                return;
            }

            session.filters.name = name;
            session.filters.identifier = identifier;
            session.page = 0;
            session.issue()
        };
        self.run(request).await;
    }
}

/// Debounces free-text input in front of a [`SupplierDirectory`] and
/// publishes results through a watch channel.
///
/// Must be used from within a tokio runtime.
pub struct SearchController<D: SupplierDirectory + 'static> {
    shared: Arc<Shared<D>>,
}

impl<D: SupplierDirectory + 'static> SearchController<D> {
    pub fn new(directory: D, page_size: u64) -> Self {
        let (snapshots, _) = watch::channel(SearchSnapshot {
            page_size,
            ..Default::default()
        });
        Self {
            shared: Arc::new(Shared {
                directory,
                session: Mutex::new(Session {
                    draft: SearchDraft::default(),
                    filters: SupplierFilters::default(),
                    page: 0,
                    page_size,
                    issued: 0,
                    timer: Debounce::default(),
                }),
                snapshots,
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot> {
        self.shared.snapshots.subscribe()
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        self.shared.snapshots.borrow().clone()
    }

    pub fn draft(&self) -> SearchDraft {
        self.shared.lock().draft.clone()
    }

    /// Filters the next query will use.
    pub fn filters(&self) -> SupplierFilters {
        self.shared.lock().filters.clone()
    }

    /// Whether a debounce timer is armed.
    pub fn is_pending(&self) -> bool {
        self.shared.lock().timer.is_pending()
    }

    pub fn type_name(&self, text: impl Into<String>) {
        let mut session = self.shared.lock();
        session.draft.name = text.into();
        self.arm(&mut session);
    }

    pub fn type_identifier(&self, text: impl Into<String>) {
        let mut session = self.shared.lock();
        session.draft.identifier = text.into();
        self.arm(&mut session);
    }

    /// Commit a segment selection and query page 0 right away. A pending
    /// text draft stays pending.
    pub async fn select_segment(&self, segment: Option<String>) {
        let request = {
            let mut session = self.shared.lock();
            session.filters.segment = segment.filter(|s| !s.is_empty());
            session.page = 0;
            session.issue()
        };
        self.shared.run(request).await;
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

    /// Drop the draft and every active filter, then query page 0.
    pub async fn clear(&self) {
        let request = {
            let mut session = self.shared.lock();
            session.timer.cancel();
            session.draft = SearchDraft::default();
            session.filters = SupplierFilters::default();
            session.page = 0;
            session.issue()
        };
        self.shared.run(request).await;
    }

    /// Query again with the current filters and page.
    pub async fn refresh(&self) {
        let request = self.shared.lock().issue();
        self.shared.run(request).await;
    }

    fn arm(&self, session: &mut Session) {
        let shared = Arc::clone(&self.shared);
        session
            .timer
            .arm(move |token| async move { shared.fire(token).await });
    }
}

impl<D: SupplierDirectory + 'static> Drop for SearchController<D> {
    fn drop(&mut self) {
        self.shared.lock().timer.cancel();
    }
}
