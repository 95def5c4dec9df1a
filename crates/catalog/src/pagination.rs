use crate::error::CatalogError;
use crate::source::CatalogSource;
use crate::types::{ListingFilter, PageRequest, PageResult, Product};
use std::sync::Arc;
use tokio::task::JoinHandle;

pub type SessionId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Items shown, nothing in flight.
    Idle,
    /// A page fetch for the active session is in flight.
    Loading,
    /// Every item of the listing has been merged.
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    /// Items per window. Zero is treated as one.
    pub page_size: u64,
    /// Fetch the next window in the background after each merge.
    pub prefetch: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            page_size: 5,
            prefetch: true,
        }
    }
}

/// A fetch issued by the controller, tagged with its session.
///
/// Run it against any source, then hand the result back through
/// [`LoadMoreController::complete`].
#[derive(Debug)]
#[must_use = "a pending fetch leaves the session loading until completed"]
pub struct PendingFetch {
    session: SessionId,
    request: PageRequest,
}

impl PendingFetch {
    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn request(&self) -> &PageRequest {
        &self.request
    }

    pub async fn run<S: CatalogSource>(&self, source: &S) -> Result<PageResult, CatalogError> {
        source.fetch_page(&self.request).await
    }
}

/// What [`LoadMoreController::complete`] did with a result.
#[derive(Debug)]
pub enum MergeOutcome {
    Merged { added: usize, state: LoadState },
    /// The result belonged to a session that is no longer active.
    Stale,
    /// The fetch failed; accumulated items are untouched and the session is
    /// back to `Idle`.
    Failed(CatalogError),
}

struct Prefetch {
    session: SessionId,
    offset: u64,
    handle: JoinHandle<()>,
}

/// Load-more pagination over one browsing session at a time.
///
/// A session is one [`ListingFilter`]. The controller owns the items
/// accumulated for it, the offset of the next window and the load state:
///
/// ```text
///   Idle --load_more--> Loading --merge--> Idle
///                          |
///                          +----merge reaches total----> Exhausted
/// ```
///
/// Changing the filter starts a new session. Fetches are tagged with the
/// session they were issued for and results from an older session are
/// dropped. After each merge that leaves items outstanding, the next window
/// is fetched in the background so it is already cached when asked for.
pub struct LoadMoreController<S> {
    source: Arc<S>,
    options: ControllerOptions,
    filter: ListingFilter,
    session: SessionId,
    items: Vec<Product>,
    next_offset: u64,
    total: Option<u64>,
    state: LoadState,
    prefetch: Option<Prefetch>,
}

impl<S: CatalogSource> LoadMoreController<S> {
    pub fn new(source: Arc<S>, options: ControllerOptions) -> Self {
        let options = ControllerOptions {
            page_size: options.page_size.max(1),
            ..options
        };
        Self {
            source,
            options,
            filter: ListingFilter::default(),
            session: 0,
            items: Vec::new(),
            next_offset: 0,
            total: None,
            state: LoadState::Idle,
            prefetch: None,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn items(&self) -> &[Product] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Size of the whole listing, once a page of this session has landed.
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn filter(&self) -> &ListingFilter {
        &self.filter
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn page_size(&self) -> u64 {
        self.options.page_size
    }

    pub fn next_offset(&self) -> u64 {
        self.next_offset
    }

    pub fn has_more(&self) -> bool {
        self.state != LoadState::Exhausted
            && self.total.is_none_or(|total| (self.items.len() as u64) < total)
    }

    /// Session and offset of the background prefetch last issued, if it has
    /// not been settled.
    pub fn prefetch_in_flight(&self) -> Option<(SessionId, u64)> {
        self.prefetch
            .as_ref()
            .filter(|p| !p.handle.is_finished())
            .map(|p| (p.session, p.offset))
    }

    /// Start a new session for `filter`.
    ///
    /// Accumulated items are discarded right away and the session is
    /// `Loading` until its first page is completed. Results of fetches issued
    /// for earlier sessions will be dropped.
    pub fn change_filter(&mut self, filter: ListingFilter) -> PendingFetch {
        self.session += 1;
        tracing::info!(session = self.session, filter = %filter, "listing session started");

        self.filter = filter;
        self.items.clear();
        self.next_offset = 0;
        self.total = None;
        self.state = LoadState::Loading;

        PendingFetch {
            session: self.session,
            request: PageRequest::first(self.filter.clone(), self.options.page_size),
        }
    }

    /// Move to `Loading` and return the fetch for the next window.
    ///
    /// Returns `None` while a fetch is already in flight or once the listing
    /// is exhausted.
    pub fn begin_load_more(&mut self) -> Option<PendingFetch> {
        match self.state {
            LoadState::Loading => {
                tracing::debug!(session = self.session, "load more ignored, fetch in flight");
                None
            }
            LoadState::Exhausted => {
                tracing::debug!(session = self.session, "load more ignored, listing exhausted");
                None
            }
            LoadState::Idle => {
                self.state = LoadState::Loading;
                Some(PendingFetch {
                    session: self.session,
                    request: self.request_at(self.next_offset),
                })
            }
        }
    }

    /// Apply the result of a fetch issued by this controller.
    pub fn complete(
        &mut self,
        pending: PendingFetch,
        result: Result<PageResult, CatalogError>,
    ) -> MergeOutcome {
        if pending.session != self.session {
            tracing::debug!(
                stale_session = pending.session,
                session = self.session,
                offset = pending.request.offset,
                "dropping result of superseded session"
            );
            return MergeOutcome::Stale;
        }

        match result {
            Ok(page) => {
                let added = self.merge(page);
                self.spawn_prefetch();
                MergeOutcome::Merged {
                    added,
                    state: self.state,
                }
            }
            Err(e) => {
                tracing::warn!(
                    session = self.session,
                    offset = pending.request.offset,
                    error = %e,
                    "failed to load page"
                );
                self.state = LoadState::Idle;
                MergeOutcome::Failed(e)
            }
        }
    }

    /// Switch to `filter` and load its first page.
    pub async fn select(&mut self, filter: ListingFilter) -> Result<LoadState, CatalogError> {
        let pending = self.change_filter(filter);
        let result = pending.run(self.source.as_ref()).await;
        self.finish(pending, result)
    }

    /// Load the next window of the active session.
    ///
    /// A no-op returning the current state when the listing is exhausted or
    /// a fetch is already in flight.
    pub async fn load_more(&mut self) -> Result<LoadState, CatalogError> {
        let Some(pending) = self.begin_load_more() else {
            return Ok(self.state);
        };
        let result = pending.run(self.source.as_ref()).await;
        self.finish(pending, result)
    }

    /// Wait for the background prefetch, if any, to finish.
    pub async fn settle_prefetch(&mut self) {
        if let Some(prefetch) = self.prefetch.take() {
            if let Err(e) = prefetch.handle.await {
                tracing::warn!(session = prefetch.session, error = %e, "prefetch task did not complete");
            }
        }
    }

    fn finish(
        &mut self,
        pending: PendingFetch,
        result: Result<PageResult, CatalogError>,
    ) -> Result<LoadState, CatalogError> {
        match self.complete(pending, result) {
            MergeOutcome::Merged { state, .. } => Ok(state),
            MergeOutcome::Stale => Ok(self.state),
            MergeOutcome::Failed(e) => Err(e),
        }
    }

    fn request_at(&self, offset: u64) -> PageRequest {
        PageRequest {
            filter: self.filter.clone(),
            offset,
            page_size: self.options.page_size,
        }
    }

    fn merge(&mut self, page: PageResult) -> usize {
        let added = page.items.len();
        self.items.extend(page.items);
        self.next_offset += self.options.page_size;
        self.total = Some(page.total);

        let len = self.items.len() as u64;
        self.state = if len >= page.total {
            LoadState::Exhausted
        } else if added == 0 {
            tracing::warn!(
                session = self.session,
                accumulated = len,
                total = page.total,
                "empty page before reaching total, treating listing as exhausted"
            );
            LoadState::Exhausted
        } else {
            LoadState::Idle
        };

        tracing::debug!(
            session = self.session,
            added,
            accumulated = len,
            total = page.total,
            state = ?self.state,
            "page merged"
        );
        added
    }

    fn spawn_prefetch(&mut self) {
        if !self.options.prefetch || self.state != LoadState::Idle {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!(session = self.session, "no async runtime, skipping prefetch");
            return;
        };

        let request = self.request_at(self.next_offset);
        let source = Arc::clone(&self.source);
        let session = self.session;
        let offset = request.offset;

        let handle = runtime.spawn(async move {
            match source.fetch_page(&request).await {
                Ok(page) => {
                    tracing::debug!(session, offset, items = page.items.len(), "next page prefetched")
                }
                Err(e) => tracing::warn!(session, offset, error = %e, "prefetch failed"),
            }
        });

        // A previous prefetch keeps running; its result only lands in the cache.
        self.prefetch = Some(Prefetch {
            session,
            offset,
            handle,
        });
    }
}
