use popcorn_models::SearchResult;
use popcorn_sources::CatalogSource;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

use crate::fetch::{lock, settle, FetchError, RequestHandle, Settled};
use crate::selection::Selection;

/// Queries shorter than this never reach the catalog
pub const MIN_QUERY_LEN: usize = 3;

/// Published view of the search
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub query: String,
    pub results: Vec<SearchResult>,
    pub is_loading: bool,
    pub error: Option<FetchError>,
}

/// What `set_query` did with the new query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Gated by length: state cleared, nothing sent
    QueryTooShort,
    Issued,
    /// Same text as the current query: nothing changed
    Unchanged,
}

pub fn is_searchable(query: &str) -> bool {
    query.chars().count() >= MIN_QUERY_LEN
}

/// Turns query changes into catalog searches.
///
/// At most one search is live at any time; a new query cancels the previous
/// one before anything else happens. Must be used inside a tokio runtime.
pub struct SearchController {
    catalog: Arc<dyn CatalogSource>,
    selection: Selection,
    state: Arc<watch::Sender<SearchState>>,
    request: Mutex<Option<RequestHandle>>,
}

impl SearchController {
    pub fn new(catalog: Arc<dyn CatalogSource>, selection: Selection) -> Self {
        let (tx, _rx) = watch::channel(SearchState::default());
        Self {
            catalog,
            selection,
            state: Arc::new(tx),
            request: Mutex::new(None),
        }
    }

    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    pub fn set_query(&self, query: &str) -> SearchOutcome {
        let mut request = lock(&self.request);
        let query = query.to_string();

        // An unchanged searchable query is either in flight or already settled
        if is_searchable(&query) && self.state.borrow().query == query {
            trace!(operation = "search_unchanged", query = %query, "Query unchanged, ignoring");
            return SearchOutcome::Unchanged;
        }

        if !is_searchable(&query) {
            self.state.send_modify(|state| {
                cancel_outgoing(&mut request);
                state.query = query.clone();
                state.results.clear();
                state.error = None;
                state.is_loading = false;
            });
            trace!(operation = "search_gated", query = %query, "Query too short, not searching");
            return SearchOutcome::QueryTooShort;
        }

        self.state.send_modify(|state| {
            cancel_outgoing(&mut request);
            state.query = query.clone();
            state.error = None;
            state.is_loading = true;
        });

        // A new search closes any open movie
        self.selection.clear();

        debug!(operation = "search_start", query = %query, "Starting search");
        let catalog = self.catalog.clone();
        let state = self.state.clone();
        *request = Some(RequestHandle::spawn(move |flag| async move {
            let result = catalog.search(&query).await;
            state.send_if_modified(|state| match settle(&flag, result) {
                Settled::Cancelled => {
                    trace!(operation = "search_cancelled", query = %query, "Discarding superseded search");
                    false
                }
                Settled::Ok(results) => {
                    info!(operation = "search_complete", query = %query, count = results.len(), "Search returned");
                    state.results = results;
                    state.error = None;
                    state.is_loading = false;
                    true
                }
                Settled::Failed(err) => {
                    warn!(operation = "search_failed", query = %query, error = %err, "Search failed");
                    state.results.clear();
                    state.error = Some(err);
                    state.is_loading = false;
                    true
                }
            });
        }));

        SearchOutcome::Issued
    }

    /// Cancel the outstanding search, if any
    pub fn shutdown(&self) {
        let mut request = lock(&self.request);
        self.state.send_if_modified(|_| {
            cancel_outgoing(&mut request);
            false
        });
    }
}

impl Drop for SearchController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn cancel_outgoing(request: &mut Option<RequestHandle>) {
    if let Some(mut previous) = request.take() {
        previous.cancel();
    }
}
