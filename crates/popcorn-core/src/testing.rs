//! Test doubles for the controllers.

use async_trait::async_trait;
use popcorn_models::{DetailRecord, SearchResult};
use popcorn_sources::{CatalogSource, SourceError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::oneshot;

use crate::bindings::DisplayLabel;
use crate::fetch::lock;

type SearchReply = Result<Vec<SearchResult>, SourceError>;
type DetailReply = Result<DetailRecord, SourceError>;

/// Poll `cond` while letting other tasks run; false after ~2s
pub async fn eventually<F: FnMut() -> bool>(mut cond: F) -> bool {
    for _ in 0..2000 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    cond()
}

pub fn result(imdb_id: &str, title: &str) -> SearchResult {
    SearchResult {
        imdb_id: imdb_id.to_string(),
        title: title.to_string(),
        year: "2005".to_string(),
        poster: "N/A".to_string(),
    }
}

pub fn detail(imdb_id: &str, title: &str) -> DetailRecord {
    DetailRecord {
        imdb_id: imdb_id.to_string(),
        title: title.to_string(),
        year: "2010".to_string(),
        released: "16 Jul 2010".to_string(),
        imdb_rating: "8.8".to_string(),
        runtime: "148 min".to_string(),
        ..DetailRecord::default()
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Catalog whose responses are released by the test, in any order.
#[derive(Default)]
pub struct ScriptedCatalog {
    search_calls: Mutex<Vec<String>>,
    detail_calls: Mutex<Vec<String>>,
    pending_searches: Mutex<HashMap<String, oneshot::Sender<SearchReply>>>,
    pending_details: Mutex<HashMap<String, oneshot::Sender<DetailReply>>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedCatalog {
    pub fn search_calls(&self) -> Vec<String> {
        lock(&self.search_calls).clone()
    }

    pub fn detail_calls(&self) -> Vec<String> {
        lock(&self.detail_calls).clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Wait until a search for `query` is waiting on a reply
    pub async fn wait_for_search(&self, query: &str) -> bool {
        eventually(|| lock(&self.pending_searches).contains_key(query)).await
    }

    pub async fn wait_for_details(&self, imdb_id: &str) -> bool {
        eventually(|| lock(&self.pending_details).contains_key(imdb_id)).await
    }

    /// Release the reply for `query`. False when the request was never made
    /// or its caller has gone away.
    pub async fn respond_search(&self, query: &str, reply: SearchReply) -> bool {
        if !self.wait_for_search(query).await {
            return false;
        }
        let tx = lock(&self.pending_searches).remove(query);
        tx.map(|tx| tx.send(reply).is_ok()).unwrap_or(false)
    }

    pub async fn respond_details(&self, imdb_id: &str, reply: DetailReply) -> bool {
        if !self.wait_for_details(imdb_id).await {
            return false;
        }
        let tx = lock(&self.pending_details).remove(imdb_id);
        tx.map(|tx| tx.send(reply).is_ok()).unwrap_or(false)
    }

    fn enter(&self) -> InFlight<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        InFlight(&self.in_flight)
    }
}

#[async_trait]
impl CatalogSource for ScriptedCatalog {
    fn source_name(&self) -> &str {
        "scripted"
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SourceError> {
        let _guard = self.enter();
        let (tx, rx) = oneshot::channel();
        lock(&self.search_calls).push(query.to_string());
        lock(&self.pending_searches).insert(query.to_string(), tx);
        rx.await
            .unwrap_or_else(|_| Err(SourceError::Transport("reply dropped".to_string())))
    }

    async fn details(&self, imdb_id: &str) -> Result<DetailRecord, SourceError> {
        let (tx, rx) = oneshot::channel();
        lock(&self.detail_calls).push(imdb_id.to_string());
        lock(&self.pending_details).insert(imdb_id.to_string(), tx);
        rx.await
            .unwrap_or_else(|_| Err(SourceError::Transport("reply dropped".to_string())))
    }
}

/// Label that remembers everything it was set to
#[derive(Default)]
pub struct RecordingLabel {
    history: Mutex<Vec<String>>,
}

impl RecordingLabel {
    pub fn history(&self) -> Vec<String> {
        lock(&self.history).clone()
    }

    pub fn current(&self) -> Option<String> {
        lock(&self.history).last().cloned()
    }
}

impl DisplayLabel for RecordingLabel {
    fn set_label(&self, label: &str) {
        lock(&self.history).push(label.to_string());
    }
}
