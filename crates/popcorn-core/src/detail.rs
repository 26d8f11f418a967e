use popcorn_models::{DetailRecord, UserRating, WatchedEntry};
use popcorn_sources::{CatalogSource, SourceError};
use std::sync::{Arc, Mutex, Weak};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::bindings::{DisplayLabel, EscapeBinding, KeyBus, TitleBinding};
use crate::fetch::{lock, settle, CancelFlag, FetchError, RequestHandle, Settled};
use crate::selection::Selection;
use crate::watched::WatchedListStore;

/// Published view of the open movie
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailState {
    pub selected_id: Option<String>,
    pub detail: Option<DetailRecord>,
    pub is_loading: bool,
    pub error: Option<FetchError>,
    pub user_rating: UserRating,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfirmError {
    #[error("no movie is open")]
    NoSelection,
    #[error("movie details are not loaded yet")]
    DetailNotLoaded,
    #[error("choose a rating first")]
    RatingUnset,
    #[error("you already watched this movie")]
    AlreadyWatched,
}

/// Everything held while one movie is open. Field order is drop order:
/// the request is cancelled before the listeners are released.
struct Session {
    imdb_id: String,
    request: RequestHandle,
    _escape: EscapeBinding,
    title: Option<TitleBinding>,
}

struct DetailShared {
    catalog: Arc<dyn CatalogSource>,
    selection: Selection,
    label: Arc<dyn DisplayLabel>,
    default_label: String,
    keys: KeyBus,
    state: watch::Sender<DetailState>,
    session: Mutex<Option<Session>>,
}

/// Keeps the published detail in step with the [`Selection`].
///
/// A driver task reacts to every selection change: the previous session is
/// released (request cancelled, escape listener removed, label restored) and
/// a new one is opened for a non-empty selection. Must be created inside a
/// tokio runtime.
pub struct DetailController {
    shared: Arc<DetailShared>,
    driver: JoinHandle<()>,
}

impl DetailController {
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        selection: Selection,
        label: Arc<dyn DisplayLabel>,
        default_label: &str,
        keys: KeyBus,
    ) -> Self {
        let (tx, _rx) = watch::channel(DetailState::default());
        let rx = selection.subscribe();
        let shared = Arc::new(DetailShared {
            catalog,
            selection,
            label,
            default_label: default_label.to_string(),
            keys,
            state: tx,
            session: Mutex::new(None),
        });
        let driver = tokio::spawn(drive(Arc::downgrade(&shared), rx));
        Self { shared, driver }
    }

    pub fn state(&self) -> DetailState {
        self.shared.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DetailState> {
        self.shared.state.subscribe()
    }

    pub fn selection(&self) -> &Selection {
        &self.shared.selection
    }

    /// The back action
    pub fn close(&self) {
        self.shared.selection.clear();
    }

    /// Pick a rating for the open movie; ignored when nothing is open
    pub fn set_user_rating(&self, rating: u8) {
        let rating = UserRating::new(rating);
        self.shared.state.send_if_modified(|state| {
            if state.selected_id.is_none() || state.user_rating == rating {
                return false;
            }
            state.user_rating = rating;
            true
        });
    }

    /// Whether the open movie is already in `store`
    pub fn already_watched(&self, store: &WatchedListStore) -> bool {
        self.shared
            .selection
            .current()
            .map(|id| store.contains(&id))
            .unwrap_or(false)
    }

    pub fn can_confirm(&self, store: &WatchedListStore) -> bool {
        self.check_confirm(store).is_ok()
    }

    /// Record the open movie as watched with the chosen rating, then close it.
    /// On error nothing changes.
    pub fn confirm(&self, store: &mut WatchedListStore) -> Result<WatchedEntry, ConfirmError> {
        let (imdb_id, detail, rating) = self.check_confirm(store)?;

        let mut entry = WatchedEntry::from_detail(&detail, rating);
        entry.imdb_id = imdb_id;
        if !store.add(entry.clone()) {
            return Err(ConfirmError::AlreadyWatched);
        }
        info!(
            operation = "watched_add",
            imdb_id = %entry.imdb_id,
            user_rating = entry.user_rating.value(),
            "Added to watched list"
        );

        self.close();
        Ok(entry)
    }

    fn check_confirm(&self, store: &WatchedListStore) -> Result<(String, DetailRecord, UserRating), ConfirmError> {
        let imdb_id = self.shared.selection.current().ok_or(ConfirmError::NoSelection)?;
        let state = self.state();
        if state.selected_id.as_deref() != Some(imdb_id.as_str()) {
            return Err(ConfirmError::DetailNotLoaded);
        }
        let detail = state.detail.ok_or(ConfirmError::DetailNotLoaded)?;
        if !state.user_rating.is_set() {
            return Err(ConfirmError::RatingUnset);
        }
        if store.contains(&imdb_id) {
            return Err(ConfirmError::AlreadyWatched);
        }
        Ok((imdb_id, detail, state.user_rating))
    }

    /// Stop reacting to the selection and release the open session
    pub fn shutdown(&self) {
        self.driver.abort();
        self.shared.release();
    }
}

impl Drop for DetailController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn drive(shared: Weak<DetailShared>, mut selection: watch::Receiver<Option<String>>) {
    loop {
        let selected = selection.borrow_and_update().clone();
        match shared.upgrade() {
            Some(shared) => shared.apply(selected),
            None => break,
        }
        if selection.changed().await.is_err() {
            break;
        }
    }
}

impl DetailShared {
    fn apply(self: &Arc<Self>, selected: Option<String>) {
        let mut session = lock(&self.session);
        let previous = session.take();

        let Some(imdb_id) = selected else {
            self.state.send_modify(|state| {
                drop(previous);
                *state = DetailState::default();
            });
            debug!(operation = "detail_close", "Selection cleared");
            return;
        };

        self.state.send_modify(|state| {
            drop(previous);
            *state = DetailState {
                selected_id: Some(imdb_id.clone()),
                is_loading: true,
                ..DetailState::default()
            };
        });
        debug!(operation = "detail_open", imdb_id = %imdb_id, "Fetching details");

        let escape = {
            let selection = self.selection.clone();
            let imdb_id = imdb_id.clone();
            EscapeBinding::bind(&self.keys, move || {
                selection.clear_if(&imdb_id);
            })
        };

        let weak = Arc::downgrade(self);
        let catalog = self.catalog.clone();
        let id = imdb_id.clone();
        let request = RequestHandle::spawn(move |flag| async move {
            let result = catalog.details(&id).await;
            if let Some(shared) = weak.upgrade() {
                shared.complete(&flag, &id, result);
            }
        });

        *session = Some(Session {
            imdb_id,
            request,
            _escape: escape,
            title: None,
        });
    }

    fn complete(&self, flag: &CancelFlag, imdb_id: &str, result: Result<DetailRecord, SourceError>) {
        let mut session = lock(&self.session);
        let current = match session.as_mut() {
            Some(current) if current.imdb_id == imdb_id && !current.request.is_cancelled() => current,
            _ => {
                trace!(operation = "detail_cancelled", imdb_id = imdb_id, "Discarding superseded details");
                return;
            }
        };

        let mut title = None;
        self.state.send_if_modified(|state| match settle(flag, result) {
            Settled::Cancelled => false,
            Settled::Ok(detail) => {
                info!(operation = "detail_complete", imdb_id = imdb_id, title = %detail.title, "Details loaded");
                if detail.has_title() {
                    title = Some(detail.title.clone());
                }
                state.detail = Some(detail);
                state.error = None;
                state.is_loading = false;
                true
            }
            Settled::Failed(err) => {
                warn!(operation = "detail_failed", imdb_id = imdb_id, error = %err, "Details failed");
                state.detail = None;
                state.error = Some(err);
                state.is_loading = false;
                true
            }
        });

        if let Some(title) = title {
            current.title = Some(TitleBinding::bind(self.label.clone(), &title, &self.default_label));
        }
    }

    fn release(&self) {
        let mut session = lock(&self.session);
        let previous = session.take();
        if previous.is_some() {
            self.state.send_if_modified(|_| {
                drop(previous);
                false
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::Key;
    use crate::testing::{detail, eventually, RecordingLabel, ScriptedCatalog};
    use std::time::Duration;

    struct Fixture {
        catalog: Arc<ScriptedCatalog>,
        selection: Selection,
        label: Arc<RecordingLabel>,
        keys: KeyBus,
        controller: DetailController,
    }

    fn fixture() -> Fixture {
        let catalog = Arc::new(ScriptedCatalog::default());
        let selection = Selection::new();
        let label = Arc::new(RecordingLabel::default());
        let keys = KeyBus::new();
        let controller = DetailController::new(
            catalog.clone(),
            selection.clone(),
            label.clone(),
            "usePopcorn",
            keys.clone(),
        );
        Fixture { catalog, selection, label, keys, controller }
    }

    async fn wait_state<F>(controller: &DetailController, cond: F) -> DetailState
    where
        F: FnMut(&DetailState) -> bool,
    {
        let mut rx = controller.subscribe();
        let state = tokio::time::timeout(Duration::from_secs(2), rx.wait_for(cond))
            .await
            .expect("detail state never matched")
            .expect("state channel closed")
            .clone();
        state
    }

    async fn open(f: &Fixture, imdb_id: &str, title: &str) -> DetailState {
        f.selection.toggle(imdb_id);
        assert!(f.catalog.respond_details(imdb_id, Ok(detail(imdb_id, title))).await);
        wait_state(&f.controller, |s| s.detail.is_some() && !s.is_loading).await
    }

    #[tokio::test]
    async fn test_selection_loads_detail_and_binds_title() {
        let f = fixture();

        f.selection.toggle("tt1375666");
        let loading = wait_state(&f.controller, |s| s.is_loading).await;
        assert_eq!(loading.selected_id.as_deref(), Some("tt1375666"));
        assert!(loading.detail.is_none());

        f.catalog.respond_details("tt1375666", Ok(detail("tt1375666", "Inception"))).await;
        let state = wait_state(&f.controller, |s| !s.is_loading).await;
        assert_eq!(state.detail.unwrap().title, "Inception");
        assert_eq!(state.error, None);
        assert!(eventually(|| f.label.current().as_deref() == Some("Inception")).await);
    }

    #[tokio::test]
    async fn test_clearing_selection_restores_label() {
        let f = fixture();
        open(&f, "tt1375666", "Inception").await;
        assert!(eventually(|| f.label.current().as_deref() == Some("Inception")).await);

        f.controller.close();
        let state = wait_state(&f.controller, |s| s.selected_id.is_none()).await;
        assert!(state.detail.is_none());
        assert_eq!(f.label.history(), vec!["Inception", "usePopcorn"]);
    }

    #[tokio::test]
    async fn test_toggle_same_id_closes_detail() {
        let f = fixture();
        open(&f, "tt1375666", "Inception").await;

        f.selection.toggle("tt1375666");
        wait_state(&f.controller, |s| s.selected_id.is_none()).await;
        assert_eq!(f.catalog.detail_calls(), vec!["tt1375666"]);
    }

    #[tokio::test]
    async fn test_switching_selection_ignores_stale_detail() {
        let f = fixture();

        f.selection.toggle("tt1");
        assert!(f.catalog.wait_for_details("tt1").await);
        f.selection.toggle("tt2");
        assert!(f.catalog.wait_for_details("tt2").await);

        f.catalog.respond_details("tt2", Ok(detail("tt2", "Second"))).await;
        let state = wait_state(&f.controller, |s| s.detail.is_some()).await;
        assert_eq!(state.detail.unwrap().title, "Second");

        f.catalog.respond_details("tt1", Ok(detail("tt1", "First"))).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        let state = f.controller.state();
        assert_eq!(state.selected_id.as_deref(), Some("tt2"));
        assert_eq!(state.detail.unwrap().title, "Second");
        assert!(!f.label.history().contains(&"First".to_string()));
    }

    #[tokio::test]
    async fn test_escape_closes_selection() {
        let f = fixture();
        open(&f, "tt1375666", "Inception").await;
        assert!(eventually(|| f.keys.listener_count() == 1).await);

        f.keys.press(Key::Escape);
        wait_state(&f.controller, |s| s.selected_id.is_none()).await;
        assert_eq!(f.selection.current(), None);
        assert!(eventually(|| f.keys.listener_count() == 0).await);
    }

    #[tokio::test]
    async fn test_other_keys_do_not_close() {
        let f = fixture();
        open(&f, "tt1375666", "Inception").await;

        f.keys.press(Key::Enter);
        f.keys.press(Key::Char('q'));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(f.selection.is_selected("tt1375666"));
    }

    #[tokio::test]
    async fn test_detail_failure_is_published() {
        let f = fixture();
        f.selection.toggle("tt0");
        f.catalog
            .respond_details("tt0", Err(SourceError::NotFound("Incorrect IMDb ID.".into())))
            .await;

        let state = wait_state(&f.controller, |s| s.error.is_some()).await;
        assert!(!state.is_loading);
        assert!(state.detail.is_none());
        assert_eq!(state.error, Some(FetchError::NotFound));
        assert!(f.label.history().is_empty());
    }

    #[tokio::test]
    async fn test_confirm_appends_entry_and_closes() {
        let f = fixture();
        let mut store = WatchedListStore::new();
        open(&f, "tt1375666", "Inception").await;

        assert!(!f.controller.can_confirm(&store));
        f.controller.set_user_rating(7);
        assert!(f.controller.can_confirm(&store));

        let entry = f.controller.confirm(&mut store).unwrap();
        assert_eq!(entry.user_rating.value(), 7);
        assert_eq!(entry.runtime, Some(148));
        assert_eq!(store.len(), 1);
        assert_eq!(store.entries()[0].imdb_id, "tt1375666");
        assert_eq!(f.selection.current(), None);
    }

    #[tokio::test]
    async fn test_confirm_disabled_without_rating() {
        let f = fixture();
        let mut store = WatchedListStore::new();
        open(&f, "tt1375666", "Inception").await;

        assert_eq!(f.controller.confirm(&mut store), Err(ConfirmError::RatingUnset));
        assert!(store.is_empty());
        assert!(f.selection.is_selected("tt1375666"));
    }

    #[tokio::test]
    async fn test_confirm_disabled_when_already_watched() {
        let f = fixture();
        let mut store = WatchedListStore::new();
        open(&f, "tt1375666", "Inception").await;
        f.controller.set_user_rating(9);
        f.controller.confirm(&mut store).unwrap();

        open(&f, "tt1375666", "Inception").await;
        assert!(f.controller.already_watched(&store));
        f.controller.set_user_rating(3);
        assert_eq!(f.controller.confirm(&mut store), Err(ConfirmError::AlreadyWatched));
        assert_eq!(store.len(), 1);
        assert_eq!(store.entries()[0].user_rating.value(), 9);
    }

    #[tokio::test]
    async fn test_confirm_requires_loaded_detail() {
        let f = fixture();
        let mut store = WatchedListStore::new();
        assert_eq!(f.controller.confirm(&mut store), Err(ConfirmError::NoSelection));

        f.selection.toggle("tt1");
        wait_state(&f.controller, |s| s.is_loading).await;
        f.controller.set_user_rating(5);
        assert_eq!(f.controller.confirm(&mut store), Err(ConfirmError::DetailNotLoaded));
    }

    #[tokio::test]
    async fn test_rating_resets_on_new_selection() {
        let f = fixture();
        open(&f, "tt1", "First").await;
        f.controller.set_user_rating(8);
        assert_eq!(f.controller.state().user_rating.value(), 8);

        let state = open(&f, "tt2", "Second").await;
        assert!(!state.user_rating.is_set());
    }

    #[tokio::test]
    async fn test_rating_ignored_without_selection() {
        let f = fixture();
        f.controller.set_user_rating(6);
        assert!(!f.controller.state().user_rating.is_set());
    }

    #[tokio::test]
    async fn test_teardown_with_fetch_in_flight() {
        let f = fixture();
        let rx = f.controller.subscribe();

        f.selection.toggle("tt1375666");
        assert!(f.catalog.wait_for_details("tt1375666").await);
        drop(f.controller);

        f.catalog.respond_details("tt1375666", Ok(detail("tt1375666", "Inception"))).await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(rx.borrow().detail.is_none());
        assert!(f.label.history().is_empty());
        assert!(eventually(|| f.keys.listener_count() == 0).await);
    }

    #[tokio::test]
    async fn test_teardown_restores_label() {
        let f = fixture();
        open(&f, "tt1375666", "Inception").await;
        assert!(eventually(|| f.label.current().as_deref() == Some("Inception")).await);

        drop(f.controller);
        assert_eq!(f.label.current().as_deref(), Some("usePopcorn"));
    }
}
