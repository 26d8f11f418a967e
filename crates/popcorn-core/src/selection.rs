use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// The currently open movie, shared by everything that opens or closes it.
///
/// Cloning yields another handle to the same selection.
#[derive(Clone, Debug)]
pub struct Selection {
    tx: Arc<watch::Sender<Option<String>>>,
}

impl Selection {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> Option<String> {
        self.tx.borrow().clone()
    }

    pub fn is_selected(&self, imdb_id: &str) -> bool {
        self.tx.borrow().as_deref() == Some(imdb_id)
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.tx.subscribe()
    }

    /// Select `imdb_id`, or deselect it when it is already the selection.
    /// Returns the new selection.
    pub fn toggle(&self, imdb_id: &str) -> Option<String> {
        let mut next = None;
        self.tx.send_modify(|current| {
            if current.as_deref() == Some(imdb_id) {
                *current = None;
            } else {
                *current = Some(imdb_id.to_string());
            }
            next = current.clone();
        });
        debug!(operation = "selection_toggle", imdb_id = imdb_id, open = next.is_some(), "Selection toggled");
        next
    }

    /// Select `imdb_id` unless it is already selected
    pub fn select(&self, imdb_id: &str) {
        self.tx.send_if_modified(|current| {
            if current.as_deref() == Some(imdb_id) {
                false
            } else {
                *current = Some(imdb_id.to_string());
                true
            }
        });
    }

    /// Close whatever is open. Returns whether anything was open.
    pub fn clear(&self) -> bool {
        self.tx.send_if_modified(|current| current.take().is_some())
    }

    /// Close the selection only if it is still `imdb_id`
    pub fn clear_if(&self, imdb_id: &str) -> bool {
        self.tx.send_if_modified(|current| {
            if current.as_deref() == Some(imdb_id) {
                *current = None;
                true
            } else {
                false
            }
        })
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::new()
    }
}
