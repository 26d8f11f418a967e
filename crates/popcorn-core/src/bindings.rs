//! Side-channel resources held for the lifetime of an open movie.
//!
//! Both bindings are guards: acquiring one installs the side effect and
//! dropping it removes the effect, so every way a session ends releases them.

use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::trace;

/// Where the currently open title is shown (a window title, a status line..)
pub trait DisplayLabel: Send + Sync {
    fn set_label(&self, label: &str);
}

/// Shows a title on a [`DisplayLabel`] and puts the default back on drop
pub struct TitleBinding {
    label: Arc<dyn DisplayLabel>,
    default_label: String,
}

impl TitleBinding {
    pub fn bind(label: Arc<dyn DisplayLabel>, title: &str, default_label: &str) -> Self {
        label.set_label(title);
        Self {
            label,
            default_label: default_label.to_string(),
        }
    }
}

impl Drop for TitleBinding {
    fn drop(&mut self) {
        self.label.set_label(&self.default_label);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Enter,
    Char(char),
}

/// Process-wide key events
#[derive(Clone, Debug)]
pub struct KeyBus {
    tx: broadcast::Sender<Key>,
}

impl KeyBus {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(16);
        Self { tx }
    }

    /// Deliver a key to every listener, returning how many received it
    pub fn press(&self, key: Key) -> usize {
        self.tx.send(key).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Key> {
        self.tx.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for KeyBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs `on_escape` whenever Escape is pressed, until dropped
pub struct EscapeBinding {
    task: JoinHandle<()>,
}

impl EscapeBinding {
    pub fn bind<F>(keys: &KeyBus, on_escape: F) -> Self
    where
        F: Fn() + Send + 'static,
    {
        // Subscribe before spawning so no key pressed after bind() is missed
        let mut rx = keys.subscribe();
        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(Key::Escape) => {
                        trace!(operation = "escape_listener", "Escape pressed");
                        on_escape();
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
        });
        Self { task }
    }
}

impl Drop for EscapeBinding {
    fn drop(&mut self) {
        self.task.abort();
    }
}
