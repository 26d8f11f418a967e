//! Request handles and response classification shared by both controllers.
//!
//! Every fetch runs in its own task and carries a [`CancelFlag`]. A
//! controller flips the flag of the outgoing request while holding the lock of
//! its published state, and a task only publishes after reading the flag under
//! that same lock. A superseded response therefore can never be observed after
//! the transition that superseded it.

use popcorn_sources::SourceError;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::task::JoinHandle;

/// Failures surfaced to the user. Cancellation is deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Movie not found")]
    NotFound,
    #[error("Unable to fetch the movies. Please check your Network")]
    TransportFailure,
}

impl From<&SourceError> for FetchError {
    fn from(err: &SourceError) -> Self {
        if err.is_not_found() {
            FetchError::NotFound
        } else {
            FetchError::TransportFailure
        }
    }
}

/// Shared cancelled bit of one request
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Owned cancellation capability for exactly one in-flight fetch.
///
/// Dropping the handle cancels the request.
#[derive(Debug)]
pub struct RequestHandle {
    flag: CancelFlag,
    task: Option<JoinHandle<()>>,
}

impl RequestHandle {
    /// Spawn `make(flag)` on the current tokio runtime
    pub fn spawn<F, Fut>(make: F) -> Self
    where
        F: FnOnce(CancelFlag) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let flag = CancelFlag::new();
        let task = tokio::spawn(make(flag.clone()));
        Self {
            flag,
            task: Some(task),
        }
    }

    /// Mark the request cancelled and abort its task
    pub fn cancel(&mut self) {
        self.flag.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.is_cancelled()
    }
}

impl Drop for RequestHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// How a response is allowed to affect published state
#[derive(Debug, PartialEq)]
pub enum Settled<T> {
    /// Superseded or torn down; must not touch state
    Cancelled,
    Ok(T),
    Failed(FetchError),
}

/// Classify a response. Cancellation is decided by origin and checked before
/// anything else, so a late failure of a superseded request is never shown.
pub fn settle<T>(flag: &CancelFlag, result: Result<T, SourceError>) -> Settled<T> {
    if flag.is_cancelled() {
        return Settled::Cancelled;
    }
    match result {
        Ok(value) => Settled::Ok(value),
        Err(err) => Settled::Failed(FetchError::from(&err)),
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
