//! Change feed listener.
//!
//! Drives a shared [`BookmarkView`] from a store subscription and tracks the
//! subscription lifecycle: unsubscribed → subscribing → active, ending in
//! `error` or `closed`. Both ends are terminal; recovery is a new listener,
//! never an automatic resubscribe.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::store::RemoteStore;
use crate::sync::view::BookmarkView;
use crate::types::errors::{StoreError, SubscriptionError};
use crate::types::event::{ChangeEvent, SubscriptionState};

/// Hook invoked after each feed event has been applied to the view.
///
/// The RPC server pushes protocol lines from it; tests use it to await
/// application deterministically.
pub type EventSink = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

/// Listens on a store's change feed and applies events to a shared view.
pub struct ChangeStreamListener {
    state: Arc<Mutex<SubscriptionState>>,
    task: Option<JoinHandle<()>>,
}

fn lock_state(state: &Mutex<SubscriptionState>) -> MutexGuard<'_, SubscriptionState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

fn lock_view(view: &Mutex<BookmarkView>) -> MutexGuard<'_, BookmarkView> {
    view.lock().unwrap_or_else(|e| e.into_inner())
}

impl ChangeStreamListener {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SubscriptionState::Unsubscribed)),
            task: None,
        }
    }

    pub fn state(&self) -> SubscriptionState {
        *lock_state(&self.state)
    }

    /// Subscribes to the owner's feed and starts the pump task.
    ///
    /// The store's acknowledgment moves the listener to `active`; a refused
    /// subscription moves it to `error` and returns the cause so the caller
    /// can log and degrade to a static list.
    pub async fn start(
        &mut self,
        store: &dyn RemoteStore,
        owner_id: &str,
        view: Arc<Mutex<BookmarkView>>,
        sink: Option<EventSink>,
    ) -> Result<(), StoreError> {
        *lock_state(&self.state) = SubscriptionState::Subscribing;

        let mut stream = match store.subscribe(owner_id).await {
            Ok(stream) => stream,
            Err(err) => {
                *lock_state(&self.state) = SubscriptionState::Error;
                return Err(err);
            }
        };

        *lock_state(&self.state) = SubscriptionState::Active;

        let state = Arc::clone(&self.state);
        let handle = tokio::spawn(async move {
            loop {
                match stream.next().await {
                    Some(Ok(event)) => {
                        lock_view(&view).apply(&event);
                        if let Some(sink) = &sink {
                            sink(&event);
                        }
                        debug!(
                            kind = event.kind(),
                            id = event.record_id(),
                            "applied change event"
                        );
                    }
                    Some(Err(SubscriptionError::Lagged(missed))) => {
                        // Feed continues; the view may be missing events
                        warn!(missed, "change feed lagged; list may be stale");
                    }
                    Some(Err(SubscriptionError::Closed)) | None => {
                        debug!("change feed ended");
                        *lock_state(&state) = SubscriptionState::Closed;
                        break;
                    }
                    Some(Err(err)) => {
                        warn!(error = %err, "change feed failed; list will no longer update");
                        *lock_state(&state) = SubscriptionState::Error;
                        break;
                    }
                }
            }
        });
        self.task = Some(handle);

        Ok(())
    }

    /// Tears the subscription down. Safe to call at any point and more than
    /// once; the listener always ends up `closed`.
    pub fn close(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        *lock_state(&self.state) = SubscriptionState::Closed;
    }
}

impl Default for ChangeStreamListener {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ChangeStreamListener {
    fn drop(&mut self) {
        self.close();
    }
}
