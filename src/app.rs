//! App core for syncmarks.
//!
//! Central struct holding the database, session provider, store backend and
//! the currently open bookmark view, managing application lifecycle.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::warn;

use crate::auth::session::{SessionProvider, SessionProviderTrait};
use crate::config::{Backend, Config};
use crate::database::connection::Database;
use crate::store::{RemoteStore, SqliteStore};
use crate::sync::listener::{ChangeStreamListener, EventSink};
use crate::sync::view::BookmarkView;
use crate::types::bookmark::Bookmark;
use crate::types::errors::StoreError;
use crate::types::event::{ChangeEvent, SubscriptionState};
use crate::types::identity::Identity;

/// A live bookmark list for one signed-in owner.
///
/// Bundles the shared view with the listener feeding it, so both close
/// together.
struct ViewSession {
    owner_id: String,
    view: Arc<Mutex<BookmarkView>>,
    listener: ChangeStreamListener,
}

fn lock_view(view: &Mutex<BookmarkView>) -> MutexGuard<'_, BookmarkView> {
    view.lock().unwrap_or_else(|e| e.into_inner())
}

/// Central application struct holding the store, the session provider and
/// the open view.
///
/// At most one view is open at a time; signing in as somebody else replaces
/// it. The store is a trait object so the rest of the app never knows which
/// backend it is talking to.
pub struct App {
    pub db: Arc<Database>,
    pub config: Config,
    pub session: SessionProvider,
    store: Arc<dyn RemoteStore>,
    event_sink: Option<EventSink>,
    view: Option<ViewSession>,
}

impl App {
    /// Creates a new App, opening the database and wiring the configured
    /// store backend.
    pub fn new(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        let db = Arc::new(Database::open(config.db_path())?);

        let session = SessionProvider::new(db.clone())
            .map_err(|e| format!("SessionProvider init failed: {}", e))?;
        let store = Self::build_store(&config, db.clone())?;

        Ok(Self {
            db,
            config,
            session,
            store,
            event_sink: None,
            view: None,
        })
    }

    fn build_store(
        config: &Config,
        db: Arc<Database>,
    ) -> Result<Arc<dyn RemoteStore>, Box<dyn std::error::Error>> {
        match config.backend {
            Backend::Local => Ok(Arc::new(SqliteStore::new(db, config.channel_capacity))),
            #[cfg(feature = "remote")]
            Backend::Remote => {
                let url = config
                    .remote_url
                    .clone()
                    .ok_or("remote backend needs SYNCMARKS_REMOTE_URL")?;
                Ok(Arc::new(crate::store::HttpStore::new(
                    url,
                    config.remote_token.clone(),
                    config.channel_capacity,
                )))
            }
            #[cfg(not(feature = "remote"))]
            Backend::Remote => {
                Err("remote backend requires building with the 'remote' feature".into())
            }
        }
    }

    /// Registers a callback invoked for every feed event applied to the open
    /// view. Set it before `open_view`; an already-running listener keeps the
    /// sink it was started with.
    pub fn set_event_sink(&mut self, sink: EventSink) {
        self.event_sink = Some(sink);
    }

    /// Opens the bookmark view for `identity`: fetches the current list and
    /// subscribes to the owner's change feed. Any previously open view is
    /// closed first.
    ///
    /// Both halves degrade rather than fail: a failed fetch yields an empty
    /// list, a refused subscription leaves a static one. Returns the initial
    /// snapshot.
    pub async fn open_view(&mut self, identity: &Identity) -> Vec<Bookmark> {
        self.close_view();

        let records = match self.store.fetch_all(&identity.user_id).await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "initial bookmark fetch failed; starting with an empty list");
                Vec::new()
            }
        };

        let view = Arc::new(Mutex::new(BookmarkView::new(identity.user_id.clone())));
        lock_view(&view).reset(records.clone());

        let mut listener = ChangeStreamListener::new();
        if let Err(e) = listener
            .start(
                self.store.as_ref(),
                &identity.user_id,
                view.clone(),
                self.event_sink.clone(),
            )
            .await
        {
            warn!(error = %e, "change feed subscription failed; list will not update");
        }

        self.view = Some(ViewSession {
            owner_id: identity.user_id.clone(),
            view,
            listener,
        });
        records
    }

    /// Adds a bookmark through the store and applies it to the open view
    /// right away instead of waiting for the feed echo.
    pub async fn add_bookmark(
        &self,
        identity: &Identity,
        title: &str,
        url: &str,
    ) -> Result<Bookmark, StoreError> {
        let record = self.store.insert(&identity.user_id, title, url).await?;
        self.apply_local(&ChangeEvent::Inserted {
            record: record.clone(),
        });
        Ok(record)
    }

    /// Deletes a bookmark through the store and drops it from the open view
    /// right away.
    pub async fn delete_bookmark(&self, identity: &Identity, id: &str) -> Result<(), StoreError> {
        self.store.remove(&identity.user_id, id).await?;
        self.apply_local(&ChangeEvent::Deleted {
            id: id.to_string(),
            owner_id: identity.user_id.clone(),
        });
        Ok(())
    }

    /// Applies a locally produced event to the open view.
    ///
    /// The feed may echo the same event later; the reducer merges by id, so
    /// the second application is a no-op.
    fn apply_local(&self, event: &ChangeEvent) {
        if let Some(session) = &self.view {
            lock_view(&session.view).apply(event);
        }
    }

    /// Snapshot of the open view's records, or `None` when no view is open.
    pub fn view_records(&self) -> Option<Vec<Bookmark>> {
        self.view.as_ref().map(|s| lock_view(&s.view).snapshot())
    }

    /// Owner of the open view, if any.
    pub fn view_owner(&self) -> Option<&str> {
        self.view.as_ref().map(|s| s.owner_id.as_str())
    }

    /// Subscription state of the open view's listener, `Unsubscribed` when
    /// no view is open.
    pub fn subscription_state(&self) -> SubscriptionState {
        match &self.view {
            Some(session) => session.listener.state(),
            None => SubscriptionState::Unsubscribed,
        }
    }

    /// Closes the open view and its feed subscription, if any.
    pub fn close_view(&mut self) {
        if let Some(mut session) = self.view.take() {
            session.listener.close();
        }
    }

    /// Shutdown sequence: close the open view.
    pub fn shutdown(&mut self) {
        self.close_view();
    }
}
