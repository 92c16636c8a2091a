//! Remote bookmark storage.
//!
//! [`RemoteStore`] is the single gateway for persistent bookmark reads and
//! writes, with two backends: [`SqliteStore`] for a local database and
//! [`HttpStore`] for a hosted sync server (behind the `remote` feature). Both
//! expose the same operations and the same change feed shape, so everything
//! above this module is backend-agnostic.
//!
//! Identity never rides along implicitly: every call takes the owning
//! `owner_id` explicitly.

pub mod sqlite;

#[cfg(feature = "remote")]
pub mod http;

pub use sqlite::SqliteStore;

#[cfg(feature = "remote")]
pub use http::HttpStore;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::types::bookmark::Bookmark;
use crate::types::errors::{StoreError, SubscriptionError};
use crate::types::event::ChangeEvent;

/// Trait defining remote bookmark store operations.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetches all bookmarks belonging to `owner_id`, newest first.
    async fn fetch_all(&self, owner_id: &str) -> Result<Vec<Bookmark>, StoreError>;

    /// Inserts a bookmark and returns the stored record with store-assigned
    /// id and creation time.
    async fn insert(&self, owner_id: &str, title: &str, url: &str)
        -> Result<Bookmark, StoreError>;

    /// Removes a bookmark by id.
    ///
    /// Fails with `NotFound` if no such record exists and `NotOwner` if it
    /// belongs to a different owner.
    async fn remove(&self, owner_id: &str, id: &str) -> Result<(), StoreError>;

    /// Opens a change feed of this owner's bookmark events.
    ///
    /// A returned `Ok` is the subscription acknowledgment. Feed failures
    /// after that point are delivered through the stream itself.
    async fn subscribe(&self, owner_id: &str) -> Result<ChangeStream, StoreError>;
}

/// Pull handle over a change feed.
///
/// Backends push `Ok(event)` items and at most one final `Err` before the
/// feed ends; a stream that ends without an error was closed cleanly.
pub struct ChangeStream {
    rx: mpsc::Receiver<Result<ChangeEvent, SubscriptionError>>,
}

impl ChangeStream {
    /// Builds a (sender, stream) pair. Backends and tests construct feeds
    /// through this so they all carry the same channel shape.
    pub fn channel(
        capacity: usize,
    ) -> (
        mpsc::Sender<Result<ChangeEvent, SubscriptionError>>,
        ChangeStream,
    ) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, ChangeStream { rx })
    }

    /// Waits for the next feed item. `None` means the feed ended.
    pub async fn next(&mut self) -> Option<Result<ChangeEvent, SubscriptionError>> {
        self.rx.recv().await
    }
}
