//! Local SQLite bookmark store.
//!
//! Implements [`RemoteStore`] over the shared [`Database`] handle and feeds
//! change events through an in-process broadcast bus, so local writes drive
//! the same change feed a hosted backend would.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use rusqlite::params;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::database::connection::Database;
use crate::store::{ChangeStream, RemoteStore};
use crate::types::bookmark::Bookmark;
use crate::types::errors::{StoreError, SubscriptionError};
use crate::types::event::ChangeEvent;

/// SQLite-backed bookmark store with an in-process change bus.
pub struct SqliteStore {
    db: Arc<Database>,
    events: broadcast::Sender<ChangeEvent>,
    capacity: usize,
}

impl SqliteStore {
    /// Creates a store over the shared database handle.
    ///
    /// `capacity` bounds both the broadcast bus and each subscriber's feed
    /// channel; a slow subscriber past it sees a `Lagged` feed item.
    pub fn new(db: Arc<Database>, capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            db,
            events,
            capacity: capacity.max(1),
        }
    }

    /// Current time in milliseconds since the UNIX epoch.
    fn now_millis() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64
    }

    /// Publishes an event to all subscribers. No subscribers is fine.
    fn emit(&self, event: ChangeEvent) {
        let _ = self.events.send(event);
    }

    /// Reads a single `Bookmark` row into a struct.
    fn row_to_bookmark(row: &rusqlite::Row) -> rusqlite::Result<Bookmark> {
        Ok(Bookmark {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            url: row.get(2)?,
            title: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

#[async_trait]
impl RemoteStore for SqliteStore {
    /// Lists the owner's bookmarks newest first.
    ///
    /// `rowid` breaks `created_at` ties so two inserts within the same
    /// millisecond still come back most-recent-first.
    async fn fetch_all(&self, owner_id: &str) -> Result<Vec<Bookmark>, StoreError> {
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare(
                "SELECT id, owner_id, url, title, created_at FROM bookmarks \
                 WHERE owner_id = ?1 ORDER BY created_at DESC, rowid DESC",
            )
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        let rows = stmt
            .query_map(params![owner_id], Self::row_to_bookmark)
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| StoreError::DatabaseError(e.to_string()))?);
        }
        Ok(results)
    }

    async fn insert(
        &self,
        owner_id: &str,
        title: &str,
        url: &str,
    ) -> Result<Bookmark, StoreError> {
        let record = Bookmark {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            url: url.to_string(),
            title: title.to_string(),
            created_at: Self::now_millis(),
        };

        self.db
            .connection()
            .execute(
                "INSERT INTO bookmarks (id, owner_id, url, title, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.id,
                    record.owner_id,
                    record.url,
                    record.title,
                    record.created_at
                ],
            )
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        self.emit(ChangeEvent::Inserted {
            record: record.clone(),
        });
        Ok(record)
    }

    async fn remove(&self, owner_id: &str, id: &str) -> Result<(), StoreError> {
        let affected = {
            let conn = self.db.connection();
            conn.execute(
                "DELETE FROM bookmarks WHERE id = ?1 AND owner_id = ?2",
                params![id, owner_id],
            )
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?
        };

        if affected == 0 {
            // Distinguish a missing row from someone else's row
            let exists: bool = self
                .db
                .connection()
                .query_row(
                    "SELECT COUNT(*) > 0 FROM bookmarks WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )
                .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
            return if exists {
                Err(StoreError::NotOwner(id.to_string()))
            } else {
                Err(StoreError::NotFound(id.to_string()))
            };
        }

        self.emit(ChangeEvent::Deleted {
            id: id.to_string(),
            owner_id: owner_id.to_string(),
        });
        Ok(())
    }

    /// Bridges the broadcast bus into a per-subscriber [`ChangeStream`],
    /// dropping other owners' events along the way.
    async fn subscribe(&self, owner_id: &str) -> Result<ChangeStream, StoreError> {
        let mut events = self.events.subscribe();
        let (tx, stream) = ChangeStream::channel(self.capacity);
        let owner = owner_id.to_string();

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if event.owner_id() != owner {
                            continue;
                        }
                        if tx.send(Ok(event)).await.is_err() {
                            // Subscriber dropped its stream
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        if tx
                            .send(Err(SubscriptionError::Lagged(missed)))
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        let _ = tx.send(Err(SubscriptionError::Closed)).await;
                        break;
                    }
                }
            }
        });

        Ok(stream)
    }
}
