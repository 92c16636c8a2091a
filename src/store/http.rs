//! HTTP bookmark store for a hosted sync server.
//!
//! Wire contract, JSON over HTTP:
//!
//! ```text
//! GET    {base}/bookmarks?owner_id=X        200, array of bookmarks, newest first
//! POST   {base}/bookmarks                   2xx, the stored record
//! DELETE {base}/bookmarks/{id}?owner_id=X   2xx
//! GET    {base}/bookmarks/feed?owner_id=X   long-lived, one change event JSON per line
//! ```
//!
//! Every request carries `Authorization: Bearer <token>` when a token is
//! configured. The feed is never reconnected here; a failed feed surfaces as
//! a stream error and stays failed.

use async_trait::async_trait;
use futures::StreamExt;

use crate::store::{ChangeStream, RemoteStore};
use crate::types::bookmark::Bookmark;
use crate::types::errors::{StoreError, SubscriptionError};
use crate::types::event::ChangeEvent;

/// Maps a non-success HTTP status to a store error.
///
/// `subject` names what the request was about (a bookmark id or an owner id)
/// so the error reads usefully in logs.
pub fn classify_status(status: u16, subject: &str) -> StoreError {
    match status {
        404 => StoreError::NotFound(subject.to_string()),
        403 => StoreError::NotOwner(subject.to_string()),
        400 | 422 => {
            StoreError::InvalidRecord(format!("server rejected request for {}", subject))
        }
        _ => StoreError::Transport(format!("server returned status {}", status)),
    }
}

/// Decodes one feed line into a change event.
///
/// Blank lines (keep-alives) decode to `None`.
pub fn decode_event_line(line: &[u8]) -> Result<Option<ChangeEvent>, serde_json::Error> {
    let start = match line.iter().position(|b| !b.is_ascii_whitespace()) {
        Some(start) => start,
        None => return Ok(None),
    };
    let end = line
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .unwrap_or(start);
    serde_json::from_slice(&line[start..=end]).map(Some)
}

/// Bookmark store backed by a hosted sync server.
pub struct HttpStore {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    capacity: usize,
}

impl HttpStore {
    /// Creates a store for the server at `base_url`.
    ///
    /// `capacity` bounds the feed channel, matching the local backend.
    pub fn new(base_url: impl Into<String>, token: Option<String>, capacity: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            capacity: capacity.max(1),
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl RemoteStore for HttpStore {
    async fn fetch_all(&self, owner_id: &str) -> Result<Vec<Bookmark>, StoreError> {
        let response = self
            .authorize(
                self.client
                    .get(format!("{}/bookmarks", self.base_url))
                    .query(&[("owner_id", owner_id)]),
            )
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(classify_status(response.status().as_u16(), owner_id));
        }

        response
            .json::<Vec<Bookmark>>()
            .await
            .map_err(|e| StoreError::InvalidRecord(e.to_string()))
    }

    async fn insert(
        &self,
        owner_id: &str,
        title: &str,
        url: &str,
    ) -> Result<Bookmark, StoreError> {
        let payload = serde_json::json!({
            "owner_id": owner_id,
            "title": title,
            "url": url,
        });

        let response = self
            .authorize(
                self.client
                    .post(format!("{}/bookmarks", self.base_url))
                    .json(&payload),
            )
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(classify_status(response.status().as_u16(), owner_id));
        }

        response
            .json::<Bookmark>()
            .await
            .map_err(|e| StoreError::InvalidRecord(e.to_string()))
    }

    async fn remove(&self, owner_id: &str, id: &str) -> Result<(), StoreError> {
        let response = self
            .authorize(
                self.client
                    .delete(format!("{}/bookmarks/{}", self.base_url, id))
                    .query(&[("owner_id", owner_id)]),
            )
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(classify_status(response.status().as_u16(), id));
        }
        Ok(())
    }

    /// Opens the streaming feed and pumps its lines into a [`ChangeStream`].
    ///
    /// The server scopes the feed by owner; no re-filtering happens here.
    /// Lines can split across chunks, so bytes are buffered until a newline.
    async fn subscribe(&self, owner_id: &str) -> Result<ChangeStream, StoreError> {
        let response = self
            .authorize(
                self.client
                    .get(format!("{}/bookmarks/feed", self.base_url))
                    .query(&[("owner_id", owner_id)]),
            )
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(classify_status(response.status().as_u16(), owner_id));
        }

        let (tx, stream) = ChangeStream::channel(self.capacity);
        let mut body = response.bytes_stream();

        tokio::spawn(async move {
            let mut buf: Vec<u8> = Vec::new();
            while let Some(chunk) = body.next().await {
                match chunk {
                    Ok(bytes) => {
                        buf.extend_from_slice(&bytes);
                        while let Some(pos) = buf.iter().position(|&b| b == b'\n') {
                            let line: Vec<u8> = buf.drain(..=pos).collect();
                            match decode_event_line(&line) {
                                Ok(Some(event)) => {
                                    if tx.send(Ok(event)).await.is_err() {
                                        // Subscriber dropped its stream
                                        return;
                                    }
                                }
                                Ok(None) => {}
                                Err(err) => {
                                    tracing::warn!(
                                        error = %err,
                                        "skipping undecodable feed line"
                                    );
                                }
                            }
                        }
                    }
                    Err(err) => {
                        let _ = tx
                            .send(Err(SubscriptionError::Transport(err.to_string())))
                            .await;
                        return;
                    }
                }
            }
            // Server ended the response body
            let _ = tx.send(Err(SubscriptionError::Closed)).await;
        });

        Ok(stream)
    }
}
