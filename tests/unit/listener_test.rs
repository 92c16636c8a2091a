//! Unit tests for the change stream listener.
//!
//! A stub store hands out a pre-built feed so every lifecycle transition can
//! be driven from the test. The event sink doubles as the synchronization
//! point: once it reports an event, that event has been applied to the view.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use syncmarks::store::{ChangeStream, RemoteStore};
use syncmarks::sync::listener::EventSink;
use syncmarks::sync::{BookmarkView, ChangeStreamListener};
use syncmarks::types::bookmark::Bookmark;
use syncmarks::types::errors::{StoreError, SubscriptionError};
use syncmarks::types::event::{ChangeEvent, SubscriptionState};

type FeedSender = mpsc::Sender<Result<ChangeEvent, SubscriptionError>>;

struct StubStore {
    stream: Mutex<Option<ChangeStream>>,
    refuse: bool,
}

impl StubStore {
    /// Store whose single subscription is the returned sender's feed.
    fn with_feed() -> (Self, FeedSender) {
        let (tx, stream) = ChangeStream::channel(8);
        let store = Self {
            stream: Mutex::new(Some(stream)),
            refuse: false,
        };
        (store, tx)
    }

    fn refusing() -> Self {
        Self {
            stream: Mutex::new(None),
            refuse: true,
        }
    }
}

#[async_trait]
impl RemoteStore for StubStore {
    async fn fetch_all(&self, _owner_id: &str) -> Result<Vec<Bookmark>, StoreError> {
        Ok(Vec::new())
    }

    async fn insert(
        &self,
        _owner_id: &str,
        _title: &str,
        _url: &str,
    ) -> Result<Bookmark, StoreError> {
        Err(StoreError::Transport("stub store is read-only".to_string()))
    }

    async fn remove(&self, _owner_id: &str, _id: &str) -> Result<(), StoreError> {
        Err(StoreError::Transport("stub store is read-only".to_string()))
    }

    async fn subscribe(&self, _owner_id: &str) -> Result<ChangeStream, StoreError> {
        if self.refuse {
            return Err(StoreError::Transport("subscription refused".to_string()));
        }
        self.stream
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| StoreError::Transport("feed already taken".to_string()))
    }
}

fn bookmark(id: &str, title: &str) -> Bookmark {
    Bookmark {
        id: id.to_string(),
        owner_id: "alice".to_string(),
        url: format!("https://example.com/{}", id),
        title: title.to_string(),
        created_at: 1_700_000_000_000,
    }
}

fn shared_view() -> Arc<Mutex<BookmarkView>> {
    Arc::new(Mutex::new(BookmarkView::new("alice")))
}

/// Sink that forwards applied events into a channel the test can await.
fn sink_channel() -> (EventSink, mpsc::UnboundedReceiver<ChangeEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let sink: EventSink = Arc::new(move |event: &ChangeEvent| {
        let _ = tx.send(event.clone());
    });
    (sink, rx)
}

/// Polls until the listener reaches `target`; transitions made by the pump
/// task are not observable at a fixed instant.
async fn wait_for_state(listener: &ChangeStreamListener, target: SubscriptionState) {
    for _ in 0..400 {
        if listener.state() == target {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!(
        "listener never reached {}, stuck at {}",
        target,
        listener.state()
    );
}

#[test]
fn test_new_listener_is_unsubscribed() {
    let listener = ChangeStreamListener::new();
    assert_eq!(listener.state(), SubscriptionState::Unsubscribed);
}

#[tokio::test]
async fn test_start_activates_on_acknowledgment() {
    let (store, _feed) = StubStore::with_feed();
    let mut listener = ChangeStreamListener::new();

    let result = listener.start(&store, "alice", shared_view(), None).await;

    assert!(result.is_ok());
    assert_eq!(listener.state(), SubscriptionState::Active);
}

#[tokio::test]
async fn test_refused_subscription_ends_in_error() {
    let store = StubStore::refusing();
    let mut listener = ChangeStreamListener::new();

    let result = listener.start(&store, "alice", shared_view(), None).await;

    assert!(matches!(result, Err(StoreError::Transport(_))));
    assert_eq!(listener.state(), SubscriptionState::Error);
}

#[tokio::test]
async fn test_feed_events_reach_the_view() {
    let (store, feed) = StubStore::with_feed();
    let view = shared_view();
    let (sink, mut applied) = sink_channel();
    let mut listener = ChangeStreamListener::new();
    listener
        .start(&store, "alice", Arc::clone(&view), Some(sink))
        .await
        .unwrap();

    let record = bookmark("bm-1", "Pushed");
    feed.send(Ok(ChangeEvent::Inserted {
        record: record.clone(),
    }))
    .await
    .unwrap();

    let seen = applied.recv().await.unwrap();
    assert_eq!(seen.record_id(), "bm-1");
    assert_eq!(view.lock().unwrap().records(), &[record]);
}

#[tokio::test]
async fn test_feed_close_is_terminal() {
    let (store, feed) = StubStore::with_feed();
    let view = shared_view();
    let (sink, mut applied) = sink_channel();
    let mut listener = ChangeStreamListener::new();
    listener
        .start(&store, "alice", Arc::clone(&view), Some(sink))
        .await
        .unwrap();

    feed.send(Ok(ChangeEvent::Inserted {
        record: bookmark("bm-1", "Before close"),
    }))
    .await
    .unwrap();
    applied.recv().await.unwrap();

    feed.send(Err(SubscriptionError::Closed)).await.unwrap();
    wait_for_state(&listener, SubscriptionState::Closed).await;

    // The list applied so far stays usable as a static snapshot
    assert_eq!(view.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_dropped_feed_counts_as_closed() {
    let (store, feed) = StubStore::with_feed();
    let mut listener = ChangeStreamListener::new();
    listener
        .start(&store, "alice", shared_view(), None)
        .await
        .unwrap();

    drop(feed);

    wait_for_state(&listener, SubscriptionState::Closed).await;
}

#[tokio::test]
async fn test_transport_error_stops_the_pump() {
    let (store, feed) = StubStore::with_feed();
    let view = shared_view();
    let (sink, mut applied) = sink_channel();
    let mut listener = ChangeStreamListener::new();
    listener
        .start(&store, "alice", Arc::clone(&view), Some(sink))
        .await
        .unwrap();

    feed.send(Err(SubscriptionError::Transport(
        "connection reset".to_string(),
    )))
    .await
    .unwrap();
    wait_for_state(&listener, SubscriptionState::Error).await;

    // The pump has dropped its end of the feed; nothing can be applied now
    for _ in 0..400 {
        if feed.is_closed() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(feed.is_closed());
    assert!(applied.try_recv().is_err());
    assert!(view.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_lagged_feed_keeps_going() {
    let (store, feed) = StubStore::with_feed();
    let view = shared_view();
    let (sink, mut applied) = sink_channel();
    let mut listener = ChangeStreamListener::new();
    listener
        .start(&store, "alice", Arc::clone(&view), Some(sink))
        .await
        .unwrap();

    feed.send(Err(SubscriptionError::Lagged(3))).await.unwrap();
    feed.send(Ok(ChangeEvent::Inserted {
        record: bookmark("bm-1", "After lag"),
    }))
    .await
    .unwrap();

    // The insert being applied proves the lag report did not end the pump
    let seen = applied.recv().await.unwrap();
    assert_eq!(seen.record_id(), "bm-1");
    assert_eq!(listener.state(), SubscriptionState::Active);
    assert_eq!(view.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_close_tears_down_and_is_idempotent() {
    let (store, feed) = StubStore::with_feed();
    let mut listener = ChangeStreamListener::new();
    listener
        .start(&store, "alice", shared_view(), None)
        .await
        .unwrap();

    listener.close();
    assert_eq!(listener.state(), SubscriptionState::Closed);

    listener.close();
    assert_eq!(listener.state(), SubscriptionState::Closed);

    // Aborting the pump drops the feed's receiving end
    for _ in 0..400 {
        if feed.is_closed() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(feed.is_closed());
}

#[test]
fn test_close_before_start() {
    let mut listener = ChangeStreamListener::new();
    listener.close();
    assert_eq!(listener.state(), SubscriptionState::Closed);
}
