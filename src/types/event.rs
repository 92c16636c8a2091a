use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::bookmark::Bookmark;

/// A single change to the bookmark table, as delivered on the change feed.
///
/// Insert and update events carry the full stored record. Delete events carry
/// only the id plus the owner, so they can still be filtered per owner after
/// the row is gone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeEvent {
    Inserted { record: Bookmark },
    Updated { record: Bookmark },
    Deleted { id: String, owner_id: String },
}

impl ChangeEvent {
    /// Owner of the affected record.
    pub fn owner_id(&self) -> &str {
        match self {
            ChangeEvent::Inserted { record } | ChangeEvent::Updated { record } => {
                &record.owner_id
            }
            ChangeEvent::Deleted { owner_id, .. } => owner_id,
        }
    }

    /// Id of the affected record.
    pub fn record_id(&self) -> &str {
        match self {
            ChangeEvent::Inserted { record } | ChangeEvent::Updated { record } => &record.id,
            ChangeEvent::Deleted { id, .. } => id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ChangeEvent::Inserted { .. } => "inserted",
            ChangeEvent::Updated { .. } => "updated",
            ChangeEvent::Deleted { .. } => "deleted",
        }
    }
}

/// Lifecycle of a change feed subscription.
///
/// A listener moves unsubscribed → subscribing → active, then ends in either
/// `Error` (feed failed) or `Closed` (deliberate teardown or the feed ended).
/// Both ends are terminal; a fresh listener is the only way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Unsubscribed,
    Subscribing,
    Active,
    Error,
    Closed,
}

impl fmt::Display for SubscriptionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubscriptionState::Unsubscribed => "unsubscribed",
            SubscriptionState::Subscribing => "subscribing",
            SubscriptionState::Active => "active",
            SubscriptionState::Error => "error",
            SubscriptionState::Closed => "closed",
        };
        write!(f, "{}", name)
    }
}
