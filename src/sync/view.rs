//! Owner-scoped live view of the bookmark list.

use crate::sync::reducer;
use crate::types::bookmark::Bookmark;
use crate::types::event::ChangeEvent;

/// The in-memory bookmark list for one owner, kept newest-first.
///
/// Events for any other owner are dropped before they reach the reducer, so
/// every record in the view belongs to the view's owner.
pub struct BookmarkView {
    owner_id: String,
    records: Vec<Bookmark>,
}

impl BookmarkView {
    /// Creates an empty view scoped to `owner_id`.
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            records: Vec::new(),
        }
    }

    /// Replaces the whole list, typically with an initial fetch result.
    pub fn reset(&mut self, records: Vec<Bookmark>) {
        self.records = records;
    }

    /// Applies a change event through the reducer, if it is for this owner.
    pub fn apply(&mut self, event: &ChangeEvent) {
        if event.owner_id() != self.owner_id {
            return;
        }
        reducer::apply(&mut self.records, event);
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn records(&self) -> &[Bookmark] {
        &self.records
    }

    /// Clones the current list out, for handing across a lock boundary.
    pub fn snapshot(&self) -> Vec<Bookmark> {
        self.records.clone()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
