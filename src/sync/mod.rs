// Live view reconciliation
// A pure reducer applies change events to an owner-scoped list; the listener feeds it from a store subscription.

pub mod listener;
pub mod reducer;
pub mod view;

pub use listener::ChangeStreamListener;
pub use view::BookmarkView;
