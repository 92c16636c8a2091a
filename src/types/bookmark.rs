use serde::{Deserialize, Serialize};

/// A saved bookmark, as stored by the backend.
///
/// `id` and `created_at` are assigned by the store on insert; callers never
/// pick them. `created_at` is milliseconds since the UNIX epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: String,
    pub owner_id: String,
    pub url: String,
    pub title: String,
    pub created_at: i64,
}
