//! Pure reconciliation of a bookmark list against change events.
//!
//! One code path serves both optimistic local mutations and remote feed
//! events; the caller never needs to know which side an event came from.

use crate::types::bookmark::Bookmark;
use crate::types::event::ChangeEvent;

/// Applies one change event to the list, in place.
///
/// * `Inserted`: prepend. If a record with the same id is already present
///   (an optimistic insert meeting its feed echo, or a redelivered event),
///   the existing entry is replaced in place instead, so duplicates cannot
///   accumulate.
/// * `Deleted`: drop any record with the id; an unknown id is a no-op.
/// * `Updated`: replace the matching record in place; an unknown id is a
///   no-op. No update operation is exposed here, but other writers to the
///   same store produce these.
///
/// Deterministic and IO-free; ordering of untouched records is preserved.
pub fn apply(records: &mut Vec<Bookmark>, event: &ChangeEvent) {
    match event {
        ChangeEvent::Inserted { record } => {
            match records.iter().position(|b| b.id == record.id) {
                Some(pos) => records[pos] = record.clone(),
                None => records.insert(0, record.clone()),
            }
        }
        ChangeEvent::Deleted { id, .. } => {
            records.retain(|b| b.id != *id);
        }
        ChangeEvent::Updated { record } => {
            if let Some(pos) = records.iter().position(|b| b.id == record.id) {
                records[pos] = record.clone();
            }
        }
    }
}
