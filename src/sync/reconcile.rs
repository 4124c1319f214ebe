//! Read-state bookkeeping for notifications.
//!
//! The unread count is never stored. It is derived from `is_read` on every
//! call, so it cannot drift from the collection it describes.

use chrono::{DateTime, Utc};

use crate::models::notification::Notification;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadSummary {
    pub total: usize,
    pub unread: usize,
}

impl ReadSummary {
    pub fn of(items: &[Notification]) -> Self {
        Self {
            total: items.len(),
            unread: unread_count(items),
        }
    }
}

pub fn unread_count(items: &[Notification]) -> usize {
    items.iter().filter(|n| !n.is_read).count()
}

/// Flip one notification to read. `Some(true)` if it changed, `Some(false)`
/// if it was already read, `None` if the id is not present.
pub fn mark_read(items: &mut [Notification], id: &str, read_at: DateTime<Utc>) -> Option<bool> {
    let item = items.iter_mut().find(|n| n.id == id)?;
    if item.is_read {
        return Some(false);
    }
    item.is_read = true;
    item.read_at = Some(read_at);
    Some(true)
}

/// Mark every unread item read. Items already read keep their `read_at`.
/// Returns how many changed.
pub fn mark_all_read(items: &mut [Notification], now: DateTime<Utc>) -> usize {
    let mut changed = 0;
    for n in items.iter_mut().filter(|n| !n.is_read) {
        n.is_read = true;
        n.read_at = Some(now);
        changed += 1;
    }
    changed
}
