use std::sync::Arc;

use tokio::sync::RwLock;

use super::Consistency;
use crate::models::Keyed;

/// Issued when a fetch starts. Carries the epoch and sequence the response
/// is checked against when it lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    epoch: u64,
    seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied(usize),
    /// The collection was cleared after the fetch started.
    StaleSession,
    /// A local write landed after the fetch started (versioned mode only).
    Superseded,
}

impl ApplyOutcome {
    pub fn applied(self) -> Option<usize> {
        match self {
            ApplyOutcome::Applied(n) => Some(n),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct State<T> {
    items: Vec<T>,
    epoch: u64,
    seq: u64,
    last_local_write: u64,
}

/// Shared, cheaply-cloneable local copy of one remote collection.
#[derive(Debug)]
pub struct SyncedCollection<T> {
    state: Arc<RwLock<State<T>>>,
    consistency: Consistency,
}

impl<T> Clone for SyncedCollection<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            consistency: self.consistency,
        }
    }
}

impl<T: Keyed + Clone> SyncedCollection<T> {
    pub fn new(consistency: Consistency) -> Self {
        Self {
            state: Arc::new(RwLock::new(State {
                items: Vec::new(),
                epoch: 0,
                seq: 0,
                last_local_write: 0,
            })),
            consistency,
        }
    }

    pub async fn begin_fetch(&self) -> FetchTicket {
        let mut state = self.state.write().await;
        state.seq += 1;
        FetchTicket {
            epoch: state.epoch,
            seq: state.seq,
        }
    }

    /// Replace the whole collection with a fetched snapshot, unless the
    /// ticket is stale.
    pub async fn apply_snapshot(&self, ticket: FetchTicket, items: Vec<T>) -> ApplyOutcome {
        let mut state = self.state.write().await;
        if ticket.epoch != state.epoch {
            return ApplyOutcome::StaleSession;
        }
        if self.consistency == Consistency::Versioned && ticket.seq < state.last_local_write {
            return ApplyOutcome::Superseded;
        }
        let n = items.len();
        state.items = items;
        ApplyOutcome::Applied(n)
    }

    /// Patch the local copy after a mutation the server accepted.
    pub async fn mutate<R>(&self, f: impl FnOnce(&mut Vec<T>) -> R) -> R {
        let mut state = self.state.write().await;
        state.seq += 1;
        state.last_local_write = state.seq;
        f(&mut state.items)
    }

    /// Empty the collection and invalidate every outstanding ticket.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.items.clear();
        state.epoch += 1;
    }

    pub async fn items(&self) -> Vec<T> {
        self.state.read().await.items.clone()
    }

    pub async fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.state.read().await.items)
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.items.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.items.is_empty()
    }

    pub async fn get(&self, key: &str) -> Option<T> {
        self.with(|items| items.iter().find(|i| i.key() == key).cloned())
            .await
    }

    /// Replace the item with the same key, or append it.
    pub async fn upsert(&self, item: T) {
        self.mutate(|items| match items.iter_mut().find(|i| i.key() == item.key()) {
            Some(slot) => *slot = item,
            None => items.push(item),
        })
        .await
    }

    /// Returns the removed item, if it was present.
    pub async fn remove(&self, key: &str) -> Option<T> {
        self.mutate(|items| {
            items
                .iter()
                .position(|i| i.key() == key)
                .map(|idx| items.remove(idx))
        })
        .await
    }
}
