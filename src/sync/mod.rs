//! Local mirrors of remote collections and the pollers that refresh them.
//!
//! The server owns every entity. A `SyncedCollection` is a cached copy that
//! gets replaced wholesale on each successful fetch and patched in place
//! after each successful mutation.

pub mod collection;
pub mod employees;
pub mod mirror;
pub mod notifications;
pub mod objectives;
pub mod poller;
pub mod reconcile;
pub mod tasks;

use async_trait::async_trait;

use crate::errors::ApiError;
use crate::models::Keyed;

pub use collection::{ApplyOutcome, FetchTicket, SyncedCollection};
pub use employees::EmployeeDirectory;
pub use mirror::Mirror;
pub use notifications::NotificationCenter;
pub use objectives::ObjectiveBoard;
pub use poller::{Poller, PollerHandle};
pub use tasks::TaskBoard;

/// How a poll response interacts with local writes made while it was in
/// flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Consistency {
    /// The last response to complete wins, even over a newer local write.
    #[default]
    LastWriteWins,
    /// A response fetched before the latest local write is discarded.
    Versioned,
}

impl std::str::FromStr for Consistency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "last-write-wins" | "lww" => Ok(Consistency::LastWriteWins),
            "versioned" => Ok(Consistency::Versioned),
            other => Err(format!(
                "invalid consistency '{}': expected last-write-wins or versioned",
                other
            )),
        }
    }
}

/// A remote collection that can be fetched in full.
#[async_trait]
pub trait Resource: Send + Sync + 'static {
    type Item: Keyed + Clone + Send + Sync + 'static;

    /// Used as the `resource` field in logs.
    const NAME: &'static str;

    async fn fetch_all(&self) -> Result<Vec<Self::Item>, ApiError>;
}

/// Anything a `Poller` can drive.
#[async_trait]
pub trait Refresh: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fetch and apply one snapshot. Returns the number of items applied,
    /// or `None` if the snapshot was discarded.
    async fn refresh(&self) -> Result<Option<usize>, ApiError>;

    /// Drop local state after the session ends.
    async fn reset(&self);
}
