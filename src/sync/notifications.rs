use std::sync::Arc;

use chrono::Utc;

use super::reconcile::{self, ReadSummary};
use super::{ApplyOutcome, Consistency, Mirror, Refresh};
use crate::api::{ApiClient, NotificationsApi};
use crate::errors::ApiError;
use crate::models::notification::Notification;

/// The signed-in user's notification feed with optimistic read-state edits.
///
/// Every mutation goes to the server first. Local state is patched only
/// after the server accepts, so a failure leaves nothing to roll back.
#[derive(Clone)]
pub struct NotificationCenter {
    mirror: Arc<Mirror<NotificationsApi>>,
}

impl NotificationCenter {
    pub fn new(client: &ApiClient, consistency: Consistency) -> Self {
        Self {
            mirror: Arc::new(Mirror::new(
                client.notifications(),
                client.session().clone(),
                consistency,
            )),
        }
    }

    /// Handle for `Poller::spawn`.
    pub fn refresher(&self) -> Arc<dyn Refresh> {
        self.mirror.clone()
    }

    pub async fn refresh(&self) -> Result<ApplyOutcome, ApiError> {
        self.mirror.refresh().await
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.mirror.items().items().await
    }

    pub async fn unread(&self) -> Vec<Notification> {
        self.mirror
            .items()
            .with(|items| items.iter().filter(|n| !n.is_read).cloned().collect())
            .await
    }

    pub async fn unread_count(&self) -> usize {
        self.mirror.items().with(reconcile::unread_count).await
    }

    pub async fn summary(&self) -> ReadSummary {
        self.mirror.items().with(ReadSummary::of).await
    }

    /// Mark one notification read. Marking an already-read item again is a
    /// no-op locally.
    pub async fn mark_as_read(&self, id: &str) -> Result<(), ApiError> {
        let echoed = self.mirror.remote(self.mirror.source().mark_read(id)).await?;
        let read_at = echoed.and_then(|n| n.read_at).unwrap_or_else(Utc::now);

        let changed = self
            .mirror
            .items()
            .mutate(|items| reconcile::mark_read(items, id, read_at))
            .await;
        if changed.is_none() {
            tracing::debug!(id, "marked read on server but not present locally");
        }
        Ok(())
    }

    /// Always asks the server, even when nothing is unread locally: the
    /// local copy may be stale.
    pub async fn mark_all_as_read(&self) -> Result<usize, ApiError> {
        self.mirror.remote(self.mirror.source().mark_all_read()).await?;
        let now = Utc::now();
        Ok(self
            .mirror
            .items()
            .mutate(|items| reconcile::mark_all_read(items, now))
            .await)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.mirror.remote(self.mirror.source().delete(id)).await?;
        self.mirror.items().remove(id).await;
        Ok(())
    }

    /// Drop everything; called on sign-out.
    pub async fn reset(&self) {
        self.mirror.items().clear().await;
    }
}
