use std::future::Future;

use async_trait::async_trait;

use super::{ApplyOutcome, Consistency, Refresh, Resource, SyncedCollection};
use crate::errors::ApiError;
use crate::session::Session;

/// Local copy of one remote collection plus the logic to refresh it.
pub struct Mirror<R: Resource> {
    source: R,
    session: Session,
    items: SyncedCollection<R::Item>,
}

impl<R: Resource> Mirror<R> {
    pub fn new(source: R, session: Session, consistency: Consistency) -> Self {
        Self {
            source,
            session,
            items: SyncedCollection::new(consistency),
        }
    }

    pub fn source(&self) -> &R {
        &self.source
    }

    pub fn items(&self) -> &SyncedCollection<R::Item> {
        &self.items
    }

    /// Fetch the full collection and replace the local copy.
    ///
    /// Signed out: clears and fails without a request. Session-fatal
    /// errors clear local state; any other error leaves it untouched.
    pub async fn refresh(&self) -> Result<ApplyOutcome, ApiError> {
        if !self.session.is_authenticated() {
            self.items.clear().await;
            return Err(ApiError::Unauthenticated);
        }

        let ticket = self.items.begin_fetch().await;
        let fresh = self.remote(self.source.fetch_all()).await?;
        let outcome = self.items.apply_snapshot(ticket, fresh).await;
        match outcome {
            ApplyOutcome::Applied(count) => tracing::debug!(resource = R::NAME, count, "snapshot applied"),
            ApplyOutcome::StaleSession => {
                tracing::debug!(resource = R::NAME, "discarded response from an ended session")
            }
            ApplyOutcome::Superseded => {
                tracing::debug!(resource = R::NAME, "discarded response older than a local write")
            }
        }
        Ok(outcome)
    }

    /// Await a remote call made on behalf of this collection. A session-fatal
    /// failure clears the local copy before the error is returned.
    pub async fn remote<T, F>(&self, call: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        match call.await {
            Err(e) if e.is_session_fatal() => {
                tracing::debug!(resource = R::NAME, "session ended; clearing local copy");
                self.items.clear().await;
                Err(e)
            }
            other => other,
        }
    }
}

#[async_trait]
impl<R: Resource> Refresh for Mirror<R> {
    fn name(&self) -> &'static str {
        R::NAME
    }

    async fn refresh(&self) -> Result<Option<usize>, ApiError> {
        Mirror::refresh(self).await.map(ApplyOutcome::applied)
    }

    async fn reset(&self) {
        self.items.clear().await;
    }
}
