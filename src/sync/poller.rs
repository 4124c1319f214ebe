//! Background job that keeps one collection fresh while a session is live.
//!
//! Two states. Signed out: park on the session channel, no requests.
//! Signed in: fetch immediately, then every `interval`. Any session change
//! ends the signed-in loop, which drops the timer and resets the target.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use super::Refresh;
use crate::errors::ApiError;
use crate::session::{AuthState, Session};

pub struct Poller;

impl Poller {
    /// Spawn the polling task. Dropping the handle stops it.
    pub fn spawn(target: Arc<dyn Refresh>, session: &Session, interval: Duration) -> PollerHandle {
        let auth = session.subscribe();
        let task = tokio::spawn(run(target, auth, interval));
        PollerHandle { task: Some(task) }
    }
}

pub struct PollerHandle {
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Stop polling. In-flight requests are abandoned; a later call is a no-op.
    pub fn shutdown(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn signed_in(auth: &mut watch::Receiver<AuthState>) -> bool {
    auth.borrow_and_update().is_signed_in()
}

async fn run(target: Arc<dyn Refresh>, mut auth: watch::Receiver<AuthState>, every: Duration) {
    let name = target.name();
    loop {
        while !signed_in(&mut auth) {
            if auth.changed().await.is_err() {
                return;
            }
        }

        tracing::debug!(resource = name, interval_secs = every.as_secs(), "polling started");
        let mut ticker = time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let session_alive = loop {
            tokio::select! {
                _ = ticker.tick() => poll_once(target.as_ref()).await,
                changed = auth.changed() => break changed.is_ok(),
            }
        };

        drop(ticker);
        target.reset().await;
        tracing::debug!(resource = name, "polling stopped");

        if !session_alive {
            return;
        }
    }
}

async fn poll_once(target: &dyn Refresh) {
    match target.refresh().await {
        Ok(Some(count)) => tracing::trace!(resource = target.name(), count, "poll applied"),
        Ok(None) => {}
        // Expected after sign-out or token expiry.
        Err(ApiError::Unauthenticated) => {
            tracing::debug!(resource = target.name(), "poll skipped: not authenticated")
        }
        Err(e) => tracing::warn!(resource = target.name(), error = %e, "poll failed"),
    }
}
