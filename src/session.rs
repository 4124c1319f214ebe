//! Signed-in state shared by the API client, the boards and the pollers.
//!
//! A `Session` is a cheap handle. Clones share the same credential slot and
//! the same `watch` channel, so every poller observes sign-in and sign-out
//! from whichever component caused it.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::models::auth::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    SignedOut,
    SignedIn,
}

impl AuthState {
    pub fn is_signed_in(self) -> bool {
        self == AuthState::SignedIn
    }
}

/// Bearer token plus the identity it was issued for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub token: String,
    pub user: User,
}

#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

struct Inner {
    credentials: RwLock<Option<Credentials>>,
    state: watch::Sender<AuthState>,
    file: Option<PathBuf>,
}

impl Session {
    /// `file` is where credentials are cached between runs; `None` keeps
    /// them in memory only.
    pub fn new(file: Option<PathBuf>) -> Self {
        let (state, _) = watch::channel(AuthState::SignedOut);
        Self {
            inner: Arc::new(Inner {
                credentials: RwLock::new(None),
                state,
                file,
            }),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(None)
    }

    /// Load credentials cached by a previous run. Returns whether a credential
    /// was found. The caller is expected to validate the token afterwards.
    pub fn load_cached(&self) -> bool {
        let Some(path) = self.inner.file.as_deref() else {
            return false;
        };

        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return false,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not read session file");
                return false;
            }
        };

        match serde_json::from_str::<Credentials>(&raw) {
            Ok(creds) => {
                tracing::debug!(user = %creds.user.email, "restored cached session");
                self.set(Some(creds));
                true
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "discarding corrupt session file");
                remove_file(path);
                false
            }
        }
    }

    /// Store fresh credentials after a successful login and persist them.
    pub fn establish(&self, creds: Credentials) {
        if let Some(path) = self.inner.file.as_deref() {
            if let Err(e) = write_file(path, &creds) {
                tracing::warn!(path = %path.display(), error = %e, "could not persist session");
            }
        }
        tracing::info!(user = %creds.user.email, role = %creds.user.role, "signed in");
        self.set(Some(creds));
    }

    /// Drop the credential, delete the cached copy, and signal sign-out.
    /// Safe to call repeatedly.
    pub fn invalidate(&self) {
        let had = self.credentials().is_some();
        if let Some(path) = self.inner.file.as_deref() {
            remove_file(path);
        }
        self.set(None);
        if had {
            tracing::info!("session cleared");
        }
    }

    pub fn token(&self) -> Option<String> {
        self.read(|c| c.map(|c| c.token.clone()))
    }

    pub fn user(&self) -> Option<User> {
        self.read(|c| c.map(|c| c.user.clone()))
    }

    pub fn credentials(&self) -> Option<Credentials> {
        self.read(|c| c.cloned())
    }

    pub fn is_authenticated(&self) -> bool {
        self.read(|c| c.is_some())
    }

    pub fn state(&self) -> AuthState {
        *self.inner.state.borrow()
    }

    /// Receiver that fires on every sign-in and sign-out.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.state.subscribe()
    }

    fn read<T>(&self, f: impl FnOnce(Option<&Credentials>) -> T) -> T {
        match self.inner.credentials.read() {
            Ok(guard) => f(guard.as_ref()),
            Err(poisoned) => f(poisoned.into_inner().as_ref()),
        }
    }

    fn set(&self, creds: Option<Credentials>) {
        let next = if creds.is_some() {
            AuthState::SignedIn
        } else {
            AuthState::SignedOut
        };
        match self.inner.credentials.write() {
            Ok(mut guard) => *guard = creds,
            Err(poisoned) => *poisoned.into_inner() = creds,
        }

        if next.is_signed_in() {
            // A re-login is a new session even if the state value is unchanged.
            self.inner.state.send_replace(next);
        } else {
            self.inner.state.send_if_modified(|state| {
                let changed = *state != next;
                *state = next;
                changed
            });
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state())
            .field("file", &self.inner.file)
            .finish()
    }
}

fn write_file(path: &Path, creds: &Credentials) -> std::io::Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let body = serde_json::to_vec_pretty(creds)?;
    std::fs::write(path, body)
}

fn remove_file(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "could not remove session file"),
    }
}
