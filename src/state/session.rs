//! Auth-session state for the current user.
//!
//! DESIGN
//! ======
//! [`Session`] is an enum, so "token without user" cannot be represented.
//! Mutation happens only through [`SessionStore::login`] and
//! [`SessionStore::logout`]; the HTTP pipeline calls `logout` on a 401 and
//! everything else reads.
//!
//! Durable storage is written before memory changes. A failed write leaves
//! both unchanged on login; logout always clears memory and logs a failed
//! storage clear.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;

use crate::net::error::ApiError;
use crate::net::types::{Credentials, Envelope, LoginPayload, Role, User};
use crate::util::storage::{KeyValueStore, StorageError, Write, json_write, load_json};

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

/// Current authentication state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated { token: String, user: User },
}

impl Session {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Authenticated { token, .. } => Some(token),
            Self::Anonymous => None,
        }
    }

    #[must_use]
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated { user, .. } => Some(user),
            Self::Anonymous => None,
        }
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.user().map(|u| u.role)
    }
}

/// Errors produced by [`SessionStore::login`].
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The backend answered with a non-success envelope code.
    #[error("login rejected with code {code}: {}", .message.as_deref().unwrap_or("no message"))]
    Rejected { code: i64, message: Option<String> },

    /// The backend reported success but omitted the token or the user.
    #[error("login response missing token or user")]
    Incomplete,

    /// The login request itself failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The session could not be persisted.
    #[error("session persist failed: {0}")]
    Storage(#[from] StorageError),
}

/// The auth endpoint the store logs in against.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Post credentials and return the raw login envelope.
    async fn authenticate(&self, credentials: &Credentials) -> Result<Envelope<LoginPayload>, ApiError>;
}

pub struct SessionStore {
    state: RwLock<Session>,
    storage: Arc<dyn KeyValueStore>,
    /// Bumped on every login and on every logout that ended a session.
    epoch: AtomicU64,
}

impl SessionStore {
    /// Start logged out without reading storage.
    #[must_use]
    pub fn anonymous(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { state: RwLock::new(Session::Anonymous), storage, epoch: AtomicU64::new(0) }
    }

    /// Rebuild the session persisted in `storage`.
    ///
    /// Never fails: unreadable or incomplete entries fall back to a logged-out
    /// session and the stale keys are removed.
    #[must_use]
    pub fn restore(storage: Arc<dyn KeyValueStore>) -> Self {
        let mut stale = false;
        let token = match storage.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(error) => {
                tracing::warn!(%error, "persisted token unreadable");
                stale = true;
                None
            }
        };
        let user = match load_json::<User>(storage.as_ref(), USER_KEY) {
            Ok(user) => user,
            Err(error) => {
                tracing::warn!(%error, "persisted user unreadable; falling back to empty user");
                stale = true;
                None
            }
        };

        let session = match (token, user) {
            (Some(token), Some(user)) if !stale => {
                tracing::debug!(username = %user.username, role = %user.role, "restored session");
                Session::Authenticated { token, user }
            }
            (None, None) if !stale => Session::Anonymous,
            (token, user) => {
                tracing::warn!(has_token = token.is_some(), has_user = user.is_some(), "discarding incomplete session");
                if let Err(error) = storage.write_batch(clear_batch()) {
                    tracing::error!(%error, "failed to clear stale session keys");
                }
                Session::Anonymous
            }
        };
        Self { state: RwLock::new(session), storage, epoch: AtomicU64::new(0) }
    }

    /// Authenticate against `backend` and, on success, persist and adopt the
    /// new session.
    ///
    /// Success requires the envelope code 200 with both a token and a user.
    /// Every other outcome leaves memory and storage untouched, including an
    /// HTTP 401 from the login endpoint, which `ApiClient` reports as
    /// [`ApiError::RequestFailed`] without ending the current session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] describing why the login did not take effect.
    pub async fn login(&self, backend: &dyn AuthBackend, credentials: &Credentials) -> Result<User, SessionError> {
        let envelope = backend.authenticate(credentials).await.map_err(|error| {
            tracing::warn!(username = %credentials.username, %error, "login request failed");
            SessionError::Api(error)
        })?;

        if !envelope.is_ok() {
            tracing::warn!(username = %credentials.username, code = envelope.code, "login rejected");
            return Err(SessionError::Rejected { code: envelope.code, message: envelope.message });
        }
        let Some(LoginPayload { token: Some(token), user: Some(user) }) = envelope.data else {
            tracing::warn!(username = %credentials.username, "login response incomplete");
            return Err(SessionError::Incomplete);
        };
        if token.is_empty() {
            tracing::warn!(username = %credentials.username, "login response carried an empty token");
            return Err(SessionError::Incomplete);
        }

        let batch = vec![Write::Set(TOKEN_KEY.to_owned(), token.clone()), json_write(USER_KEY, &user)?];
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        self.storage.write_batch(batch)?;
        *state = Session::Authenticated { token, user: user.clone() };
        self.epoch.fetch_add(1, Ordering::SeqCst);
        drop(state);

        tracing::info!(username = %user.username, role = %user.role, "logged in");
        Ok(user)
    }

    /// Clear the session in memory and storage.
    ///
    /// Idempotent. Returns `true` only for the call that ended an
    /// authenticated session.
    pub fn logout(&self) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let was_authenticated = state.is_authenticated();
        *state = Session::Anonymous;
        if was_authenticated {
            self.epoch.fetch_add(1, Ordering::SeqCst);
        }
        if let Err(error) = self.storage.write_batch(clear_batch()) {
            tracing::error!(%error, "failed to clear persisted session");
        }
        drop(state);

        if was_authenticated {
            tracing::info!("logged out");
        }
        was_authenticated
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.read().is_authenticated()
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.read().role()
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.read().token().map(str::to_owned)
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.read().user().cloned()
    }

    /// Number of session transitions since startup.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Copy of the whole session.
    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.read().clone()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Session> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }
}

fn clear_batch() -> Vec<Write> {
    vec![Write::Remove(TOKEN_KEY.to_owned()), Write::Remove(USER_KEY.to_owned())]
}
