//! Application wiring: storage, session, router and HTTP client.
//!
//! SYSTEM CONTEXT
//! ==============
//! The session store is shared by the router (guard reads) and the HTTP
//! client (401 clears). The router doubles as the client's login redirect
//! so an expired session always lands on `/login`.

#[cfg(test)]
#[path = "app_test.rs"]
mod app_test;

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::net::error::ApiError;
use crate::net::http::ApiClient;
use crate::routes::router::Router;
use crate::state::session::SessionStore;
use crate::util::storage::{FileStore, KeyValueStore};

pub struct AppContext {
    session: Arc<SessionStore>,
    router: Arc<Router>,
    api: ApiClient,
}

impl AppContext {
    /// Wire the app against the session file named in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: ClientConfig) -> Result<Self, ApiError> {
        let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(config.session_file.clone()));
        Self::with_storage(config, storage)
    }

    /// Wire the app against an explicit storage backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_storage(config: ClientConfig, storage: Arc<dyn KeyValueStore>) -> Result<Self, ApiError> {
        let session = Arc::new(SessionStore::restore(storage));
        let router = Arc::new(Router::new(session.clone()));
        let api = ApiClient::new(config, session.clone(), router.clone())?;
        tracing::debug!(base_url = %api.config().base_url, authenticated = session.is_authenticated(), "app context ready");
        Ok(Self { session, router, api })
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    #[must_use]
    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }
}
