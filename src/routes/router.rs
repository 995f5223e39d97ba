//! Stateful router: resolves paths, runs the guard, tracks the current route.
//!
//! Guard redirects are navigations of their own and pass through the guard
//! again, up to [`MAX_REDIRECTS`] hops. Failures are logged where they occur
//! and returned; nothing is retried.

#[cfg(test)]
#[path = "router_test.rs"]
mod router_test;

use std::sync::{Arc, PoisonError, RwLock};

use crate::state::session::SessionStore;

use super::guard::{self, GuardDecision};
use super::table::{self, ROUTES, RouteMatch, RouteRecord};
use super::{LOGIN_PATH, Redirect};

pub const MAX_REDIRECTS: usize = 8;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NavigationError {
    /// No route matches the path.
    #[error("no route matches {0}")]
    NotFound(String),

    /// Redirects did not settle on an allowed route.
    #[error("navigation to {path} exceeded {} redirects", MAX_REDIRECTS)]
    RedirectLoop { path: String },
}

/// Result of a completed navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    /// Normalized path the caller asked for.
    pub requested: String,
    /// Route that was actually entered.
    pub route: RouteMatch,
}

impl Navigation {
    /// `true` when a static or guard redirect moved the navigation elsewhere.
    #[must_use]
    pub fn redirected(&self) -> bool {
        self.requested != self.route.path
    }
}

pub struct Router {
    routes: &'static [RouteRecord],
    session: Arc<SessionStore>,
    current: RwLock<Option<RouteMatch>>,
}

impl Router {
    /// Router over the application route table.
    #[must_use]
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self::with_routes(ROUTES, session)
    }

    #[must_use]
    pub fn with_routes(routes: &'static [RouteRecord], session: Arc<SessionStore>) -> Self {
        Self { routes, session, current: RwLock::new(None) }
    }

    /// Route entered by the last successful navigation.
    #[must_use]
    pub fn current(&self) -> Option<RouteMatch> {
        self.current.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    #[must_use]
    pub fn current_path(&self) -> Option<String> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|r| r.path.clone())
    }

    /// Navigate to `path`, applying static redirects and the guard.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError`] if the path (or a redirect target) matches
    /// no route, or if redirects do not settle.
    pub fn navigate(&self, path: &str) -> Result<Navigation, NavigationError> {
        let requested = table::normalize(path);
        let from = self.current_path();
        let mut target = requested.clone();

        for _ in 0..MAX_REDIRECTS {
            let Some(route) = table::resolve(self.routes, &target) else {
                tracing::error!(path = %target, from = from.as_deref(), "navigation failed: no matching route");
                return Err(NavigationError::NotFound(target));
            };
            if let Some(redirect) = route.redirect() {
                tracing::debug!(from = %route.path, to = redirect, "static redirect");
                target = table::normalize(redirect);
                continue;
            }

            let session = self.session.snapshot();
            match guard::evaluate(&route, &session) {
                GuardDecision::Allow => {
                    tracing::debug!(path = %route.path, from = from.as_deref(), "navigated");
                    *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(route.clone());
                    return Ok(Navigation { requested, route });
                }
                GuardDecision::Redirect { to, reason } => {
                    tracing::info!(path = %route.path, to, ?reason, "navigation redirected by guard");
                    target = to.to_owned();
                }
            }
        }

        tracing::error!(path = %requested, "navigation failed: redirect loop");
        Err(NavigationError::RedirectLoop { path: requested })
    }
}

impl Redirect for Router {
    fn redirect_to_login(&self) {
        if let Err(error) = self.navigate(LOGIN_PATH) {
            tracing::error!(%error, "login redirect failed");
        }
    }
}
