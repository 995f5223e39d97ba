//! Pre-navigation guard.
//!
//! The authentication check always runs before the role check, so an
//! anonymous session learns nothing about which roles a route wants.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use crate::state::session::Session;

use super::table::RouteMatch;
use super::{DASHBOARD_PATH, LOGIN_PATH};

/// Why a navigation was diverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    Unauthenticated,
    Unauthorized,
    AlreadyAuthenticated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect { to: &'static str, reason: DenyReason },
}

/// Decide whether `session` may enter `target`.
#[must_use]
pub fn evaluate(target: &RouteMatch, session: &Session) -> GuardDecision {
    if target.requires_auth() && !session.is_authenticated() {
        return GuardDecision::Redirect { to: LOGIN_PATH, reason: DenyReason::Unauthenticated };
    }

    let role = session.role();
    let forbidden = target
        .matched
        .iter()
        .filter_map(|record| record.roles)
        .any(|allowed| !role.is_some_and(|r| allowed.contains(&r)));
    if forbidden {
        return GuardDecision::Redirect { to: DASHBOARD_PATH, reason: DenyReason::Unauthorized };
    }

    if target.path == LOGIN_PATH && session.is_authenticated() {
        return GuardDecision::Redirect { to: DASHBOARD_PATH, reason: DenyReason::AlreadyAuthenticated };
    }

    GuardDecision::Allow
}
