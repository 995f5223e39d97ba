//! Route table, navigation guard, and router.
//!
//! SYSTEM CONTEXT
//! ==============
//! `table` is the static route configuration, `guard` the pure decision run
//! before each navigation, and `router` the stateful piece that applies
//! decisions and remembers the current route. The HTTP pipeline reaches the
//! router only through [`Redirect`].

pub mod guard;
pub mod router;
pub mod table;

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Navigation hook the HTTP pipeline calls after a session expires.
pub trait Redirect: Send + Sync {
    fn redirect_to_login(&self);
}
