//! Process-wide client state.
//!
//! SYSTEM CONTEXT
//! ==============
//! `session` is owned by the top-level [`crate::app::AppContext`] and shared
//! by reference with the HTTP pipeline and the router.

pub mod session;
