//! # coursehub
//!
//! Client core for the course-management application: teachers publish
//! courses, homework and resources; students enroll, submit homework and
//! read their grades.
//!
//! The crate owns the request pipeline (`net`), the persisted session
//! (`state`), and role-keyed navigation (`routes`). Front-ends such as
//! `coursehub-cli` build an [`app::AppContext`] and talk to the backend only
//! through it.

pub mod app;
pub mod config;
pub mod messages;
pub mod net;
pub mod routes;
pub mod state;
pub mod util;
