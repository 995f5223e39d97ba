//! Networking modules for the REST backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! `http` is the authenticated request pipeline, `error` its failure
//! taxonomy, `api` the typed endpoint bindings, `download` binary responses,
//! and `types` the shared wire schema.

pub mod api;
pub mod download;
pub mod error;
pub mod http;
pub mod types;
