//! Utility helpers shared across the client core.
//!
//! SYSTEM CONTEXT
//! ==============
//! `storage` isolates durable key-value persistence from the session store;
//! `format` holds display helpers used by front-ends.

pub mod format;
pub mod storage;
