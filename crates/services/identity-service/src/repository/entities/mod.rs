//! Database entities for the identity store.

pub mod user;
