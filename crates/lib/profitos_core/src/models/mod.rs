//! Domain models shared across the core.

pub mod auth;
