//! Domain models shared between the core and the HTTP layer.

pub mod auth;
pub mod chat;
