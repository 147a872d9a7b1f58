//! Services backing the request handlers.

pub mod delivery;
pub mod session;
