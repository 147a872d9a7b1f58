//! # chatrelay_core
//!
//! Core domain logic for Chatrelay: chat persistence, session tokens,
//! chat message parsing and the upstream completion client.

pub mod auth;
pub mod chats;
pub mod completion;
pub mod message;
pub mod migrate;
pub mod models;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
