//! Session handling.
//!
//! The identity provider issues HS256 session tokens; this module verifies
//! them and turns the claims into a [`SessionUser`](crate::models::auth::SessionUser).

pub mod jwt;

use thiserror::Error;

/// Session errors.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Invalid subject: {0}")]
    InvalidSubject(String),
}
