//! Session lookup — resolves the caller from a bearer token or session cookie.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use chatrelay_core::auth::jwt::verify_session_token;
use chatrelay_core::models::auth::SessionUser;

use crate::error::{AppError, AppResult};

/// Cookie carrying the session token for browser clients.
pub const SESSION_COOKIE: &str = "chatrelay_session";

/// Extract the raw session token: `Authorization: Bearer` first, then the cookie.
fn session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        return Some(token.trim().to_string());
    }

    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
}

/// Resolve the authenticated caller, or fail with `Unauthorized`.
pub fn require_user(headers: &HeaderMap, secret: &[u8]) -> AppResult<SessionUser> {
    let token = session_token(headers)
        .ok_or_else(|| AppError::Unauthorized("You need to sign in to continue.".into()))?;

    verify_session_token(&token, secret).map_err(|e| {
        debug!(error = %e, "rejected session token");
        AppError::Unauthorized("You need to sign in to continue.".into())
    })
}
