//! Session token issuing and verification.

use std::path::PathBuf;

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use tracing::info;
use uuid::Uuid;

use super::SessionError;
use crate::models::auth::{SessionClaims, SessionUser};

/// Default session token lifetime: 1 hour.
pub const SESSION_TOKEN_EXPIRY_SECS: i64 = 60 * 60;

/// Issue a signed HS256 session token for `user_id`.
pub fn issue_session_token(
    user_id: &Uuid,
    email: &str,
    ttl_secs: i64,
    secret: &[u8],
) -> Result<String, SessionError> {
    let now = Utc::now();
    let claims = SessionClaims {
        sub: user_id.to_string(),
        email: email.to_string(),
        exp: (now + Duration::seconds(ttl_secs)).timestamp(),
        iat: now.timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| SessionError::TokenError(format!("jwt encode: {e}")))
}

/// Verify a session token and resolve the user it was issued for.
pub fn verify_session_token(token: &str, secret: &[u8]) -> Result<SessionUser, SessionError> {
    let key = DecodingKey::from_secret(secret);
    let mut validation = Validation::default();
    validation.validate_exp = true;
    let claims = decode::<SessionClaims>(token, &key, &validation)
        .map_err(|e| SessionError::TokenError(e.to_string()))?
        .claims;

    let id = Uuid::parse_str(&claims.sub)
        .map_err(|_| SessionError::InvalidSubject(claims.sub.clone()))?;

    Ok(SessionUser {
        id,
        email: claims.email,
    })
}

/// Resolve the session secret: env var `JWT_SECRET` → `AUTH_SECRET` → persisted file.
pub fn resolve_jwt_secret() -> String {
    if let Ok(secret) = std::env::var("JWT_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    if let Ok(secret) = std::env::var("AUTH_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    let secret_path = jwt_secret_path();
    if let Ok(existing) = std::fs::read_to_string(&secret_path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Some(parent) = secret_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = std::fs::write(&secret_path, &secret);
    info!(path = %secret_path.display(), "generated new session secret");
    secret
}

/// Path to the persisted session secret file.
fn jwt_secret_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("chatrelay")
        .join("jwt-secret")
}
