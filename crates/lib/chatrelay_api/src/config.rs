//! API server configuration.

use std::time::Duration;

use thiserror::Error;

use chatrelay_core::auth::jwt::resolve_jwt_secret;
use chatrelay_core::completion::CompletionSettings;

use crate::services::delivery::DeliveryMode;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3100";
const DEFAULT_COMPLETION_ENDPOINT: &str = "https://api.x.ai/v1/chat/completions";
const DEFAULT_COMPLETION_MODEL: &str = "grok-1";
const DEFAULT_COMPLETION_TIMEOUT_SECS: u64 = 60;
const DEFAULT_CHUNK_INTERVAL_MS: u64 = 50;

/// Configuration errors, reported once at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3100").
    pub bind_addr: String,
    /// Session token signing secret.
    pub jwt_secret: String,
    /// Upstream completion provider.
    pub completion: CompletionSettings,
    /// How answers are handed back to the browser.
    pub delivery: DeliveryMode,
}

impl ApiConfig {
    /// Reads configuration from environment variables.
    ///
    /// | Variable                   | Default                                  |
    /// |----------------------------|------------------------------------------|
    /// | `BIND_ADDR`                | `127.0.0.1:3100`                         |
    /// | `JWT_SECRET` / `AUTH_SECRET` | generated & persisted to file          |
    /// | `XAI_API_KEY`              | required                                 |
    /// | `COMPLETION_ENDPOINT`      | `https://api.x.ai/v1/chat/completions`   |
    /// | `COMPLETION_MODEL`         | `grok-1`                                 |
    /// | `COMPLETION_COLLECTION_ID` | required                                 |
    /// | `COMPLETION_TIMEOUT_SECS`  | `60`                                     |
    /// | `CHAT_DELIVERY`            | `direct` (or `chunked`)                  |
    /// | `CHAT_CHUNK_INTERVAL_MS`   | `50`                                     |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::build(|name| std::env::var(name).ok(), || Ok(resolve_jwt_secret()))
    }

    /// Builds and validates a configuration from an arbitrary variable source.
    ///
    /// Unlike [`ApiConfig::from_env`], a secret is never generated here:
    /// `JWT_SECRET` (or `AUTH_SECRET`) must be present in the source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::build(lookup, || Err(ConfigError::Missing("JWT_SECRET")))
    }

    /// The fallback secret is only consulted once everything else is valid.
    fn build<F, S>(lookup: F, fallback_secret: S) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
        S: FnOnce() -> Result<String, ConfigError>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let completion = CompletionSettings {
            endpoint: var("COMPLETION_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_COMPLETION_ENDPOINT.into()),
            api_key: var("XAI_API_KEY").ok_or(ConfigError::Missing("XAI_API_KEY"))?,
            model: var("COMPLETION_MODEL").unwrap_or_else(|| DEFAULT_COMPLETION_MODEL.into()),
            collection_id: var("COMPLETION_COLLECTION_ID")
                .ok_or(ConfigError::Missing("COMPLETION_COLLECTION_ID"))?,
            timeout: Duration::from_secs(parse_u64(
                "COMPLETION_TIMEOUT_SECS",
                var("COMPLETION_TIMEOUT_SECS"),
                DEFAULT_COMPLETION_TIMEOUT_SECS,
            )?),
        };

        let interval = Duration::from_millis(parse_u64(
            "CHAT_CHUNK_INTERVAL_MS",
            var("CHAT_CHUNK_INTERVAL_MS"),
            DEFAULT_CHUNK_INTERVAL_MS,
        )?);
        let delivery = match var("CHAT_DELIVERY").as_deref() {
            None => DeliveryMode::Direct,
            Some(mode) => DeliveryMode::parse(mode, interval).ok_or_else(|| {
                ConfigError::Invalid {
                    name: "CHAT_DELIVERY",
                    reason: format!("expected `direct` or `chunked`, got `{mode}`"),
                }
            })?,
        };

        let mut config = Self {
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
            jwt_secret: String::new(),
            completion,
            delivery,
        };
        config.validate()?;

        config.jwt_secret = match var("JWT_SECRET").or_else(|| var("AUTH_SECRET")) {
            Some(secret) => secret,
            None => fallback_secret()?,
        };
        Ok(config)
    }

    /// Checks invariants that hold regardless of where values came from.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint: url::Url =
            self.completion
                .endpoint
                .parse()
                .map_err(|e: url::ParseError| ConfigError::Invalid {
                    name: "COMPLETION_ENDPOINT",
                    reason: e.to_string(),
                })?;

        // Plain HTTP only for local development.
        let host = endpoint.host_str().unwrap_or("");
        let is_safe = endpoint.scheme() == "https"
            || host == "localhost"
            || host == "127.0.0.1"
            || host == "[::1]";
        if !is_safe {
            return Err(ConfigError::Invalid {
                name: "COMPLETION_ENDPOINT",
                reason: "must use HTTPS or localhost".into(),
            });
        }

        if self.completion.api_key.trim().is_empty() {
            return Err(ConfigError::Missing("XAI_API_KEY"));
        }
        if self.completion.collection_id.trim().is_empty() {
            return Err(ConfigError::Missing("COMPLETION_COLLECTION_ID"));
        }
        if self.completion.timeout.is_zero() {
            return Err(ConfigError::Invalid {
                name: "COMPLETION_TIMEOUT_SECS",
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

fn parse_u64(name: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    match raw {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            reason: format!("`{v}` is not a non-negative integer"),
        }),
    }
}
