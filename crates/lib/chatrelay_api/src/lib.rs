//! # chatrelay_api
//!
//! HTTP API library for Chatrelay.

pub mod config;
pub mod error;
pub mod handlers;
pub mod services;

use std::any::Any;
use std::sync::Arc;

use axum::Router;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;

use chatrelay_core::chats::ChatStore;
use chatrelay_core::completion::{CompletionClient, CompletionError, HttpCompletionClient};

use crate::config::ApiConfig;
use crate::error::{AppError, GENERIC_BAD_REQUEST};
use crate::handlers::{chat, health};
use crate::services::delivery::ResponseDelivery;

/// Route paths.
pub mod routes {
    pub const API_CHAT: &str = "/api/chat";
    pub const API_HEALTH: &str = "/api/health";
}

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: ApiConfig,
    /// Chat persistence.
    pub chats: Arc<dyn ChatStore>,
    /// Upstream completion provider.
    pub completion: Arc<dyn CompletionClient>,
    /// Strategy used to return answers.
    pub delivery: Arc<dyn ResponseDelivery>,
}

impl AppState {
    /// Wire the HTTP completion client and delivery strategy from `config`.
    pub fn from_config(
        config: ApiConfig,
        chats: Arc<dyn ChatStore>,
    ) -> Result<Self, CompletionError> {
        let completion = Arc::new(HttpCompletionClient::new(config.completion.clone())?);
        let delivery = config.delivery.build();
        Ok(Self {
            config,
            chats,
            completion,
            delivery,
        })
    }
}

/// Render a handler panic as a generic bad request.
fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = detail, "handler panicked");
    AppError::BadRequest(GENERIC_BAD_REQUEST.into()).into_response()
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin);

    Router::new()
        .route(routes::API_HEALTH, get(health::health_handler))
        .route(
            routes::API_CHAT,
            post(chat::post_chat_handler).delete(chat::delete_chat_handler),
        )
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
