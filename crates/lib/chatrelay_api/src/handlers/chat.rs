//! Chat request handlers.
//!
//! `POST /api/chat` forwards the user's text to the completion provider and
//! hands the answer to the configured delivery strategy. `DELETE /api/chat`
//! removes a chat owned by the caller.

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use chatrelay_core::message::ChatRequest;
use chatrelay_core::models::chat::Chat;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::services::session;

/// `POST /api/chat` — answer one user message.
///
/// The body is validated before the session is checked, and the session
/// before anything leaves the process.
pub async fn post_chat_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> AppResult<Response> {
    let body = body.map_err(|e| {
        debug!(error = %e, "unreadable chat request body");
        AppError::BadRequest(e.body_text())
    })?;
    let request = ChatRequest::from_slice(&body).map_err(|e| {
        debug!(error = %e, "rejected chat request body");
        AppError::BadRequest(e.to_string())
    })?;

    let user = session::require_user(&headers, state.config.jwt_secret.as_bytes())?;

    let prompt = request.message.text();
    info!(
        user_id = %user.id,
        chat_id = ?request.id,
        parts = request.message.parts.len(),
        prompt_len = prompt.len(),
        delivery = state.delivery.name(),
        "chat turn"
    );

    let answer = state.completion.complete(&prompt).await?;

    Ok(state.delivery.deliver(answer))
}

/// Query parameters for `DELETE /api/chat`.
#[derive(Debug, Deserialize)]
pub struct DeleteChatQuery {
    pub id: Option<String>,
}

/// `DELETE /api/chat?id=<chatId>` — delete a chat owned by the caller.
pub async fn delete_chat_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<DeleteChatQuery>, QueryRejection>,
) -> AppResult<Json<Chat>> {
    let Query(params) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let raw_id = params
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing chat id".into()))?;
    let id = Uuid::parse_str(&raw_id)
        .map_err(|_| AppError::BadRequest(format!("Invalid chat id: {raw_id}")))?;

    let user = session::require_user(&headers, state.config.jwt_secret.as_bytes())?;

    let chat = state
        .chats
        .get_chat_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Chat not found".into()))?;

    if !chat.is_owned_by(&user.id) {
        return Err(AppError::Forbidden(
            "This chat belongs to another user.".into(),
        ));
    }

    let deleted = state
        .chats
        .delete_chat_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Chat not found".into()))?;

    info!(user_id = %user.id, chat_id = %deleted.id, "chat deleted");
    Ok(Json(deleted))
}
