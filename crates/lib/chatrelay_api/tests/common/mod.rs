//! Shared fixtures: in-memory chat store, scripted completion client, router builder.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use chatrelay_api::AppState;
use chatrelay_api::config::ApiConfig;
use chatrelay_api::services::delivery::DeliveryMode;
use chatrelay_core::auth::jwt::{SESSION_TOKEN_EXPIRY_SECS, issue_session_token};
use chatrelay_core::chats::{ChatStore, ChatStoreError};
use chatrelay_core::completion::{CompletionClient, CompletionError, CompletionSettings};
use chatrelay_core::models::chat::Chat;
use tower::ServiceExt;
use uuid::Uuid;

pub const SECRET: &str = "integration-secret";

/// Chat store backed by a map, counting lookups and deletions.
#[derive(Default)]
pub struct MemoryChatStore {
    chats: Mutex<HashMap<Uuid, Chat>>,
    pub lookups: AtomicUsize,
    pub deletions: AtomicUsize,
}

impl MemoryChatStore {
    pub fn insert_for(&self, owner: Uuid) -> Chat {
        let chat = Chat {
            id: Uuid::new_v4(),
            user_id: owner,
            title: "Grounded answers".into(),
            visibility: "private".into(),
            created_at: chrono::Utc::now(),
        };
        self.chats.lock().unwrap().insert(chat.id, chat.clone());
        chat
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.chats.lock().unwrap().contains_key(id)
    }
}

#[async_trait]
impl ChatStore for MemoryChatStore {
    async fn get_chat_by_id(&self, id: &Uuid) -> Result<Option<Chat>, ChatStoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.chats.lock().unwrap().get(id).cloned())
    }

    async fn delete_chat_by_id(&self, id: &Uuid) -> Result<Option<Chat>, ChatStoreError> {
        self.deletions.fetch_add(1, Ordering::SeqCst);
        Ok(self.chats.lock().unwrap().remove(id))
    }
}

/// Canned provider behaviour for [`ScriptedCompletion`].
pub enum Script {
    Answer(&'static str),
    Status(u16, &'static str),
    Malformed,
    Panic,
}

/// Completion client that records prompts and replays a script.
pub struct ScriptedCompletion {
    script: Script,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.script {
            Script::Answer(text) => Ok(text.to_string()),
            Script::Status(status, body) => Err(CompletionError::Status {
                status: *status,
                body: body.to_string(),
            }),
            Script::Malformed => Err(CompletionError::MalformedResponse(
                "empty choices array".into(),
            )),
            Script::Panic => panic!("provider double exploded"),
        }
    }
}

pub fn test_config(delivery: DeliveryMode) -> ApiConfig {
    ApiConfig {
        bind_addr: "127.0.0.1:0".into(),
        jwt_secret: SECRET.into(),
        completion: CompletionSettings {
            endpoint: "http://localhost:9/v1/chat/completions".into(),
            api_key: "test-key".into(),
            model: "grok-1".into(),
            collection_id: "collection_test".into(),
            timeout: Duration::from_secs(5),
        },
        delivery,
    }
}

pub fn app(
    delivery: DeliveryMode,
    chats: Arc<MemoryChatStore>,
    completion: Arc<ScriptedCompletion>,
) -> Router {
    let config = test_config(delivery);
    let state = AppState {
        delivery: config.delivery.build(),
        config,
        chats,
        completion,
    };
    chatrelay_api::router(state)
}

pub fn bearer_for(user_id: Uuid) -> String {
    let token = issue_session_token(
        &user_id,
        "user@example.com",
        SESSION_TOKEN_EXPIRY_SECS,
        SECRET.as_bytes(),
    )
    .expect("issue token");
    format!("Bearer {token}")
}

pub async fn send(app: Router, req: Request<Body>) -> (Response<Body>, Vec<u8>) {
    let resp = app.oneshot(req).await.expect("request");
    let (parts, body) = resp.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("read body")
        .to_vec();
    (Response::from_parts(parts, Body::empty()), bytes)
}

pub fn json(bytes: &[u8]) -> serde_json::Value {
    serde_json::from_slice(bytes).expect("parse JSON")
}
