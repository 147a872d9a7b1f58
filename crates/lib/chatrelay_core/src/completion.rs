//! Upstream chat completion client.
//!
//! Sends the user's text to an OpenAI-compatible `/chat/completions`
//! endpoint, grounded on a provider-side document collection, and returns
//! the first choice's content. A single attempt is made per call.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors raised while talking to the completion provider.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Completion client setup failed: {0}")]
    Setup(String),

    #[error("Completion request failed: {0}")]
    Transport(String),

    #[error("Completion provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed completion response: {0}")]
    MalformedResponse(String),
}

/// Produces an answer for a single user prompt.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

/// Connection settings for [`HttpCompletionClient`].
#[derive(Clone)]
pub struct CompletionSettings {
    /// Full URL of the chat completions endpoint.
    pub endpoint: String,
    /// Bearer credential.
    pub api_key: String,
    pub model: String,
    /// Provider-side collection used to ground the answer.
    pub collection_id: String,
    /// Upper bound for the whole upstream exchange.
    pub timeout: Duration,
}

impl fmt::Debug for CompletionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionSettings")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("collection_id", &self.collection_id)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Serialize)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub messages: [CompletionMessage<'a>; 1],
    pub collection_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct CompletionMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: Option<CompletionChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoiceMessage {
    content: Option<String>,
}

/// Read `choices[0].message.content` from a raw provider response.
pub fn parse_answer(body: &[u8]) -> Result<String, CompletionError> {
    let response: CompletionResponse = serde_json::from_slice(body)
        .map_err(|e| CompletionError::MalformedResponse(format!("invalid JSON: {e}")))?;

    response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| CompletionError::MalformedResponse("empty choices array".into()))?
        .message
        .and_then(|m| m.content)
        .ok_or_else(|| CompletionError::MalformedResponse("missing message content".into()))
}

/// [`CompletionClient`] over HTTP with a shared connection pool.
#[derive(Debug, Clone)]
pub struct HttpCompletionClient {
    client: Client,
    settings: CompletionSettings,
}

impl HttpCompletionClient {
    pub fn new(settings: CompletionSettings) -> Result<Self, CompletionError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| CompletionError::Setup(e.to_string()))?;
        Ok(Self { client, settings })
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let request = CompletionRequest {
            model: &self.settings.model,
            messages: [CompletionMessage {
                role: "user",
                content: prompt,
            }],
            collection_id: &self.settings.collection_id,
        };

        debug!(
            model = %self.settings.model,
            prompt_len = prompt.len(),
            "sending completion request"
        );

        let resp = self
            .client
            .post(&self.settings.endpoint)
            .header("Authorization", format!("Bearer {}", self.settings.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;
        parse_answer(&body)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::Json;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;

    use super::*;

    #[test]
    fn parses_first_choice() {
        let body = br#"{"choices":[{"message":{"content":"Hi there"}},{"message":{"content":"no"}}]}"#;
        assert_eq!(parse_answer(body).unwrap(), "Hi there");
    }

    #[test]
    fn empty_choices_is_malformed() {
        assert!(matches!(
            parse_answer(br#"{"choices":[]}"#),
            Err(CompletionError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_answer(br#"{"id":"x"}"#),
            Err(CompletionError::MalformedResponse(_))
        ));
    }

    #[test]
    fn missing_content_is_malformed() {
        assert!(parse_answer(br#"{"choices":[{"message":{}}]}"#).is_err());
        assert!(parse_answer(br#"{"choices":[{"message":{"content":null}}]}"#).is_err());
        assert!(parse_answer(br#"{"choices":[{}]}"#).is_err());
        assert!(parse_answer(b"<html>").is_err());
    }

    #[test]
    fn debug_redacts_api_key() {
        let settings = CompletionSettings {
            endpoint: "http://localhost/v1/chat/completions".into(),
            api_key: "sk-very-secret".into(),
            model: "grok-1".into(),
            collection_id: "collection_1".into(),
            timeout: Duration::from_secs(5),
        };
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("sk-very-secret"));
        assert!(rendered.contains("collection_1"));
    }

    #[derive(Default, Clone)]
    struct Captured {
        auth: Arc<Mutex<Option<String>>>,
        body: Arc<Mutex<Option<serde_json::Value>>>,
    }

    /// Serve a single-route provider stub on an ephemeral port.
    async fn spawn_provider(
        status: StatusCode,
        reply: serde_json::Value,
    ) -> (String, Captured) {
        let captured = Captured::default();
        let app = axum::Router::new()
            .route(
                "/v1/chat/completions",
                post(
                    move |State(c): State<Captured>,
                          headers: HeaderMap,
                          Json(body): Json<serde_json::Value>| {
                        let reply = reply.clone();
                        async move {
                            *c.auth.lock().unwrap() = headers
                                .get("authorization")
                                .and_then(|v| v.to_str().ok())
                                .map(str::to_string);
                            *c.body.lock().unwrap() = Some(body);
                            (status, Json(reply))
                        }
                    },
                ),
            )
            .with_state(captured.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/v1/chat/completions"), captured)
    }

    fn client_for(endpoint: String) -> HttpCompletionClient {
        HttpCompletionClient::new(CompletionSettings {
            endpoint,
            api_key: "test-key".into(),
            model: "grok-1".into(),
            collection_id: "collection_test".into(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn sends_bearer_and_grounded_body() {
        let (endpoint, captured) = spawn_provider(
            StatusCode::OK,
            serde_json::json!({"choices":[{"message":{"role":"assistant","content":"Hi there"}}]}),
        )
        .await;

        let answer = client_for(endpoint).complete("Hello world").await.unwrap();
        assert_eq!(answer, "Hi there");

        assert_eq!(
            captured.auth.lock().unwrap().as_deref(),
            Some("Bearer test-key")
        );
        let body = captured.body.lock().unwrap().clone().unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "model": "grok-1",
                "messages": [{"role": "user", "content": "Hello world"}],
                "collection_id": "collection_test"
            })
        );
    }

    #[tokio::test]
    async fn non_success_status_carries_body() {
        let (endpoint, _) = spawn_provider(
            StatusCode::UNAUTHORIZED,
            serde_json::json!({"error": "bad key"}),
        )
        .await;

        match client_for(endpoint).complete("hi").await {
            Err(CompletionError::Status { status, body }) => {
                assert_eq!(status, 401);
                assert!(body.contains("bad key"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_provider_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = client_for(format!("http://{addr}/v1/chat/completions"))
            .complete("hi")
            .await;
        assert!(matches!(result, Err(CompletionError::Transport(_))));
    }

    #[tokio::test]
    async fn slow_provider_times_out_as_transport_error() {
        let app = axum::Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(serde_json::json!({"choices":[{"message":{"content":"too late"}}]}))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = HttpCompletionClient::new(CompletionSettings {
            endpoint: format!("http://{addr}/v1/chat/completions"),
            api_key: "test-key".into(),
            model: "grok-1".into(),
            collection_id: "collection_test".into(),
            timeout: Duration::from_millis(100),
        })
        .unwrap();

        let started = std::time::Instant::now();
        let result = client.complete("hi").await;
        assert!(matches!(result, Err(CompletionError::Transport(_))));
        assert!(started.elapsed() < Duration::from_secs(3));
    }
}
