//! Inbound chat message schema and text extraction.

use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

/// Maximum length of a single text part, in characters.
pub const MAX_TEXT_PART_CHARS: usize = 2000;

/// Rejection reasons for an inbound chat body.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessageError {
    #[error("Malformed request body: {0}")]
    Malformed(String),

    #[error("Message has no parts")]
    EmptyParts,

    #[error("Text part {index} exceeds {MAX_TEXT_PART_CHARS} characters")]
    TextTooLong { index: usize },

    #[error("Unsupported message role: {0}")]
    UnsupportedRole(String),
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Chat the message belongs to, when the client already has one.
    #[serde(default)]
    pub id: Option<Uuid>,
    pub message: ChatMessage,
}

/// The single message submitted by the user.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub role: Option<String>,
    pub parts: Vec<MessagePart>,
}

/// A tagged fragment of a message. Only text is forwarded upstream.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MessagePart {
    Text {
        text: String,
    },
    /// Attachments, tool calls and anything else the UI may send.
    #[serde(other)]
    Other,
}

impl ChatRequest {
    /// Parse and validate a raw request body.
    pub fn from_slice(body: &[u8]) -> Result<Self, MessageError> {
        let request: ChatRequest =
            serde_json::from_slice(body).map_err(|e| MessageError::Malformed(e.to_string()))?;
        request.validate()?;
        Ok(request)
    }

    /// Schema rules beyond what deserialization enforces.
    pub fn validate(&self) -> Result<(), MessageError> {
        if let Some(role) = &self.message.role
            && role != "user"
        {
            return Err(MessageError::UnsupportedRole(role.clone()));
        }

        if self.message.parts.is_empty() {
            return Err(MessageError::EmptyParts);
        }

        for (index, part) in self.message.parts.iter().enumerate() {
            if let MessagePart::Text { text } = part
                && text.chars().count() > MAX_TEXT_PART_CHARS
            {
                return Err(MessageError::TextTooLong { index });
            }
        }

        Ok(())
    }
}

impl ChatMessage {
    /// Concatenate the text parts in order, with no separator.
    ///
    /// Non-text parts are dropped.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                MessagePart::Text { text } => Some(text.as_str()),
                MessagePart::Other => None,
            })
            .collect()
    }
}
