//! Shared data models.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Tokens issued by a successful secret exchange.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub user_token: String,
    pub api_token: String,
}

/// Body of every JSON error response returned to a browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// One role-tagged chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `system`, `user` or `assistant`
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Chat request payload.
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

/// Chat response payload.
#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub reply: String,
}

/// Warm-up ping response payload.
#[derive(Debug, Serialize)]
pub struct WarmStatus {
    pub status: &'static str,
}

/// Direct-invoke calendar request.
#[derive(Debug, Default, Deserialize)]
pub struct CalendarRequest {
    /// `get`, `add` or `find`
    #[serde(default)]
    pub action: Option<String>,
    /// `October` or `2025-12` style month filter for `get`
    pub month: Option<String>,
    /// Event resource for `add`
    pub event: Option<Map<String, Value>>,
    /// Keyword for `find`
    pub term: Option<String>,
}

/// Result of a successful `find`.
#[derive(Debug, Serialize)]
pub struct FoundEvent {
    pub raw: Value,
    pub formatted: String,
}
