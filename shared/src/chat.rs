//! Chat-completion client for an OpenAI-compatible API.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ChatConfig;
use crate::models::ChatMessage;
use crate::{Error, Result};

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

/// Prepend the system prompt to a caller-supplied conversation.
pub fn with_system_prompt(prompt: &str, messages: Vec<ChatMessage>) -> Vec<ChatMessage> {
    let mut conversation = Vec::with_capacity(messages.len() + 1);
    conversation.push(ChatMessage::system(prompt));
    conversation.extend(messages);
    conversation
}

/// Client for the chat-completion endpoint.
pub struct ChatClient {
    http_client: reqwest::Client,
    config: ChatConfig,
}

impl ChatClient {
    pub fn new(http_client: reqwest::Client, config: ChatConfig) -> Self {
        Self { http_client, config }
    }

    pub fn system_prompt(&self) -> &str {
        &self.config.system_prompt
    }

    /// Send a conversation and return the first choice's reply, trimmed.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let request = CompletionRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!(
                "Chat completion failed ({}): {}",
                status, error_text
            )));
        }

        let completion: CompletionResponse = response.json().await?;
        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::Upstream("Chat completion returned no choices".to_string()))?;

        let reply = choice.message.content.unwrap_or_default().trim().to_string();
        info!("Chat completion returned {} chars", reply.len());

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_goes_first() {
        let conversation = with_system_prompt(
            "be brief",
            vec![ChatMessage::user("hi"), ChatMessage::user("still there?")],
        );

        assert_eq!(conversation.len(), 3);
        assert_eq!(conversation[0], ChatMessage::system("be brief"));
        assert_eq!(conversation[2].content, "still there?");
    }

    #[test]
    fn test_request_omits_unset_temperature() {
        let messages = [ChatMessage::user("hi")];
        let request = CompletionRequest {
            model: "gpt-4",
            messages: &messages,
            temperature: None,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("temperature").is_none());
        assert_eq!(value["messages"][0]["role"], "user");
    }
}
