//! Configuration management for Lambda functions.
//!
//! Every handler reads its configuration once at cold start. The `from_lookup`
//! constructors take the variable source as a closure so tests can inject
//! values without touching the process environment.

use std::env;
use std::fmt;

use crate::{Error, Result};

/// Default persona injected ahead of every chat conversation.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are kAI, a personal assistant designed by Darren Fawcett. \
including adding calendar events, summarizing thoughts, and giving reminders - all while keeping \
things light-hearted and human. Speak clearly. Be brief. Inject clever humor where appropriate. \
Use emoji sparingly but effectively. Prioritize clarity and calmness. When writing calendar events, \
keep them useful but with a friendly tone. If a user asks you to remember something, summarize it \
smartly and save it.";

fn env_lookup(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(Error::Config(format!("{} not set", key))),
    }
}

fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|value| !value.is_empty())
}

/// Secrets backing the token exchange.
#[derive(Clone)]
pub struct TokenGateConfig {
    /// Value the client must submit
    pub secret_word: String,
    /// Token handed to the UI
    pub ui_token: String,
    /// Token handed out for backend API calls
    pub api_token: String,
}

impl TokenGateConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            secret_word: required(&lookup, "SECRET_WORD")?,
            ui_token: required(&lookup, "UI_TOKEN")?,
            api_token: required(&lookup, "API_TOKEN")?,
        })
    }
}

// Keep secrets out of logs.
impl fmt::Debug for TokenGateConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGateConfig")
            .field("secret_word", &"<redacted>")
            .field("ui_token", &"<redacted>")
            .field("api_token", &"<redacted>")
            .finish()
    }
}

/// Chat-completion proxy configuration.
#[derive(Clone)]
pub struct ChatConfig {
    /// Bearer key for the completion API
    pub api_key: String,
    /// Model name sent with every request
    pub model: String,
    /// API root, e.g. `https://api.openai.com/v1`
    pub base_url: String,
    /// Sampling temperature (API default when unset)
    pub temperature: Option<f32>,
    /// System-role message prepended to every conversation
    pub system_prompt: String,
}

impl ChatConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let temperature = optional(&lookup, "OPENAI_TEMPERATURE")
            .map(|raw| {
                raw.parse::<f32>()
                    .map_err(|e| Error::Config(format!("OPENAI_TEMPERATURE: {}", e)))
            })
            .transpose()?;

        Ok(Self {
            api_key: required(&lookup, "OPENAI_API_KEY")?,
            model: optional(&lookup, "OPENAI_MODEL").unwrap_or_else(|| "gpt-4".to_string()),
            base_url: optional(&lookup, "OPENAI_BASE_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            temperature,
            system_prompt: optional(&lookup, "ASSISTANT_SYSTEM_PROMPT")
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
        })
    }
}

impl fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .finish()
    }
}

/// Where the calendar's authorized-user credentials live.
#[derive(Debug, Clone, PartialEq)]
pub enum CredentialSource {
    /// Secrets Manager secret holding the credential JSON
    Secret(String),
    /// Local file holding the credential JSON
    File(String),
}

/// Calendar action configuration.
#[derive(Debug, Clone)]
pub struct CalendarConfig {
    pub credentials: CredentialSource,
    /// Calendar to operate on
    pub calendar_id: String,
    /// Calendar v3 API root
    pub api_base_url: String,
    /// OAuth token endpoint used to refresh access tokens
    pub token_url: String,
}

impl CalendarConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credentials = match optional(&lookup, "GOOGLE_TOKEN_SECRET_ARN") {
            Some(arn) => CredentialSource::Secret(arn),
            None => CredentialSource::File(
                optional(&lookup, "GOOGLE_TOKEN_PATH").unwrap_or_else(|| "token.json".to_string()),
            ),
        };

        Ok(Self {
            credentials,
            calendar_id: optional(&lookup, "CALENDAR_ID").unwrap_or_else(|| "primary".to_string()),
            api_base_url: optional(&lookup, "CALENDAR_API_BASE_URL")
                .unwrap_or_else(|| "https://www.googleapis.com/calendar/v3".to_string()),
            token_url: optional(&lookup, "GOOGLE_OAUTH_TOKEN_URL")
                .unwrap_or_else(|| "https://oauth2.googleapis.com/token".to_string()),
        })
    }
}
