//! Shared library for the GPT assistant Lambda functions.
//!
//! This crate provides common utilities, types, and clients used across all Lambda functions.

pub mod calendar;
pub mod chat;
pub mod config;
pub mod cors;
pub mod error;
pub mod http;
pub mod models;
pub mod secrets;
pub mod token_gate;
pub mod window;

pub use calendar::{format_event_summary, CalendarClient, TokenSource};
pub use chat::{with_system_prompt, ChatClient};
pub use config::{CalendarConfig, ChatConfig, TokenGateConfig};
pub use error::{Error, Result};
pub use http::{ApiGatewayRequest, ApiGatewayResponse, ApiResponse};
pub use models::{CalendarRequest, ChatMessage, ChatReply, ChatRequest, ErrorBody, FoundEvent, TokenResponse, WarmStatus};
pub use window::TimeWindow;
