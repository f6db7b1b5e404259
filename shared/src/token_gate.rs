//! Shared-secret token exchange.
//!
//! A caller submits `{"secretWord": "..."}`; when it matches the configured
//! secret the two pre-provisioned tokens are handed back. Every response,
//! including preflight and failures, carries the CORS header set computed
//! from the caller's origin.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::config::TokenGateConfig;
use crate::cors::{cors_headers, request_origin};
use crate::http::{ApiGatewayRequest, ApiGatewayResponse};
use crate::models::{ErrorBody, TokenResponse};
use crate::{Error, Result};

/// Body returned to a preflight request.
pub const PREFLIGHT_BODY: &str = "OK";
pub const INVALID_SECRET: &str = "Invalid secret";
pub const SERVER_ERROR: &str = "Server error";

/// How a single token request was resolved.
///
/// Only `Preflight` and `Issued` produce caller-visible content. The error
/// variants carry detail that is logged and then replaced by a generic body.
#[derive(Debug)]
pub enum GateOutcome {
    Preflight,
    Issued(TokenResponse),
    InvalidSecret,
    MalformedInput(Error),
    Internal(Error),
}

/// Decide the outcome of a request without rendering it.
pub fn evaluate(config: &TokenGateConfig, request: &ApiGatewayRequest) -> GateOutcome {
    if request.method() == "OPTIONS" {
        return GateOutcome::Preflight;
    }

    match submitted_secret(request) {
        Ok(secret) if secret == config.secret_word => GateOutcome::Issued(TokenResponse {
            user_token: config.ui_token.clone(),
            api_token: config.api_token.clone(),
        }),
        Ok(_) => GateOutcome::InvalidSecret,
        Err(e @ (Error::Validation(_) | Error::Serialization(_))) => GateOutcome::MalformedInput(e),
        Err(e) => GateOutcome::Internal(e),
    }
}

/// Handle one token request end to end.
pub fn handle(config: &TokenGateConfig, request: &ApiGatewayRequest) -> ApiGatewayResponse {
    let origin = request_origin(request.headers.as_ref());
    info!("Token request: {} from origin {}", request.method(), origin);

    respond(evaluate(config, request), origin)
}

/// Render an outcome with the CORS headers for `origin`.
pub fn respond(outcome: GateOutcome, origin: &str) -> ApiGatewayResponse {
    match outcome {
        GateOutcome::Preflight => {
            ApiGatewayResponse::new(200, PREFLIGHT_BODY, "application/json").with_headers(cors_headers(origin))
        }
        GateOutcome::Issued(tokens) => {
            info!("Secret accepted, issuing tokens");
            json_with_cors(200, &tokens, origin)
        }
        GateOutcome::InvalidSecret => {
            warn!("Secret rejected");
            json_with_cors(401, &ErrorBody::new(INVALID_SECRET), origin)
        }
        GateOutcome::MalformedInput(e) => {
            error!("Malformed token request: {}", e);
            server_error(origin)
        }
        GateOutcome::Internal(e) => {
            error!("Token request failed: {}", e);
            server_error(origin)
        }
    }
}

/// Extract `secretWord` from a parsed body.
///
/// Absent and falsy values (`null`, `false`, `0`, `[]`, `{}`) default to the
/// empty string; any other non-string value is malformed input.
pub fn secret_word_from(body: &Value) -> Result<&str> {
    let fields = body
        .as_object()
        .ok_or_else(|| Error::Validation("request body must be a JSON object".to_string()))?;

    match fields.get("secretWord") {
        Some(Value::String(secret)) => Ok(secret.as_str()),
        None => Ok(""),
        Some(value) if is_falsy(value) => Ok(""),
        Some(_) => Err(Error::Validation("secretWord must be a string".to_string())),
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}

fn submitted_secret(request: &ApiGatewayRequest) -> Result<String> {
    let bytes = request.body_bytes()?;
    let body = if bytes.is_empty() {
        Value::Object(Map::new())
    } else {
        serde_json::from_slice(&bytes)?
    };

    Ok(secret_word_from(&body)?.trim().to_string())
}

fn json_with_cors<T: Serialize>(status: u16, data: &T, origin: &str) -> ApiGatewayResponse {
    match ApiGatewayResponse::json(status, data) {
        Ok(response) => response.with_headers(cors_headers(origin)),
        Err(e) => {
            error!("Failed to serialize token response: {}", e);
            server_error(origin)
        }
    }
}

fn server_error(origin: &str) -> ApiGatewayResponse {
    let body = serde_json::json!({ "error": SERVER_ERROR }).to_string();
    ApiGatewayResponse::new(500, &body, "application/json").with_headers(cors_headers(origin))
}
