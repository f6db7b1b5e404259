//! HTTP helpers for Lambda functions.

use std::collections::HashMap;

use base64::Engine;
use lambda_http::{Body, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::Error;

/// Standard API error wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub error: String,
}

impl ApiResponse {
    pub fn error(message: impl Into<String>) -> Self {
        Self { error: message.into() }
    }
}

/// API Gateway proxy request, covering both REST (v1) and HTTP API (v2) shapes.
///
/// Read field by field from the raw event so an oddly typed field never hides
/// the method or origin. Non-string header values are dropped and a
/// non-string body is kept as-is and rejected by [`body_bytes`](Self::body_bytes).
#[derive(Debug, Default, Clone)]
pub struct ApiGatewayRequest {
    /// REST API method
    pub http_method: Option<String>,
    /// HTTP API method (`requestContext.http.method`)
    pub context_method: Option<String>,
    pub headers: Option<HashMap<String, String>>,
    pub body: Option<Value>,
    pub is_base64_encoded: bool,
}

impl ApiGatewayRequest {
    pub fn from_event(event: &Value) -> Self {
        let text_at = |pointer: &str| event.pointer(pointer).and_then(Value::as_str).map(str::to_string);

        let headers = event.get("headers").and_then(Value::as_object).map(|headers| {
            headers
                .iter()
                .filter_map(|(name, value)| value.as_str().map(|value| (name.clone(), value.to_string())))
                .collect()
        });

        Self {
            http_method: text_at("/httpMethod"),
            context_method: text_at("/requestContext/http/method"),
            headers,
            body: event.get("body").cloned(),
            is_base64_encoded: event.get("isBase64Encoded").and_then(Value::as_bool).unwrap_or(false),
        }
    }

    /// Request method, preferring the HTTP API field over the REST one.
    ///
    /// Empty values fall through to the next source; the result is uppercased.
    pub fn method(&self) -> String {
        self.context_method
            .as_deref()
            .filter(|m| !m.is_empty())
            .or_else(|| self.http_method.as_deref().filter(|m| !m.is_empty()))
            .unwrap_or("")
            .to_uppercase()
    }

    /// Raw body bytes, base64-decoded when API Gateway flagged them.
    ///
    /// A missing or `null` body is returned as an empty buffer.
    pub fn body_bytes(&self) -> crate::Result<Vec<u8>> {
        let body = match &self.body {
            None | Some(Value::Null) => "",
            Some(Value::String(body)) => body.as_str(),
            Some(_) => return Err(Error::Validation("request body must be a string".to_string())),
        };

        if self.is_base64_encoded {
            base64::engine::general_purpose::STANDARD
                .decode(body)
                .map_err(|e| Error::Validation(format!("Invalid base64 body: {}", e)))
        } else {
            Ok(body.as_bytes().to_vec())
        }
    }
}

/// API Gateway proxy response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl ApiGatewayResponse {
    pub fn new(status_code: u16, body: &str, content_type: &str) -> Self {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), content_type.to_string());
        Self {
            status_code,
            headers,
            body: body.to_string(),
            is_base64_encoded: false,
        }
    }

    pub fn json<T: Serialize>(status_code: u16, data: &T) -> crate::Result<Self> {
        let body = serde_json::to_string(data)?;
        Ok(Self::new(status_code, &body, "application/json"))
    }

    /// Same as [`ApiGatewayResponse::json`] but indented for human readers.
    pub fn pretty_json<T: Serialize>(status_code: u16, data: &T) -> crate::Result<Self> {
        let body = serde_json::to_string_pretty(data)?;
        Ok(Self::new(status_code, &body, "application/json"))
    }

    /// Replace the header set.
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }
}

/// Create a JSON response with the given status code and data.
pub fn json_response<T: Serialize>(status: u16, data: &T) -> Result<Response<Body>, lambda_http::Error> {
    let response = Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .header("access-control-allow-origin", "*")
        .body(Body::from(serde_json::to_string(data)?))
        .map_err(Box::new)?;
    Ok(response)
}

/// Create an error response with the given status code and message.
pub fn error_response(status: u16, message: impl Into<String>) -> Result<Response<Body>, lambda_http::Error> {
    json_response(status, &ApiResponse::error(message))
}

/// Parse request body as JSON, returning a 400 response on failure.
///
/// An empty body parses as `{}`. Returns `Ok(Ok(T))` on successful parse,
/// `Ok(Err(Response))` on parse error (400), or `Err(lambda_http::Error)` on
/// serialization failure.
pub fn parse_json_body<T: DeserializeOwned>(body: &Body) -> Result<Result<T, Response<Body>>, lambda_http::Error> {
    let bytes: &[u8] = body.as_ref();
    let bytes = if bytes.is_empty() { &b"{}"[..] } else { bytes };

    match serde_json::from_slice(bytes) {
        Ok(parsed) => Ok(Ok(parsed)),
        Err(e) => {
            let response = error_response(400, format!("Invalid request body: {}", e))?;
            Ok(Err(response))
        }
    }
}

/// Macro to parse request body, returning early with 400 on parse error.
///
/// Usage:
/// ```ignore
/// let request: MyRequest = parse_body!(event.body());
/// ```
#[macro_export]
macro_rules! parse_body {
    ($body:expr) => {
        match shared::http::parse_json_body($body)? {
            Ok(parsed) => parsed,
            Err(response) => return Ok(response),
        }
    };
}
