//! CORS header computation for browser-facing endpoints.
//!
//! Only origins on the allowlist are echoed back. Everything else, including
//! requests without an `Origin` header, is answered with the production
//! origin so an arbitrary caller can never read a credentialed response.

use std::collections::HashMap;

/// Production UI origin, used whenever the caller's origin is not allowed.
pub const FALLBACK_ORIGIN: &str = "https://gpt-assistant.darrenfawcett.com";

/// Origins permitted to receive an echoed `Access-Control-Allow-Origin`.
pub const ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:5173",
    "http://localhost:5174",
    FALLBACK_ORIGIN,
];

pub const ALLOWED_METHODS: &str = "POST,OPTIONS";
pub const ALLOWED_HEADERS: &str = "content-type, authorization, x-access-token";
/// Preflight cache lifetime in seconds
pub const MAX_AGE: &str = "3600";

/// Pick the origin declared by the caller.
///
/// API Gateway may deliver the header as `origin` or `Origin`; the lowercase
/// key wins. Missing or empty values resolve to `*`.
pub fn request_origin(headers: Option<&HashMap<String, String>>) -> &str {
    headers
        .and_then(|h| {
            h.get("origin")
                .filter(|v| !v.is_empty())
                .or_else(|| h.get("Origin").filter(|v| !v.is_empty()))
        })
        .map(String::as_str)
        .unwrap_or("*")
}

/// Origin to place in `Access-Control-Allow-Origin`.
pub fn allowed_origin(origin: &str) -> &str {
    if ALLOWED_ORIGINS.iter().any(|allowed| *allowed == origin) {
        origin
    } else {
        FALLBACK_ORIGIN
    }
}

/// Full header set attached to every token endpoint response.
pub fn cors_headers(origin: &str) -> HashMap<String, String> {
    HashMap::from([
        ("Content-Type".to_string(), "application/json".to_string()),
        (
            "Access-Control-Allow-Origin".to_string(),
            allowed_origin(origin).to_string(),
        ),
        (
            "Access-Control-Allow-Methods".to_string(),
            ALLOWED_METHODS.to_string(),
        ),
        (
            "Access-Control-Allow-Headers".to_string(),
            ALLOWED_HEADERS.to_string(),
        ),
        ("Access-Control-Max-Age".to_string(), MAX_AGE.to_string()),
    ])
}
