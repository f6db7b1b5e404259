//! Token Lambda - Handles /token.
//!
//! Exchanges the shared secret word for the UI and API tokens and answers
//! CORS preflight requests. Receives the raw API Gateway proxy event so both
//! REST and HTTP API method fields can be inspected.

use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::Value;
use shared::{token_gate, ApiGatewayRequest, ApiGatewayResponse, TokenGateConfig};
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::EnvFilter;

async fn handler(
    config: Arc<TokenGateConfig>,
    event: LambdaEvent<Value>,
) -> Result<ApiGatewayResponse, Error> {
    let (payload, _context) = event.into_parts();

    let request = ApiGatewayRequest::from_event(&payload);
    Ok(token_gate::handle(&config, &request))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let config = TokenGateConfig::from_env().map_err(|e| {
        error!("Refusing to start: {}", e);
        e
    })?;
    let config = Arc::new(config);

    run(service_fn(move |event| {
        let config = Arc::clone(&config);
        async move { handler(config, event).await }
    }))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use lambda_runtime::Context;
    use serde_json::json;

    fn config() -> Arc<TokenGateConfig> {
        Arc::new(TokenGateConfig {
            secret_word: "correct-word".to_string(),
            ui_token: "ui".to_string(),
            api_token: "api".to_string(),
        })
    }

    async fn invoke(payload: Value) -> ApiGatewayResponse {
        handler(config(), LambdaEvent::new(payload, Context::default()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_http_api_event() {
        let response = invoke(json!({
            "version": "2.0",
            "routeKey": "POST /token",
            "rawPath": "/token",
            "headers": { "origin": "http://localhost:5173", "content-type": "application/json" },
            "requestContext": { "http": { "method": "POST", "path": "/token" } },
            "body": "{\"secretWord\":\"correct-word\"}",
            "isBase64Encoded": false
        }))
        .await;

        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, r#"{"userToken":"ui","apiToken":"api"}"#);
        assert_eq!(
            response.headers["Access-Control-Allow-Origin"],
            "http://localhost:5173"
        );
    }

    #[tokio::test]
    async fn test_rest_preflight_event() {
        let response = invoke(json!({
            "resource": "/token",
            "httpMethod": "OPTIONS",
            "headers": { "Origin": "https://evil.example" },
            "body": null
        }))
        .await;

        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, "OK");
        assert_eq!(
            response.headers["Access-Control-Allow-Origin"],
            "https://gpt-assistant.darrenfawcett.com"
        );
    }

    #[tokio::test]
    async fn test_preflight_with_object_body() {
        let response = invoke(json!({
            "httpMethod": "OPTIONS",
            "headers": { "origin": "http://localhost:5173" },
            "body": { "x": 1 }
        }))
        .await;

        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, "OK");
        assert_eq!(
            response.headers["Access-Control-Allow-Origin"],
            "http://localhost:5173"
        );
    }

    #[tokio::test]
    async fn test_object_body_is_server_error_for_caller_origin() {
        let response = invoke(json!({
            "requestContext": { "http": { "method": "POST" } },
            "headers": { "origin": "http://localhost:5173" },
            "body": { "secretWord": "correct-word" }
        }))
        .await;

        assert_eq!(response.status_code, 500);
        assert_eq!(response.body, r#"{"error":"Server error"}"#);
        assert_eq!(
            response.headers["Access-Control-Allow-Origin"],
            "http://localhost:5173"
        );
    }
}
