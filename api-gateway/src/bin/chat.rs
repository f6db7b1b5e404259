//! Chat Lambda - Handles /chat and /ping.
//!
//! Forwards the caller's conversation to the chat-completion API with the
//! assistant's system prompt prepended. `/ping` answers immediately so the
//! UI can warm the function without paying for a completion.

use lambda_http::{run, service_fn, Body, Error, Request, Response};
use shared::http::json_response;
use shared::{parse_body, with_system_prompt, ChatClient, ChatConfig, ChatReply, ChatRequest, ErrorBody, WarmStatus};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

async fn handler(client: Arc<ChatClient>, event: Request) -> Result<Response<Body>, Error> {
    let path = event.uri().path();
    info!("Chat request: {} {}", event.method(), path);

    if path.ends_with("/ping") {
        return json_response(200, &WarmStatus { status: "warm" });
    }

    let request: ChatRequest = parse_body!(event.body());
    let messages = with_system_prompt(client.system_prompt(), request.messages);

    match client.complete(&messages).await {
        Ok(reply) => json_response(200, &ChatReply { reply }),
        Err(e) => {
            error!("Chat completion failed: {}", e);
            json_response(500, &ErrorBody::new("Server error"))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let config = ChatConfig::from_env()?;
    info!("Chat model: {}", config.model);
    let client = Arc::new(ChatClient::new(reqwest::Client::new(), config));

    run(service_fn(move |event| {
        let client = Arc::clone(&client);
        async move { handler(client, event).await }
    }))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base_url: String) -> Arc<ChatClient> {
        let config = ChatConfig {
            api_key: "sk-test".to_string(),
            model: "gpt-4".to_string(),
            base_url,
            temperature: None,
            system_prompt: "be brief".to_string(),
        };
        Arc::new(ChatClient::new(reqwest::Client::new(), config))
    }

    fn request(uri: &str, body: Body) -> Request {
        lambda_http::http::Request::builder()
            .method("POST")
            .uri(uri)
            .body(body)
            .unwrap()
    }

    fn body_json(response: &Response<Body>) -> serde_json::Value {
        serde_json::from_slice(response.body().as_ref()).unwrap()
    }

    #[tokio::test]
    async fn test_ping_skips_upstream() {
        // nothing listens here; a completion call would fail
        let response = handler(
            client("http://127.0.0.1:9".to_string()),
            request("https://api.example.com/default/ping", Body::Empty),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(body_json(&response), serde_json::json!({ "status": "warm" }));
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn test_invalid_body_is_400() {
        let response = handler(
            client("http://127.0.0.1:9".to_string()),
            request("https://api.example.com/chat", Body::from("{not json")),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), 400);
        assert!(body_json(&response)["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid request body"));
    }

    #[tokio::test]
    async fn test_reply_is_returned() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": "Hello! 👋" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = handler(
            client(server.uri()),
            request(
                "https://api.example.com/chat",
                Body::from(r#"{"messages":[{"role":"user","content":"hi"}]}"#),
            ),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(body_json(&response), serde_json::json!({ "reply": "Hello! 👋" }));
    }

    #[tokio::test]
    async fn test_upstream_failure_hides_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Incorrect API key provided: sk-test"))
            .mount(&server)
            .await;

        let response = handler(client(server.uri()), request("https://api.example.com/chat", Body::Empty))
            .await
            .unwrap();

        assert_eq!(response.status(), 500);
        assert_eq!(body_json(&response), serde_json::json!({ "error": "Server error" }));
    }
}
