//! AWS Secrets Manager integration.

use aws_sdk_secretsmanager::Client as SecretsClient;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::OnceLock;
use tokio::sync::RwLock;

use crate::{Error, Result};

/// Cached secrets with lazy initialization.
static SECRETS_CACHE: OnceLock<RwLock<HashMap<String, String>>> = OnceLock::new();

fn get_cache() -> &'static RwLock<HashMap<String, String>> {
    SECRETS_CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

async fn cached(secret_arn: &str) -> Option<String> {
    get_cache().read().await.get(secret_arn).cloned()
}

async fn remember(secret_arn: &str, value: &str) {
    get_cache()
        .write()
        .await
        .insert(secret_arn.to_string(), value.to_string());
}

/// Build a Secrets Manager client from the default AWS environment.
pub async fn client_from_env() -> SecretsClient {
    let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    SecretsClient::new(&config)
}

/// Get a secret value from Secrets Manager with caching.
pub async fn get_secret(client: &SecretsClient, secret_arn: &str) -> Result<String> {
    if let Some(value) = cached(secret_arn).await {
        return Ok(value);
    }

    let response = client
        .get_secret_value()
        .secret_id(secret_arn)
        .send()
        .await
        .map_err(|e| Error::Aws(format!("Failed to get secret: {}", e)))?;

    let secret_string = response
        .secret_string()
        .ok_or_else(|| Error::Aws("Secret has no string value".to_string()))?
        .to_string();

    remember(secret_arn, &secret_string).await;

    Ok(secret_string)
}

/// Get a JSON secret and deserialize it.
pub async fn get_json_secret<T: DeserializeOwned>(client: &SecretsClient, secret_arn: &str) -> Result<T> {
    let secret_string = get_secret(client, secret_arn).await?;

    serde_json::from_str(&secret_string)
        .map_err(|e| Error::Aws(format!("Failed to parse secret {}: {}", secret_arn, e)))
}

/// Clear the secrets cache (useful for testing or credential rotation).
pub async fn clear_cache() {
    let mut cache = get_cache().write().await;
    cache.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cache_round_trip() {
        let arn = "arn:aws:secretsmanager:eu-west-2:123:secret:calendar-test";
        assert_eq!(cached(arn).await, None);

        remember(arn, r#"{"refresh_token":"r"}"#).await;
        assert_eq!(cached(arn).await.as_deref(), Some(r#"{"refresh_token":"r"}"#));

        clear_cache().await;
        assert_eq!(cached(arn).await, None);
    }
}
