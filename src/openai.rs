//! OpenAI-compatible client configuration.

use crate::config::LlmSettings;
use crate::error::{ClipscoutError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for API requests (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Read the API key named by `llm.api_key_env`.
///
/// A missing or empty key is a configuration error and is never retried.
pub fn api_key(settings: &LlmSettings) -> Result<String> {
    match std::env::var(&settings.api_key_env) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        Ok(_) => Err(ClipscoutError::Config(format!(
            "{} is empty. Set it with: export {}='...'",
            settings.api_key_env, settings.api_key_env
        ))),
        Err(_) => Err(ClipscoutError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            settings.api_key_env, settings.api_key_env
        ))),
    }
}

/// Create a client for the configured endpoint with the default timeout.
pub fn create_client(settings: &LlmSettings) -> Result<Client<OpenAIConfig>> {
    create_client_with_timeout(settings, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
}

/// Create a client for the configured endpoint with a custom timeout.
pub fn create_client_with_timeout(
    settings: &LlmSettings,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let mut config = OpenAIConfig::new().with_api_key(api_key(settings)?);
    if let Some(base) = settings.api_base.as_deref().filter(|b| !b.is_empty()) {
        config = config.with_api_base(base);
    }

    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ClipscoutError::Config(format!("Failed to create HTTP client: {}", e)))?;

    Ok(Client::with_config(config).with_http_client(http_client))
}
