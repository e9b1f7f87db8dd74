//! OpenAI-compatible chat completion client for the classify stage.
//!
//! A thin wrapper over `async_openai::Client`: a health check on
//! construction, and an exponential-backoff retry loop around the single API
//! call each classify job makes.

use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ResponseFormat,
};
use async_openai::Client;
use harvestline_core::config::LlmConfig;
use harvestline_core::error::{Error, Result};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Chat-completion client used by the classify worker.
pub struct LlmClient {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
    timeout: Duration,
    retry_attempts: usize,
}

impl LlmClient {
    pub async fn new(config: &LlmConfig) -> Result<Self> {
        info!("initializing LLM client");
        info!("  model: {}", config.model);
        info!("  base url: {}", config.api_base_url);

        let mut openai_config = OpenAIConfig::new().with_api_base(&config.api_base_url);
        openai_config = openai_config.with_api_key(&config.api_key);

        let client = Client::with_config(openai_config)
            .with_http_client(
                reqwest::Client::builder()
                    .timeout(Duration::from_secs(config.timeout_secs))
                    .build()
                    .map_err(|e| Error::llm(format!("failed to build http client: {e}")))?,
            );

        Self::check_health(&client).await;

        Ok(Self {
            client,
            model: config.model.clone(),
            temperature: config.temperature,
            timeout: Duration::from_secs(config.timeout_secs),
            retry_attempts: 3,
        })
    }

    /// Non-blocking health check via `/v1/models`; a failure only warns,
    /// since the classify workers may start before the LLM endpoint is up.
    async fn check_health(client: &Client<OpenAIConfig>) {
        debug!("checking LLM health via /v1/models");
        match client.models().list().await {
            Ok(models) => debug!("LLM health check passed ({} models)", models.data.len()),
            Err(e) => warn!("LLM health check failed: {e} (endpoint may still be starting up)"),
        }
    }

    /// Sends a single-turn chat completion request, retrying transient
    /// failures with the same exponential backoff shape as the embeddings
    /// provider (`10 * 2^(attempt-1)`, capped at 60s).
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let mut attempt = 0usize;

        loop {
            let request = CreateChatCompletionRequestArgs::default()
                .model(&self.model)
                .temperature(self.temperature)
                .response_format(ResponseFormat::JsonObject)
                .messages(vec![ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()
                    .map_err(|e| Error::llm(format!("failed to build chat message: {e}")))?
                    .into()])
                .build()
                .map_err(|e| Error::llm(format!("failed to build chat request: {e}")))?;

            match tokio::time::timeout(self.timeout, self.client.chat().create(request)).await {
                Ok(Ok(response)) => {
                    let content = response
                        .choices
                        .into_iter()
                        .next()
                        .and_then(|choice| choice.message.content)
                        .ok_or_else(|| Error::llm("LLM response had no message content"))?;
                    return Ok(content);
                }
                Ok(Err(e)) if attempt < self.retry_attempts => {
                    attempt += 1;
                    let backoff_secs = (10 * 2u64.pow(attempt as u32 - 1)).min(60);
                    warn!(
                        "classify LLM call failed ({e}), retrying in {backoff_secs}s (attempt {attempt}/{})",
                        self.retry_attempts
                    );
                    tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
                }
                Ok(Err(e)) => {
                    return Err(Error::llm(format!(
                        "LLM request failed after {} attempts: {e}",
                        self.retry_attempts
                    )));
                }
                Err(_) => {
                    return Err(Error::llm(format!(
                        "LLM request timed out after {:?}",
                        self.timeout
                    )));
                }
            }
        }
    }
}
