use async_trait::async_trait;
use futures_util::StreamExt;
use log::{error, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::ProviderError;

use super::{RefinementProvider, RefinementRequest};

/// Floor for the pull timeout; pulling a large model takes minutes even on
/// a fast link, independent of the configured request timeout
const PULL_TIMEOUT_FLOOR_SECS: u64 = 600;

/// Ollama client for interacting with the Ollama API
#[derive(Debug)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
    /// Request timeout in seconds
    timeout_secs: u64,
}

/// Generate request for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// System message to guide the model
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

/// Generation options for the Ollama API
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    /// Penalty applied to repeated tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    repeat_penalty: Option<f32>,
    /// Sequences that stop generation
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

/// Generation response from the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Model name
    #[serde(default)]
    pub model: String,
    /// Creation timestamp
    #[serde(default)]
    pub created_at: String,
    /// Generated text
    pub response: String,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
    /// Number of prompt tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u64>,
    /// Number of generated tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,
}

/// Response to `GET /api/tags`
#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

/// One model entry in the tags listing
#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

/// Builder methods for GenerationRequest
impl GenerationRequest {
    /// Create a new generation request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            options: None,
            stream: Some(false),
        }
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options_mut().temperature = Some(temperature);
        self
    }

    /// Set the maximum number of generated tokens
    pub fn num_predict(mut self, num_predict: u32) -> Self {
        self.options_mut().num_predict = Some(num_predict);
        self
    }

    /// Set the repeat penalty
    pub fn repeat_penalty(mut self, repeat_penalty: f32) -> Self {
        self.options_mut().repeat_penalty = Some(repeat_penalty);
        self
    }

    /// Set the stop sequences
    pub fn stop(mut self, stop: Vec<String>) -> Self {
        if !stop.is_empty() {
            self.options_mut().stop = Some(stop);
        }
        self
    }

    fn options_mut(&mut self) -> &mut GenerationOptions {
        self.options.get_or_insert_with(GenerationOptions::default)
    }
}

impl Ollama {
    /// Create a new Ollama client for the given endpoint.
    ///
    /// The endpoint may omit the scheme; `http://` is assumed. A trailing
    /// slash is stripped so path concatenation stays predictable.
    pub fn new(endpoint: impl Into<String>, timeout_secs: u64) -> Result<Self, ProviderError> {
        let endpoint = endpoint.into();
        let url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            Url::parse(&endpoint)
        } else {
            Url::parse(&format!("http://{}", endpoint))
        }
        .map_err(|e| ProviderError::ConnectionError(format!("Invalid endpoint '{}': {}", endpoint, e)))?;

        let base_url = url.as_str().trim_end_matches('/').to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .http1_only()
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            client,
            timeout_secs,
        })
    }

    /// The normalized base URL this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Map a reqwest error into the provider error taxonomy
    fn map_request_error(&self, e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout(self.timeout_secs)
        } else if e.is_connect() {
            ProviderError::ConnectionError(e.to_string())
        } else {
            ProviderError::RequestFailed(e.to_string())
        }
    }

    /// Generate text from the Ollama API.
    ///
    /// A single attempt: failed calls surface as typed errors and are not
    /// retried, the caller decides whether to re-issue the request.
    pub async fn generate_raw(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Ollama API error ({}): {}", status, message);
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to read response body: {}", e)))?;

        parse_generation_body(&body)
    }

    /// Get the model tags available on the host
    pub async fn tags(&self) -> Result<Vec<String>, ProviderError> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: "tags request rejected".to_string(),
            });
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse tags response: {}", e)))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Pull a model onto the host, streaming and logging status lines.
    ///
    /// Blocks until the pull completes. The request gets its own timeout
    /// with a high floor since pulls routinely outlast generation calls.
    pub async fn pull(&self, model: &str) -> Result<(), ProviderError> {
        let url = format!("{}/api/pull", self.base_url);
        let pull_timeout = Duration::from_secs(self.timeout_secs.max(PULL_TIMEOUT_FLOOR_SECS));

        let response = self
            .client
            .post(&url)
            .timeout(pull_timeout)
            .json(&serde_json::json!({ "name": model }))
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: format!("pull request for '{}' rejected", model),
            });
        }

        let mut stream = response.bytes_stream();
        let mut buffer = Vec::new();

        while let Some(piece) = stream.next().await {
            let piece = piece.map_err(|e| self.map_request_error(e))?;
            buffer.extend_from_slice(&piece);

            // Status lines are newline-delimited JSON objects
            while let Some(newline) = buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=newline).collect();
                if let Ok(value) = serde_json::from_slice::<serde_json::Value>(&line) {
                    if let Some(pull_status) = value.get("status").and_then(|v| v.as_str()) {
                        info!("Pulling '{}': {}", model, pull_status);
                    }
                }
            }
        }

        info!("Model '{}' pulled", model);
        Ok(())
    }
}

/// Parse a generate response body, tolerating the JSONL form a streaming
/// server emits even when `stream: false` was requested
fn parse_generation_body(body: &str) -> Result<GenerationResponse, ProviderError> {
    match serde_json::from_str::<GenerationResponse>(body) {
        Ok(parsed) => Ok(parsed),
        Err(single_error) => {
            // Concatenate the response fragments of each JSONL line
            let mut full_response = String::new();
            let mut saw_line = false;

            for line in body.lines().filter(|l| !l.is_empty()) {
                match serde_json::from_str::<serde_json::Value>(line) {
                    Ok(value) => {
                        saw_line = true;
                        if let Some(part) = value.get("response").and_then(|v| v.as_str()) {
                            full_response.push_str(part);
                        }
                    }
                    Err(_) => {
                        return Err(ProviderError::ParseError(format!(
                            "Response contains invalid JSON: {}",
                            single_error
                        )));
                    }
                }
            }

            if !saw_line {
                return Err(ProviderError::ParseError(format!(
                    "Empty response body: {}",
                    single_error
                )));
            }

            Ok(GenerationResponse {
                model: String::new(),
                created_at: String::new(),
                response: full_response,
                done: true,
                prompt_eval_count: None,
                eval_count: None,
            })
        }
    }
}

#[async_trait]
impl RefinementProvider for Ollama {
    async fn available_models(&self) -> Result<Vec<String>, ProviderError> {
        self.tags().await
    }

    async fn pull_model(&self, model: &str) -> Result<(), ProviderError> {
        self.pull(model).await
    }

    async fn generate(&self, request: RefinementRequest) -> Result<String, ProviderError> {
        let mut wire = GenerationRequest::new(request.model, request.prompt)
            .system(request.system)
            .temperature(request.temperature)
            .num_predict(request.max_tokens)
            .stop(request.stop);
        if let Some(penalty) = request.repeat_penalty {
            wire = wire.repeat_penalty(penalty);
        }

        let response = self.generate_raw(wire).await?;
        Ok(response.response)
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.tags().await.map(|_| ())
    }
}
