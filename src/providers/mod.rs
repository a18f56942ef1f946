/*!
 * Refinement provider capability.
 *
 * This module defines the interface the pipeline requires from the
 * refinement service: model availability listing, a one-time model pull,
 * and single-shot text generation. The concrete implementation speaks the
 * Ollama wire protocol; a mock implementation is provided for testing.
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Provider-neutral generation request built by the refiner
#[derive(Debug, Clone, PartialEq)]
pub struct RefinementRequest {
    /// Model tag to generate with
    pub model: String,

    /// User prompt
    pub prompt: String,

    /// System message guiding the model
    pub system: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Maximum number of tokens to generate
    pub max_tokens: u32,

    /// Optional repeat penalty
    pub repeat_penalty: Option<f32>,

    /// Stop sequences cutting off prompt-echo continuations
    pub stop: Vec<String>,
}

/// Common trait for refinement service clients
///
/// The pipeline depends only on this capability: an availability check at
/// construction, a blocking one-time pull for missing model tags, and a
/// single synchronous generation call per request.
#[async_trait]
pub trait RefinementProvider: Send + Sync + Debug {
    /// List the model tags available on the host
    async fn available_models(&self) -> Result<Vec<String>, ProviderError>;

    /// Pull a model tag onto the host, blocking until complete
    async fn pull_model(&self, model: &str) -> Result<(), ProviderError>;

    /// Generate text for a request, returning the raw response text
    async fn generate(&self, request: RefinementRequest) -> Result<String, ProviderError>;

    /// Test that the host is reachable
    async fn test_connection(&self) -> Result<(), ProviderError>;
}

pub mod mock;
pub mod ollama;
