/*!
 * Error types for the hytran pipeline.
 *
 * This module contains custom error types for different parts of the
 * pipeline, using the thiserror crate for ergonomic error definitions.
 * Backend-level failures are caught at the stage boundary and converted
 * into the result envelope; they never propagate past the orchestrator.
 */

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when talking to the refinement service API
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The request exceeded the configured timeout
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),
}

/// Errors raised by a translation backend (model load, tokenization,
/// decoding)
#[derive(Error, Debug)]
pub enum BackendError {
    /// The model could not be loaded on the requested device
    #[error("Failed to load model on {device}: {message}")]
    LoadFailed {
        /// Device name the load was attempted on
        device: String,
        /// Backend-specific failure description
        message: String,
    },

    /// Tokenization of input text failed
    #[error("Tokenization failed: {0}")]
    TokenizeFailed(String),

    /// Beam decoding failed or returned no hypotheses
    #[error("Translation failed: {0}")]
    TranslateFailed(String),

    /// Converting output tokens back to text failed
    #[error("Detokenization failed: {0}")]
    DetokenizeFailed(String),
}

/// Fatal errors that prevent a pipeline from being constructed
#[derive(Error, Debug)]
pub enum ConstructionError {
    /// The stage-1 model directory does not exist
    #[error(
        "Translation model directory '{}' not found. \
         Run the model conversion setup before starting the pipeline.",
        .0.display()
    )]
    ModelDirMissing(PathBuf),

    /// The backend failed to initialize on every candidate device
    #[error("Translation backend failed to initialize: {0}")]
    BackendInit(#[from] BackendError),

    /// The refinement host did not respond to the availability check
    #[error(
        "Cannot reach refinement host at {endpoint}: {message}. \
         Make sure the server is running and the endpoint is correct."
    )]
    RefinementUnreachable {
        /// Configured endpoint URL
        endpoint: String,
        /// Underlying connection failure
        message: String,
    },

    /// Pulling a missing refinement model tag failed
    #[error(
        "Failed to pull refinement model '{model}': {message}. \
         Pull it manually and restart."
    )]
    ModelPullFailed {
        /// Model tag that was requested
        model: String,
        /// Underlying failure description
        message: String,
    },

    /// The configuration is invalid
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Request-scoped stage-1 (translation) failure
#[derive(Error, Debug)]
pub enum Stage1Error {
    /// Error from the translation backend
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// The segmenter could not produce any chunk
    #[error("Segmentation error: {0}")]
    Segmentation(String),
}

/// Request-scoped stage-2 (refinement) failure
#[derive(Error, Debug)]
pub enum Stage2Error {
    /// Error from the refinement provider
    #[error("Provider error: {0}")]
    Provider(ProviderError),

    /// The refinement call exceeded its timeout; surfaced distinctly so
    /// callers can tell a slow model from a broken one
    #[error("Refinement timed out after {0} seconds")]
    Timeout(u64),
}

impl From<ProviderError> for Stage2Error {
    fn from(error: ProviderError) -> Self {
        match error {
            ProviderError::Timeout(secs) => Self::Timeout(secs),
            other => Self::Provider(other),
        }
    }
}

/// Umbrella error type for pipeline operations
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Fatal construction failure
    #[error("Construction error: {0}")]
    Construction(#[from] ConstructionError),

    /// Stage-1 failure
    #[error("Stage 1 error: {0}")]
    Stage1(#[from] Stage1Error),

    /// Stage-2 failure
    #[error("Stage 2 error: {0}")]
    Stage2(#[from] Stage2Error),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for PipelineError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}
