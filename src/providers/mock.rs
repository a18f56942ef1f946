/*!
 * Mock refinement provider for testing.
 *
 * This module provides a mock provider that simulates different behaviors:
 * - `MockRefinementProvider::working()` - succeeds with a canned response
 * - `MockRefinementProvider::empty()` - succeeds with an empty response
 * - `MockRefinementProvider::failing()` - always fails with an API error
 * - `MockRefinementProvider::timing_out()` - always fails with a timeout
 * - `MockRefinementProvider::unreachable()` - connection refused everywhere
 */

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::errors::ProviderError;

use super::{RefinementProvider, RefinementRequest};

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockRefinementBehavior {
    /// Always succeeds with the configured response
    Working,
    /// Succeeds but returns an empty response
    Empty,
    /// Always fails with an API error
    Failing,
    /// Always fails with a timeout
    TimingOut,
    /// Host unreachable: every call fails with a connection error
    Unreachable,
}

/// Mock refinement provider recording calls for assertions
#[derive(Debug)]
pub struct MockRefinementProvider {
    /// Behavior mode
    behavior: MockRefinementBehavior,
    /// Response returned in working mode
    response: String,
    /// Model tags reported by available_models
    models: Vec<String>,
    /// Number of generate calls made
    generate_calls: Arc<AtomicUsize>,
    /// Models pull_model was called with
    pulled: Mutex<Vec<String>>,
    /// Requests passed to generate, for prompt assertions
    requests: Mutex<Vec<RefinementRequest>>,
}

impl MockRefinementProvider {
    /// Create a mock with the specified behavior
    pub fn new(behavior: MockRefinementBehavior) -> Self {
        Self {
            behavior,
            response: "refined translation output".to_string(),
            models: vec!["llama3:8b".to_string()],
            generate_calls: Arc::new(AtomicUsize::new(0)),
            pulled: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a working mock that always succeeds
    pub fn working() -> Self {
        Self::new(MockRefinementBehavior::Working)
    }

    /// Create a mock that returns empty responses
    pub fn empty() -> Self {
        Self::new(MockRefinementBehavior::Empty)
    }

    /// Create a failing mock that always errors
    pub fn failing() -> Self {
        Self::new(MockRefinementBehavior::Failing)
    }

    /// Create a mock that always times out
    pub fn timing_out() -> Self {
        Self::new(MockRefinementBehavior::TimingOut)
    }

    /// Create a mock whose host is unreachable
    pub fn unreachable() -> Self {
        Self::new(MockRefinementBehavior::Unreachable)
    }

    /// Set the response returned in working mode
    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = response.into();
        self
    }

    /// Set the model tags the mock reports as available
    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.models = models;
        self
    }

    /// Handle to the generate-call counter
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.generate_calls.clone()
    }

    /// Models pull_model was called with, in call order
    pub fn pulled_models(&self) -> Vec<String> {
        self.pulled.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Requests seen by generate, in call order
    pub fn seen_requests(&self) -> Vec<RefinementRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl RefinementProvider for MockRefinementProvider {
    async fn available_models(&self) -> Result<Vec<String>, ProviderError> {
        if self.behavior == MockRefinementBehavior::Unreachable {
            return Err(ProviderError::ConnectionError(
                "mock host unreachable".to_string(),
            ));
        }
        Ok(self.models.clone())
    }

    async fn pull_model(&self, model: &str) -> Result<(), ProviderError> {
        if self.behavior == MockRefinementBehavior::Unreachable {
            return Err(ProviderError::ConnectionError(
                "mock host unreachable".to_string(),
            ));
        }
        if let Ok(mut pulled) = self.pulled.lock() {
            pulled.push(model.to_string());
        }
        Ok(())
    }

    async fn generate(&self, request: RefinementRequest) -> Result<String, ProviderError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        match self.behavior {
            MockRefinementBehavior::Working => Ok(self.response.clone()),
            MockRefinementBehavior::Empty => Ok(String::new()),
            MockRefinementBehavior::Failing => Err(ProviderError::ApiError {
                status_code: 500,
                message: "mock provider configured to fail".to_string(),
            }),
            MockRefinementBehavior::TimingOut => Err(ProviderError::Timeout(600)),
            MockRefinementBehavior::Unreachable => Err(ProviderError::ConnectionError(
                "mock host unreachable".to_string(),
            )),
        }
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.available_models().await.map(|_| ())
    }
}
