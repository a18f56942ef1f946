/*!
 * Mock translation backend for testing.
 *
 * This module provides a deterministic backend that tokenizes on
 * whitespace, plus a loader with configurable device behavior:
 * - `MockBackend::working()` - echoes input tokens as "translated" output
 * - `MockBackend::failing()` - always fails to translate
 * - `MockBackend::empty()` - returns empty hypotheses
 * - `MockLoader::cpu_only()` - fails on CUDA, succeeds on CPU
 * - `MockLoader::failing()` - fails on every device
 */

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::BackendError;

use super::{BackendLoader, DecodingOptions, Device, ModelFamily, TranslationBackend};

/// Behavior mode for the mock backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBackendBehavior {
    /// Echo input tokens back as the translation
    Working,
    /// Always fail with a translate error
    Failing,
    /// Return an empty hypothesis for every input
    Empty,
}

/// Mock translation backend that tokenizes on whitespace
#[derive(Debug)]
pub struct MockBackend {
    /// Reported model family
    family: ModelFamily,
    /// Behavior mode
    behavior: MockBackendBehavior,
    /// Number of translate_batch calls made
    translate_calls: Arc<AtomicUsize>,
    /// Fixed output tokens returned instead of echoing, when set
    canned_output: Option<Vec<String>>,
}

impl MockBackend {
    /// Create a mock backend with the given behavior
    pub fn new(family: ModelFamily, behavior: MockBackendBehavior) -> Self {
        Self {
            family,
            behavior,
            translate_calls: Arc::new(AtomicUsize::new(0)),
            canned_output: None,
        }
    }

    /// Create a working OPUS-family mock
    pub fn working() -> Self {
        Self::new(ModelFamily::Opus, MockBackendBehavior::Working)
    }

    /// Create a working M2M100-family mock
    pub fn working_m2m100() -> Self {
        Self::new(ModelFamily::M2M100, MockBackendBehavior::Working)
    }

    /// Create a mock whose translations always fail
    pub fn failing() -> Self {
        Self::new(ModelFamily::Opus, MockBackendBehavior::Failing)
    }

    /// Create a mock that returns empty hypotheses
    pub fn empty() -> Self {
        Self::new(ModelFamily::Opus, MockBackendBehavior::Empty)
    }

    /// Always return these output tokens instead of echoing the input
    pub fn with_canned_output(mut self, tokens: Vec<String>) -> Self {
        self.canned_output = Some(tokens);
        self
    }

    /// Handle to the translate-call counter, for call-count assertions
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.translate_calls.clone()
    }
}

impl TranslationBackend for MockBackend {
    fn family(&self) -> ModelFamily {
        self.family
    }

    fn tokenize(&self, text: &str) -> Result<Vec<String>, BackendError> {
        Ok(text.split_whitespace().map(|t| t.to_string()).collect())
    }

    fn translate_batch(
        &self,
        inputs: &[Vec<String>],
        _options: &DecodingOptions,
    ) -> Result<Vec<Vec<String>>, BackendError> {
        self.translate_calls.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            MockBackendBehavior::Working => Ok(inputs
                .iter()
                .map(|tokens| {
                    self.canned_output
                        .clone()
                        .unwrap_or_else(|| tokens.clone())
                })
                .collect()),
            MockBackendBehavior::Failing => Err(BackendError::TranslateFailed(
                "mock backend configured to fail".to_string(),
            )),
            MockBackendBehavior::Empty => Ok(inputs.iter().map(|_| Vec::new()).collect()),
        }
    }

    fn detokenize(&self, tokens: &[String]) -> Result<String, BackendError> {
        Ok(tokens.join(" "))
    }

    fn language_token(&self, lang: &str) -> Option<String> {
        match self.family {
            ModelFamily::M2M100 => Some(format!("__{}__", lang)),
            ModelFamily::Opus => None,
        }
    }
}

/// Device behavior for the mock loader
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockLoaderBehavior {
    /// Succeed on any device
    AnyDevice,
    /// Fail on CUDA, succeed on CPU
    CpuOnly,
    /// Fail on every device
    Failing,
}

/// Mock backend loader that records which devices were attempted
pub struct MockLoader {
    /// Device behavior
    behavior: MockLoaderBehavior,
    /// Family of the backend handed out
    family: ModelFamily,
    /// Prebuilt backend handed out instead of a fresh one, when set
    shared: Option<Arc<MockBackend>>,
    /// Devices load() was called with, in order
    attempts: std::sync::Mutex<Vec<Device>>,
}

impl MockLoader {
    /// Create a loader with the given behavior
    pub fn new(behavior: MockLoaderBehavior, family: ModelFamily) -> Self {
        Self {
            behavior,
            family,
            shared: None,
            attempts: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Loader that always hands out the given backend, so tests can keep
    /// a handle to its call counters
    pub fn with_shared_backend(backend: Arc<MockBackend>) -> Self {
        Self {
            behavior: MockLoaderBehavior::AnyDevice,
            family: backend.family(),
            shared: Some(backend),
            attempts: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Loader that succeeds on any device with an OPUS-family backend
    pub fn working() -> Self {
        Self::new(MockLoaderBehavior::AnyDevice, ModelFamily::Opus)
    }

    /// Loader that only initializes on CPU
    pub fn cpu_only() -> Self {
        Self::new(MockLoaderBehavior::CpuOnly, ModelFamily::Opus)
    }

    /// Loader that fails on every device
    pub fn failing() -> Self {
        Self::new(MockLoaderBehavior::Failing, ModelFamily::Opus)
    }

    /// Devices load() was attempted on, in call order
    pub fn attempted_devices(&self) -> Vec<Device> {
        self.attempts.lock().map(|a| a.clone()).unwrap_or_default()
    }
}

impl BackendLoader for MockLoader {
    fn load(
        &self,
        _model_dir: &Path,
        device: Device,
    ) -> Result<Arc<dyn TranslationBackend>, BackendError> {
        if let Ok(mut attempts) = self.attempts.lock() {
            attempts.push(device);
        }

        let fail = match self.behavior {
            MockLoaderBehavior::AnyDevice => false,
            MockLoaderBehavior::CpuOnly => device == Device::Cuda,
            MockLoaderBehavior::Failing => true,
        };

        if fail {
            return Err(BackendError::LoadFailed {
                device: device.to_string(),
                message: "mock loader configured to fail on this device".to_string(),
            });
        }

        if let Some(backend) = &self.shared {
            return Ok(backend.clone());
        }

        Ok(Arc::new(MockBackend::new(
            self.family,
            MockBackendBehavior::Working,
        )))
    }
}
