/*!
 * Translation backend capability.
 *
 * The local neural translation model is a black box behind the
 * `TranslationBackend` trait: the orchestrator and segmenter depend only on
 * this contract, never on a specific model family or inference library.
 * Loading is a separate `BackendLoader` capability so construction can try
 * an accelerated device first and fall back to CPU once.
 */

use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;

use log::warn;

use crate::errors::BackendError;

/// Compute device a backend can be initialized on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    /// Accelerated device (GPU)
    Cuda,
    /// Host CPU
    Cpu,
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cuda => write!(f, "cuda"),
            Self::Cpu => write!(f, "cpu"),
        }
    }
}

/// Model family of the stage-1 translation model.
///
/// The family decides how the target language is forced: M2M100-style
/// models take a language token as decoder prefix, OPUS-style models take a
/// textual `>>xx<<` marker prepended to the source before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFamily {
    /// Facebook M2M100 multilingual models (language-token forcing)
    M2M100,
    /// Helsinki OPUS-MT models (textual marker forcing)
    Opus,
}

impl ModelFamily {
    /// Infer the family from a model identifier string
    pub fn from_model_id(model_id: &str) -> Self {
        if model_id.to_lowercase().contains("m2m100") {
            Self::M2M100
        } else {
            Self::Opus
        }
    }
}

/// Decoding options for a single batch translation call
#[derive(Debug, Clone)]
pub struct DecodingOptions {
    /// Beam width
    pub beam_size: usize,

    /// Upper bound on generated tokens
    pub max_decoding_length: usize,

    /// Lower bound on generated tokens
    pub min_decoding_length: usize,

    /// Repetition penalty (> 1.0 suppresses degenerate loops)
    pub repetition_penalty: f32,

    /// N-gram size that may not repeat during decoding
    pub no_repeat_ngram_size: usize,

    /// Decoder prefix tokens forcing the target language, one prefix per
    /// input in the batch
    pub target_prefix: Option<Vec<Vec<String>>>,
}

impl Default for DecodingOptions {
    fn default() -> Self {
        Self {
            beam_size: 2,
            max_decoding_length: 512,
            min_decoding_length: 1,
            repetition_penalty: 1.2,
            no_repeat_ngram_size: 3,
            target_prefix: None,
        }
    }
}

/// Contract every stage-1 translation backend must implement.
///
/// Implementations wrap a loaded model plus its tokenizer. A handle is
/// owned by the pipeline instance that loaded it and is assumed to serve
/// one in-flight request at a time.
pub trait TranslationBackend: Send + Sync + Debug {
    /// The model family of this backend
    fn family(&self) -> ModelFamily;

    /// Convert text into the backend's token list
    fn tokenize(&self, text: &str) -> Result<Vec<String>, BackendError>;

    /// Translate a batch of token lists, returning the best hypothesis per
    /// input
    fn translate_batch(
        &self,
        inputs: &[Vec<String>],
        options: &DecodingOptions,
    ) -> Result<Vec<Vec<String>>, BackendError>;

    /// Convert output tokens back into text
    fn detokenize(&self, tokens: &[String]) -> Result<String, BackendError>;

    /// The language token for a language code, if this backend supports
    /// explicit language-token forcing (e.g. `__vi__` for M2M100)
    fn language_token(&self, lang: &str) -> Option<String>;
}

/// Loader capability constructing a backend handle from a model directory
pub trait BackendLoader: Send + Sync {
    /// Load the model from `model_dir` on the given device
    fn load(
        &self,
        model_dir: &Path,
        device: Device,
    ) -> Result<Arc<dyn TranslationBackend>, BackendError>;
}

/// Load a backend, trying the accelerated device first and falling back
/// once to CPU. Failure on both devices is fatal for construction.
pub fn load_with_fallback(
    loader: &dyn BackendLoader,
    model_dir: &Path,
) -> Result<Arc<dyn TranslationBackend>, BackendError> {
    match loader.load(model_dir, Device::Cuda) {
        Ok(backend) => Ok(backend),
        Err(e) => {
            warn!("Failed to load model on cuda, falling back to cpu: {}", e);
            loader.load(model_dir, Device::Cpu)
        }
    }
}

pub mod mock;
