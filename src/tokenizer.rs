/*!
 * Tokenizer adapter over a translation backend.
 *
 * Wraps the backend's text/token conversion and owns the target-language
 * forcing rule: backends that expose a language token (M2M100-style) get it
 * as a decoder prefix, backends that do not (OPUS-style) get a textual
 * `>>xx<<` marker prepended to the source before encoding. This is the only
 * reliable way to pin the output language of a multilingual model.
 */

use std::sync::Arc;

use crate::backend::TranslationBackend;
use crate::errors::BackendError;

/// Adapter binding a backend tokenizer to a source/target language pair
#[derive(Clone)]
pub struct TokenizerAdapter {
    /// Backend whose tokenizer is wrapped
    backend: Arc<dyn TranslationBackend>,

    /// ISO 639-1 source language code
    source_language: String,

    /// ISO 639-1 target language code
    target_language: String,
}

impl TokenizerAdapter {
    /// Create an adapter for the given language pair
    pub fn new(
        backend: Arc<dyn TranslationBackend>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            source_language: source_language.into(),
            target_language: target_language.into(),
        }
    }

    /// The source language code
    pub fn source_language(&self) -> &str {
        &self.source_language
    }

    /// The target language code
    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    /// Encode source text into backend tokens, injecting the textual
    /// language marker when the backend has no language token
    pub fn encode(&self, text: &str) -> Result<Vec<String>, BackendError> {
        if self.backend.language_token(&self.target_language).is_some() {
            self.backend.tokenize(text)
        } else {
            let marked = format!(">>{}<< {}", self.target_language, text);
            self.backend.tokenize(&marked)
        }
    }

    /// Token count of the encoded text, used for budget checks
    pub fn count_tokens(&self, text: &str) -> Result<usize, BackendError> {
        Ok(self.encode(text)?.len())
    }

    /// Decoder prefix forcing the target language, when the backend
    /// supports language tokens
    pub fn target_prefix(&self) -> Option<Vec<String>> {
        self.backend
            .language_token(&self.target_language)
            .map(|token| vec![token])
    }

    /// Decode output tokens back into text
    pub fn decode(&self, tokens: &[String]) -> Result<String, BackendError> {
        self.backend.detokenize(tokens)
    }
}
