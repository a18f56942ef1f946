/*!
 * Stage 2: fluency refinement through the remote language model.
 *
 * Builds a single prompt carrying both the source text and the raw
 * stage-1 translation, asks the refinement model for a fluency pass that
 * preserves proper nouns and technical terms, and strips the label
 * artifacts the model tends to prepend. Refinement is a best-effort
 * enhancement: an empty response falls back to the raw translation, only
 * hard provider failures surface as stage-2 errors.
 */

use std::sync::Arc;

use log::debug;

use crate::errors::Stage2Error;
use crate::language_utils::get_language_name;
use crate::providers::{RefinementProvider, RefinementRequest};

/// Token budget floor for a refinement call
const MIN_REFINE_TOKENS: u32 = 2048;

/// Token budget ceiling for a refinement call
const MAX_REFINE_TOKENS: u32 = 16384;

/// Sampling temperature for direct-mode translation
const DIRECT_TEMPERATURE: f32 = 0.3;

/// Repeat penalty for direct-mode translation
const DIRECT_REPEAT_PENALTY: f32 = 1.2;

/// Label artifacts stripped from the head of a refinement response
const REFINE_ARTIFACTS: &[&str] = &[
    "Improved translation:",
    "Improved:",
    "Refined translation:",
    "Refined:",
    "Translation:",
];

/// Label artifacts stripped from the head of a direct-mode response
const DIRECT_ARTIFACTS: &[&str] = &["Translation:", "Translated text:"];

/// Adaptive token budget for refining a raw translation of `raw_len`
/// bytes: half the input length plus headroom for glosses, clamped to
/// bound cost. A configured cap lowers the ceiling for stricter setups.
pub fn refine_max_tokens(raw_len: usize, cap: Option<u32>) -> u32 {
    let ceiling = cap.unwrap_or(MAX_REFINE_TOKENS);
    let floor = MIN_REFINE_TOKENS.min(ceiling);
    let estimated = (raw_len / 2 + 500) as u32;
    estimated.clamp(floor, ceiling)
}

/// Strip the first matching label prefix from a response
pub fn strip_artifacts(text: &str, prefixes: &[&str]) -> String {
    let mut result = text.trim();
    for prefix in prefixes {
        if let Some(stripped) = result.strip_prefix(prefix) {
            result = stripped.trim();
        }
    }
    result.to_string()
}

/// Stage-2 refiner bound to a provider and model tag
#[derive(Debug)]
pub struct Refiner {
    /// Refinement provider client
    provider: Arc<dyn RefinementProvider>,

    /// Model tag generated with
    model: String,

    /// Default sampling temperature
    temperature: f32,

    /// Optional hard cap on generated tokens per call
    max_tokens_cap: Option<u32>,

    /// ISO 639-1 source language code
    source_language: String,

    /// ISO 639-1 target language code
    target_language: String,
}

impl Refiner {
    /// Create a refiner
    pub fn new(
        provider: Arc<dyn RefinementProvider>,
        model: impl Into<String>,
        temperature: f32,
        max_tokens_cap: Option<u32>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            max_tokens_cap,
            source_language: source_language.into(),
            target_language: target_language.into(),
        }
    }

    /// Refine a raw translation with the configured temperature
    pub async fn refine(&self, source: &str, raw: &str) -> Result<String, Stage2Error> {
        self.refine_with(source, raw, self.temperature).await
    }

    /// Refine a raw translation with an explicit temperature
    pub async fn refine_with(
        &self,
        source: &str,
        raw: &str,
        temperature: f32,
    ) -> Result<String, Stage2Error> {
        let source_name = get_language_name(&self.source_language);
        let target_name = get_language_name(&self.target_language);

        let prompt = format!(
            "Improve the following {target} translation so it reads naturally and fluently.\n\n\
             Requirements:\n\
             1. Keep proper nouns, company names, product names, and technical terms in {source}\n\
             2. After a kept term, add a short {target} gloss in parentheses\n\
             3. Make the text flow like a native {target} speaker wrote it\n\
             4. Preserve the meaning and style of the original\n\n\
             Original {source} text: {source_text}\n\n\
             Current translation: {raw_translation}\n\n\
             Improved translation:",
            target = target_name,
            source = source_name,
            source_text = source,
            raw_translation = raw,
        );
        let system = format!(
            "You are a professional {target} translation editor. Your task is to improve \
             translations so they read naturally and fluently to a native speaker. Always keep \
             {source} terms (proper nouns, company and product names, technical terms) and add a \
             short gloss in parentheses right after them. Only return the improved {target} text, \
             without any explanations or comments.",
            target = target_name,
            source = source_name,
        );

        let max_tokens = refine_max_tokens(raw.len(), self.max_tokens_cap);
        debug!("Refining {} chars with budget {} tokens", raw.len(), max_tokens);

        let request = RefinementRequest {
            model: self.model.clone(),
            prompt,
            system,
            temperature,
            max_tokens,
            repeat_penalty: None,
            stop: stop_list(&["English:", "Original:", "Source:", "Note:"]),
        };

        let response = self.provider.generate(request).await?;
        let refined = strip_artifacts(&response, REFINE_ARTIFACTS);

        // Best-effort enhancement: an empty answer never loses the raw
        // translation
        if refined.is_empty() {
            Ok(raw.to_string())
        } else {
            Ok(refined)
        }
    }

    /// Translate directly through the refinement model, used by the
    /// pipeline's direct mode: one prompt both translates and polishes.
    pub async fn translate_direct(&self, source: &str) -> Result<String, Stage2Error> {
        let source_name = get_language_name(&self.source_language);
        let target_name = get_language_name(&self.target_language);

        let prompt = format!(
            "Translate the following {source} text into natural, fluent {target}.\n\n\
             Requirements:\n\
             1. Keep proper nouns, company names, product names, and technical terms in {source}\n\
             2. After a kept term, add a short {target} gloss in parentheses\n\
             3. Translate naturally, not word for word\n\
             4. Do NOT repeat content; translate each idea exactly once\n\n\
             {source} text:\n{source_text}\n\n\
             {target} translation:",
            target = target_name,
            source = source_name,
            source_text = source,
        );
        let system = format!(
            "You are a professional {source}-to-{target} translator. Translate accurately and \
             naturally without repeating content. Keep {source} terms and add a short gloss in \
             parentheses. Only return the translation, without any explanations.",
            target = target_name,
            source = source_name,
        );

        let request = RefinementRequest {
            model: self.model.clone(),
            prompt,
            system,
            temperature: DIRECT_TEMPERATURE,
            max_tokens: refine_max_tokens(source.len(), self.max_tokens_cap),
            repeat_penalty: Some(DIRECT_REPEAT_PENALTY),
            stop: stop_list(&["English:", "Source text:", "\n\nEnglish", "\n\nSource"]),
        };

        let response = self.provider.generate(request).await?;
        Ok(strip_artifacts(&response, DIRECT_ARTIFACTS))
    }
}

/// Owned stop-sequence list from string literals
fn stop_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
