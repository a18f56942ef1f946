/*!
 * Stage 1: rough translation through the local neural backend.
 *
 * Drives the translation backend over the segmenter's chunks, computing
 * adaptive decoding-length bounds per chunk, forcing the target language,
 * and reassembling chunk outputs in order. Degenerate output (empty,
 * implausibly short, wrong script) is logged and flagged but does not fail
 * the request: re-decoding deterministically reproduces the same output,
 * so a retry would not help.
 */

use std::sync::Arc;

use log::{debug, warn};

use crate::backend::{DecodingOptions, TranslationBackend};
use crate::errors::{BackendError, Stage1Error};
use crate::language_utils::expects_non_ascii_output;
use crate::segmenter::{Chunk, TextSegmenter};
use crate::tokenizer::TokenizerAdapter;

/// Repetition penalty applied to every stage-1 decode
const REPETITION_PENALTY: f32 = 1.2;

/// N-gram size blocked from repeating during decoding
const NO_REPEAT_NGRAM_SIZE: usize = 3;

/// Upper bound on the decoding-length estimate
const MAX_DECODING_CEILING: usize = 2048;

/// Lower bound on the decoding-length estimate
const MAX_DECODING_FLOOR: usize = 512;

/// Adaptive upper decoding bound for a source of `source_tokens` tokens.
///
/// Target text runs up to ~1.5x the source token count for the language
/// pairs this pipeline serves; the headroom constant absorbs short inputs
/// and the clamp bounds latency.
pub fn max_decoding_length(source_tokens: usize) -> usize {
    let estimated = ((source_tokens as f64) * 1.5).round() as usize + 50;
    estimated.clamp(MAX_DECODING_FLOOR, MAX_DECODING_CEILING)
}

/// Adaptive lower decoding bound, discouraging truncated short outputs
pub fn min_decoding_length(source_tokens: usize) -> usize {
    ((source_tokens as f64) * 0.8).round() as usize
}

/// Quality flags for a single chunk's translation output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputAssessment {
    /// Output was empty after trimming
    pub empty: bool,

    /// Output is implausibly short relative to the source
    pub implausibly_short: bool,

    /// Output contains near-zero non-ASCII content although the target
    /// script expects it
    pub wrong_script: bool,
}

impl OutputAssessment {
    /// Whether any degenerate-output flag is set
    pub fn is_degenerate(&self) -> bool {
        self.empty || self.implausibly_short || self.wrong_script
    }
}

/// Assess a chunk translation for degenerate output.
///
/// This is a diagnostic signal, not a failure: callers log the flags and
/// keep the output.
pub fn assess_output(source: &str, output: &str, expect_non_ascii: bool) -> OutputAssessment {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        return OutputAssessment {
            empty: true,
            ..Default::default()
        };
    }

    let source_chars = source.chars().count();
    let output_chars = trimmed.chars().count();
    let implausibly_short = source_chars > 0 && (output_chars as f64) < (source_chars as f64) * 0.5;

    let non_ascii = trimmed.chars().filter(|c| !c.is_ascii()).count();
    let wrong_script = expect_non_ascii && (non_ascii as f64) < (output_chars as f64) * 0.1;

    OutputAssessment {
        empty: false,
        implausibly_short,
        wrong_script,
    }
}

/// Stage-1 translator owning the backend handle for its pipeline instance
pub struct Stage1Translator {
    /// Loaded translation backend
    backend: Arc<dyn TranslationBackend>,

    /// Tokenizer adapter for the configured language pair
    tokenizer: TokenizerAdapter,

    /// Default beam width
    beam_size: usize,

    /// Default chunk token budget
    chunk_budget: usize,
}

impl Stage1Translator {
    /// Create a stage-1 translator
    pub fn new(
        backend: Arc<dyn TranslationBackend>,
        tokenizer: TokenizerAdapter,
        beam_size: usize,
        chunk_budget: usize,
    ) -> Self {
        Self {
            backend,
            tokenizer,
            beam_size,
            chunk_budget,
        }
    }

    /// The tokenizer adapter in use
    pub fn tokenizer(&self) -> &TokenizerAdapter {
        &self.tokenizer
    }

    /// Translate text with the configured defaults
    pub fn translate(&self, text: &str) -> Result<String, Stage1Error> {
        self.translate_with(text, self.beam_size, self.chunk_budget)
    }

    /// Translate text with explicit beam width and chunk budget
    pub fn translate_with(
        &self,
        text: &str,
        beam_size: usize,
        chunk_budget: usize,
    ) -> Result<String, Stage1Error> {
        let segmenter = TextSegmenter::new(&self.tokenizer, chunk_budget);
        let chunks = segmenter.segment(text)?;
        debug!("Translating {} chunk(s)", chunks.len());

        let expect_non_ascii = expects_non_ascii_output(self.tokenizer.target_language());
        let mut outputs: Vec<String> = Vec::with_capacity(chunks.len());

        for (index, chunk) in chunks.iter().enumerate() {
            let output = self.translate_chunk(chunk, beam_size)?;

            let assessment = assess_output(&chunk.text, &output, expect_non_ascii);
            if assessment.empty {
                warn!("Chunk {}/{} translated to empty output", index + 1, chunks.len());
                continue;
            }
            if assessment.implausibly_short {
                warn!(
                    "Chunk {}/{} output is implausibly short ({} -> {} chars)",
                    index + 1,
                    chunks.len(),
                    chunk.text.chars().count(),
                    output.chars().count()
                );
            }
            if assessment.wrong_script {
                warn!(
                    "Chunk {}/{} output does not look like the target script",
                    index + 1,
                    chunks.len()
                );
            }

            outputs.push(output);
        }

        Ok(outputs.join(" "))
    }

    /// Translate a single chunk through the backend
    fn translate_chunk(&self, chunk: &Chunk, beam_size: usize) -> Result<String, Stage1Error> {
        let tokens = self.tokenizer.encode(&chunk.text)?;
        let source_tokens = tokens.len();

        let options = DecodingOptions {
            beam_size,
            max_decoding_length: max_decoding_length(source_tokens),
            min_decoding_length: min_decoding_length(source_tokens),
            repetition_penalty: REPETITION_PENALTY,
            no_repeat_ngram_size: NO_REPEAT_NGRAM_SIZE,
            target_prefix: self.tokenizer.target_prefix().map(|prefix| vec![prefix]),
        };
        debug!(
            "Decoding chunk: {} source tokens, bounds [{}, {}]",
            source_tokens, options.min_decoding_length, options.max_decoding_length
        );

        let mut hypotheses = self.backend.translate_batch(&[tokens], &options)?;
        let best = hypotheses
            .drain(..)
            .next()
            .ok_or_else(|| BackendError::TranslateFailed("backend returned no hypotheses".to_string()))?;

        let output = self.tokenizer.decode(&best)?;
        Ok(output.trim().to_string())
    }
}
