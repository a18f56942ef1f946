/*!
 * Text segmentation under a token budget.
 *
 * Splits arbitrarily long input into chunks that each tokenize under a
 * configurable budget, preserving reading order and sentence coherence.
 * Splitting is attempted at sentence boundaries first, then line breaks,
 * then word granularity for oversized units. A single indivisible word
 * over the budget is still emitted rather than dropped.
 */

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::BackendError;
use crate::tokenizer::TokenizerAdapter;

/// A sentence end is a run of terminal punctuation followed by whitespace
/// and an upper-case letter. The capture group marks the split position;
/// decimals like "1.5" never match. (Terminal punctuation at end-of-text
/// needs no boundary: the final segment always extends to end-of-text.)
static SENTENCE_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]+\s+([A-Z])").expect("sentence boundary regex is valid"));

/// A bounded-size contiguous slice of input text, the unit of translation
/// work. Produced once per request and discarded after stage 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Trimmed chunk text
    pub text: String,

    /// Token count of the chunk under the adapter's encoding
    pub token_count: usize,
}

impl Chunk {
    /// Create a chunk
    pub fn new(text: impl Into<String>, token_count: usize) -> Self {
        Self {
            text: text.into(),
            token_count,
        }
    }
}

/// Segmenter binding a tokenizer adapter to a token budget
pub struct TextSegmenter<'a> {
    /// Adapter used for all budget checks
    tokenizer: &'a TokenizerAdapter,

    /// Maximum tokens per chunk
    max_tokens: usize,
}

impl<'a> TextSegmenter<'a> {
    /// Create a segmenter with the given budget
    pub fn new(tokenizer: &'a TokenizerAdapter, max_tokens: usize) -> Self {
        Self {
            tokenizer,
            max_tokens,
        }
    }

    /// Split text into an ordered, non-empty sequence of chunks, each
    /// tokenizing under the budget (best effort: an indivisible unit
    /// larger than the budget is emitted whole and flagged).
    pub fn segment(&self, text: &str) -> Result<Vec<Chunk>, BackendError> {
        let trimmed = text.trim();

        // Whole input under budget: return it unchanged as one chunk, so
        // re-segmenting an already-valid chunk is a no-op.
        let total_tokens = self.tokenizer.count_tokens(trimmed)?;
        if total_tokens <= self.max_tokens {
            return Ok(vec![Chunk::new(trimmed, total_tokens)]);
        }

        let sentences = split_sentences(trimmed);
        let units: Vec<&str> = if sentences.len() < 2 {
            // Boundary rule too coarse for this input; fall back to lines
            trimmed
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect()
        } else {
            sentences
        };
        debug!(
            "Segmenting {} chars ({} tokens) into units: {}",
            trimmed.len(),
            total_tokens,
            units.len()
        );

        let separator = if trimmed.contains('\n') { "\n" } else { " " };
        let mut chunks: Vec<Chunk> = Vec::new();
        let mut current = String::new();

        for unit in units {
            let unit_tokens = self.tokenizer.count_tokens(unit)?;

            if unit_tokens > self.max_tokens {
                // Oversized unit: flush what we have, then pack at word
                // granularity. The trailing partial word-chunk stays open
                // so following units can join it.
                if !current.is_empty() {
                    self.commit(&mut chunks, &current)?;
                    current.clear();
                }
                current = self.pack_words(unit, &mut chunks)?;
                continue;
            }

            let candidate = if current.is_empty() {
                unit.to_string()
            } else {
                format!("{}{}{}", current, separator, unit)
            };

            if self.tokenizer.count_tokens(&candidate)? > self.max_tokens {
                self.commit(&mut chunks, &current)?;
                current = unit.to_string();
            } else {
                current = candidate;
            }
        }

        if !current.trim().is_empty() {
            self.commit(&mut chunks, &current)?;
        }

        // Output must be non-empty
        if chunks.is_empty() {
            return Ok(vec![Chunk::new(trimmed, total_tokens)]);
        }

        self.check_character_loss(trimmed, &chunks);

        Ok(chunks)
    }

    /// Greedy packing at word granularity for a unit over the budget.
    /// Full chunks are committed; the trailing partial chunk is returned
    /// so the caller can keep packing into it.
    fn pack_words(&self, unit: &str, chunks: &mut Vec<Chunk>) -> Result<String, BackendError> {
        let mut current = String::new();

        for word in unit.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };

            if self.tokenizer.count_tokens(&candidate)? > self.max_tokens {
                if current.is_empty() {
                    // Single word over budget: emit it alone
                    let word_tokens = self.tokenizer.count_tokens(word)?;
                    warn!(
                        "Indivisible word of {} tokens exceeds chunk budget {}, emitting whole",
                        word_tokens, self.max_tokens
                    );
                    chunks.push(Chunk::new(word, word_tokens));
                } else {
                    self.commit(chunks, &current)?;
                    current = word.to_string();
                }
            } else {
                current = candidate;
            }
        }

        Ok(current)
    }

    /// Commit the current accumulation as a chunk
    fn commit(&self, chunks: &mut Vec<Chunk>, text: &str) -> Result<(), BackendError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(());
        }
        let token_count = self.tokenizer.count_tokens(trimmed)?;
        debug!(
            "Chunk {}: {} chars, {} tokens",
            chunks.len() + 1,
            trimmed.len(),
            token_count
        );
        chunks.push(Chunk::new(trimmed, token_count));
        Ok(())
    }

    /// Compare non-whitespace character counts between input and chunks.
    /// A divergence means the splitter dropped content, which is a bug
    /// worth surfacing rather than swallowing.
    fn check_character_loss(&self, input: &str, chunks: &[Chunk]) {
        let input_chars = non_whitespace_chars(input);
        let chunk_chars: usize = chunks.iter().map(|c| non_whitespace_chars(&c.text)).sum();

        if chunk_chars < input_chars {
            warn!(
                "Segmentation lost {} non-whitespace characters ({} -> {})",
                input_chars - chunk_chars,
                input_chars,
                chunk_chars
            );
        }
    }
}

/// Count non-whitespace characters
fn non_whitespace_chars(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

/// Split text into candidate sentences at terminal-punctuation boundaries
fn split_sentences(text: &str) -> Vec<&str> {
    let mut positions = vec![0];
    for caps in SENTENCE_BOUNDARY.captures_iter(text) {
        // The boundary sits at the upper-case letter that starts the next
        // sentence; offsets at ASCII letters are always char boundaries.
        if let Some(letter) = caps.get(1) {
            positions.push(letter.start());
        }
    }
    positions.push(text.len());

    let mut sentences = Vec::new();
    for window in positions.windows(2) {
        let sentence = text[window[0]..window[1]].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
    }
    sentences
}
