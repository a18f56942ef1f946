/*!
 * # hytran - Hybrid Translate-then-Refine Pipeline
 *
 * A Rust library orchestrating a two-stage machine translation pipeline:
 * a fast local neural translation backend produces a rough translation,
 * and a larger language model reached over HTTP (Ollama) polishes it for
 * fluency.
 *
 * ## Features
 *
 * - Boundary-aware text segmentation under a configurable token budget
 * - Adaptive decoding-length bounds per chunk
 * - Target-language forcing for multilingual model families
 * - Device fallback (accelerated device to CPU) at construction
 * - Graceful degradation: stage-2 failures never discard stage-1 output
 * - Direct mode: translate through the refinement model alone
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `backend`: Translation backend capability and mock implementation
 * - `tokenizer`: Tokenizer adapter with language-tag injection
 * - `segmenter`: Token-budget text segmentation
 * - `stage1`: Rough translation through the local backend
 * - `stage2`: Fluency refinement through the remote model
 * - `pipeline`: Orchestration, timing, and the result envelope
 * - `providers`: Refinement service clients:
 *   - `providers::ollama`: Ollama API client
 *   - `providers::mock`: Mock provider for testing
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the pipeline
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod backend;
pub mod errors;
pub mod language_utils;
pub mod pipeline;
pub mod providers;
pub mod segmenter;
pub mod stage1;
pub mod stage2;
pub mod tokenizer;

// Re-export main types for easier usage
pub use app_config::PipelineConfig;
pub use errors::{ConstructionError, PipelineError, ProviderError, Stage1Error, Stage2Error};
pub use pipeline::{TranslationPipeline, TranslationRequest, TranslationResult};
pub use segmenter::{Chunk, TextSegmenter};
pub use tokenizer::TokenizerAdapter;
