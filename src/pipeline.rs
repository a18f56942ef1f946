/*!
 * Pipeline orchestration.
 *
 * The orchestrator is the only component that sees both backends. It is
 * constructed once with explicit dependencies (configuration, backend
 * loader, refinement provider), performs all availability checks up front,
 * and then serves requests: segment, translate, refine, with each stage
 * timed independently and every failure converted into the uniform
 * `TranslationResult` envelope. Backend errors never propagate past it.
 */

use std::sync::Arc;
use std::time::Instant;

use log::{info, warn};
use serde::Serialize;

use crate::app_config::PipelineConfig;
use crate::backend::{BackendLoader, load_with_fallback};
use crate::errors::{ConstructionError, Stage1Error, Stage2Error};
use crate::providers::RefinementProvider;
use crate::stage1::Stage1Translator;
use crate::stage2::Refiner;
use crate::tokenizer::TokenizerAdapter;

/// Immutable description of one translation request
#[derive(Debug, Clone)]
pub struct TranslationRequest {
    /// Source text to translate
    pub text: String,

    /// Optional refinement temperature override
    pub temperature: Option<f32>,

    /// Optional stage-1 beam-width override
    pub beam_size: Option<usize>,

    /// Optional chunk token-budget override
    pub chunk_budget: Option<usize>,
}

impl TranslationRequest {
    /// Create a request with no overrides
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            temperature: None,
            beam_size: None,
            chunk_budget: None,
        }
    }

    /// Override the refinement temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Override the stage-1 beam width
    pub fn beam_size(mut self, beam_size: usize) -> Self {
        self.beam_size = Some(beam_size);
        self
    }

    /// Override the chunk token budget
    pub fn chunk_budget(mut self, chunk_budget: usize) -> Self {
        self.chunk_budget = Some(chunk_budget);
        self
    }
}

/// Stage a request failed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailedStage {
    /// Input validation rejected the request
    Input,
    /// Stage 1 (translation backend) failed
    Translation,
    /// Stage 2 (refinement) failed
    Refinement,
}

/// Failure descriptor carried in the result envelope
#[derive(Debug, Clone, Serialize)]
pub struct PipelineFailure {
    /// Stage the failure occurred in
    pub stage: FailedStage,

    /// Human-readable failure description
    pub message: String,
}

impl PipelineFailure {
    fn input(message: impl Into<String>) -> Self {
        Self {
            stage: FailedStage::Input,
            message: message.into(),
        }
    }

    fn stage1(error: &Stage1Error) -> Self {
        Self {
            stage: FailedStage::Translation,
            message: error.to_string(),
        }
    }

    fn stage2(error: &Stage2Error) -> Self {
        Self {
            stage: FailedStage::Refinement,
            message: error.to_string(),
        }
    }
}

impl std::fmt::Display for PipelineFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.stage {
            FailedStage::Input => write!(f, "input: {}", self.message),
            FailedStage::Translation => write!(f, "stage 1: {}", self.message),
            FailedStage::Refinement => write!(f, "stage 2: {}", self.message),
        }
    }
}

/// Result envelope returned for every request, success or failure.
/// Immutable once returned; partial output is always preserved.
#[derive(Debug, Clone, Serialize)]
pub struct TranslationResult {
    /// Source text as received
    pub source: String,

    /// Stage-1 output (empty only on failure)
    pub raw_translation: String,

    /// Stage-2 output (empty when refinement failed hard)
    pub refined_translation: String,

    /// Seconds spent in stage 1
    pub time_stage1_sec: f64,

    /// Seconds spent in stage 2
    pub time_stage2_sec: f64,

    /// Failure descriptor, absent on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<PipelineFailure>,
}

impl TranslationResult {
    /// Whether the request failed at some stage
    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }

    /// The most polished translation available: refined when present,
    /// otherwise the raw stage-1 output
    pub fn best_translation(&self) -> &str {
        if self.refined_translation.is_empty() {
            &self.raw_translation
        } else {
            &self.refined_translation
        }
    }
}

/// Two-stage translate-then-refine pipeline.
///
/// One instance serves one in-flight request at a time; use multiple
/// instances for concurrency.
pub struct TranslationPipeline {
    /// Validated configuration
    config: PipelineConfig,

    /// Stage-1 translator; absent in direct mode
    stage1: Option<Stage1Translator>,

    /// Stage-2 refiner
    refiner: Refiner,
}

impl TranslationPipeline {
    /// Construct a pipeline, performing all availability checks.
    ///
    /// In two-stage mode the translation model directory must exist and
    /// the backend must initialize on some device; the refinement host
    /// must answer the tags listing, and a missing model tag triggers a
    /// one-time blocking pull. Any of these failing is a fatal
    /// construction error.
    pub async fn new(
        config: PipelineConfig,
        loader: &dyn BackendLoader,
        provider: Arc<dyn RefinementProvider>,
    ) -> Result<Self, ConstructionError> {
        config
            .validate()
            .map_err(|e| ConstructionError::InvalidConfig(e.to_string()))?;

        let stage1 = if config.direct_only {
            info!("Direct mode: stage 1 disabled, translating through the refinement model");
            None
        } else {
            if !config.model_dir.exists() {
                return Err(ConstructionError::ModelDirMissing(config.model_dir.clone()));
            }
            let backend = load_with_fallback(loader, &config.model_dir)?;
            info!("Translation backend loaded ({:?} family)", backend.family());
            let tokenizer = TokenizerAdapter::new(
                backend.clone(),
                &config.source_language,
                &config.target_language,
            );
            Some(Stage1Translator::new(
                backend,
                tokenizer,
                config.beam_size,
                config.chunk_budget,
            ))
        };

        let models = provider.available_models().await.map_err(|e| {
            ConstructionError::RefinementUnreachable {
                endpoint: config.refinement.endpoint.clone(),
                message: e.to_string(),
            }
        })?;
        if !models.iter().any(|m| m == &config.refinement.model) {
            info!(
                "Model '{}' not present on refinement host, pulling (one-time)",
                config.refinement.model
            );
            provider.pull_model(&config.refinement.model).await.map_err(|e| {
                ConstructionError::ModelPullFailed {
                    model: config.refinement.model.clone(),
                    message: e.to_string(),
                }
            })?;
        }
        info!(
            "Refinement host ready at {} with model '{}'",
            config.refinement.endpoint, config.refinement.model
        );

        let refiner = Refiner::new(
            provider,
            &config.refinement.model,
            config.refinement.temperature,
            config.refinement.max_tokens,
            &config.source_language,
            &config.target_language,
        );

        Ok(Self {
            config,
            stage1,
            refiner,
        })
    }

    /// The pipeline configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Translate text with no per-request overrides
    pub async fn translate_text(&self, text: &str) -> TranslationResult {
        self.translate(&TranslationRequest::new(text)).await
    }

    /// Run a request through the pipeline, returning the envelope.
    /// Never returns a bare error: failures are carried in the envelope
    /// with whatever partial output was produced.
    pub async fn translate(&self, request: &TranslationRequest) -> TranslationResult {
        if request.text.trim().is_empty() {
            return TranslationResult {
                source: String::new(),
                raw_translation: String::new(),
                refined_translation: String::new(),
                time_stage1_sec: 0.0,
                time_stage2_sec: 0.0,
                error: Some(PipelineFailure::input("empty input")),
            };
        }

        match &self.stage1 {
            Some(stage1) => self.run_two_stage(stage1, request).await,
            None => self.run_direct(request).await,
        }
    }

    /// Two-stage path: translate, then refine. A stage-1 failure
    /// short-circuits; a stage-2 failure preserves the raw translation.
    async fn run_two_stage(
        &self,
        stage1: &Stage1Translator,
        request: &TranslationRequest,
    ) -> TranslationResult {
        let beam_size = request.beam_size.unwrap_or(self.config.beam_size);
        let chunk_budget = request.chunk_budget.unwrap_or(self.config.chunk_budget);

        let start_stage1 = Instant::now();
        let raw_translation = match stage1.translate_with(&request.text, beam_size, chunk_budget) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Stage 1 failed, no refinement attempted: {}", e);
                return TranslationResult {
                    source: request.text.clone(),
                    raw_translation: String::new(),
                    refined_translation: String::new(),
                    time_stage1_sec: 0.0,
                    time_stage2_sec: 0.0,
                    error: Some(PipelineFailure::stage1(&e)),
                };
            }
        };
        let time_stage1_sec = start_stage1.elapsed().as_secs_f64();
        info!("Stage 1 completed in {:.3}s", time_stage1_sec);

        let temperature = request
            .temperature
            .unwrap_or(self.config.refinement.temperature);
        let start_stage2 = Instant::now();
        match self
            .refiner
            .refine_with(&request.text, &raw_translation, temperature)
            .await
        {
            Ok(refined_translation) => {
                let time_stage2_sec = start_stage2.elapsed().as_secs_f64();
                info!("Stage 2 completed in {:.3}s", time_stage2_sec);
                TranslationResult {
                    source: request.text.clone(),
                    raw_translation,
                    refined_translation,
                    time_stage1_sec,
                    time_stage2_sec,
                    error: None,
                }
            }
            Err(e) => {
                warn!("Stage 2 failed, keeping raw translation: {}", e);
                TranslationResult {
                    source: request.text.clone(),
                    raw_translation,
                    refined_translation: String::new(),
                    time_stage1_sec,
                    time_stage2_sec: 0.0,
                    error: Some(PipelineFailure::stage2(&e)),
                }
            }
        }
    }

    /// Direct path: one refinement-model call both translates and
    /// polishes. All elapsed time is attributed to the stage-1 slot.
    async fn run_direct(&self, request: &TranslationRequest) -> TranslationResult {
        let start = Instant::now();
        match self.refiner.translate_direct(&request.text).await {
            Ok(translation) => TranslationResult {
                source: request.text.clone(),
                raw_translation: translation.clone(),
                refined_translation: translation,
                time_stage1_sec: start.elapsed().as_secs_f64(),
                time_stage2_sec: 0.0,
                error: None,
            },
            Err(e) => {
                warn!("Direct translation failed: {}", e);
                TranslationResult {
                    source: request.text.clone(),
                    raw_translation: String::new(),
                    refined_translation: String::new(),
                    time_stage1_sec: 0.0,
                    time_stage2_sec: 0.0,
                    error: Some(PipelineFailure::stage2(&e)),
                }
            }
        }
    }
}
