use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::language_utils::validate_language_code;

/// Application configuration module
/// This module handles the pipeline configuration including loading,
/// validating and saving configuration settings.
/// Represents the pipeline configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PipelineConfig {
    /// Source language code (ISO 639-1)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO 639-1)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Directory holding the converted stage-1 translation model
    #[serde(default)]
    pub model_dir: PathBuf,

    /// Stage-1 model identifier, used to infer the model family
    #[serde(default)]
    pub model_id: String,

    /// Beam width for stage-1 decoding
    #[serde(default = "default_beam_size")]
    pub beam_size: usize,

    /// Maximum tokens per chunk handed to stage 1
    #[serde(default = "default_chunk_budget")]
    pub chunk_budget: usize,

    /// Skip stage 1 entirely and translate through the refinement model
    #[serde(default)]
    pub direct_only: bool,

    /// Refinement service configuration
    #[serde(default)]
    pub refinement: RefinementConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Refinement service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefinementConfig {
    /// Model tag on the refinement host (e.g. "llama3:8b")
    #[serde(default = "default_refinement_model")]
    pub model: String,

    /// Service endpoint URL
    #[serde(default = "default_refinement_endpoint")]
    pub endpoint: String,

    /// Temperature parameter for text generation
    /// Lower values make output more deterministic, higher values more creative
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Optional hard cap on generated tokens per call; when set it
    /// overrides the adaptive budget's ceiling
    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self {
            model: default_refinement_model(),
            endpoint: default_refinement_endpoint(),
            temperature: default_temperature(),
            max_tokens: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_language: default_source_language(),
            target_language: default_target_language(),
            model_dir: PathBuf::new(),
            model_id: String::new(),
            beam_size: default_beam_size(),
            chunk_budget: default_chunk_budget(),
            direct_only: false,
            refinement: RefinementConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path.display(), e))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path.display(), e))?;
        Ok(())
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<()> {
        validate_language_code(&self.source_language)?;
        validate_language_code(&self.target_language)?;

        if self.beam_size == 0 {
            return Err(anyhow!("Beam size must be at least 1"));
        }
        if self.chunk_budget == 0 {
            return Err(anyhow!("Chunk budget must be at least 1 token"));
        }
        if !(0.0..=2.0).contains(&self.refinement.temperature) {
            return Err(anyhow!(
                "Temperature must be between 0.0 and 2.0, got {}",
                self.refinement.temperature
            ));
        }
        if self.refinement.model.trim().is_empty() {
            return Err(anyhow!("Refinement model tag must not be empty"));
        }
        if self.refinement.endpoint.trim().is_empty() {
            return Err(anyhow!("Refinement endpoint must not be empty"));
        }
        if self.refinement.timeout_secs == 0 {
            return Err(anyhow!("Request timeout must be at least 1 second"));
        }

        if !self.direct_only {
            if self.model_dir.as_os_str().is_empty() {
                return Err(anyhow!(
                    "Translation model directory must be set unless direct_only is enabled"
                ));
            }
            if self.model_id.trim().is_empty() {
                return Err(anyhow!(
                    "Translation model identifier must be set unless direct_only is enabled"
                ));
            }
        }

        Ok(())
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_target_language() -> String {
    "vi".to_string()
}

fn default_beam_size() -> usize {
    2
}

fn default_chunk_budget() -> usize {
    400
}

fn default_refinement_model() -> String {
    "llama3:8b".to_string()
}

fn default_refinement_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_timeout_secs() -> u64 {
    600
}
