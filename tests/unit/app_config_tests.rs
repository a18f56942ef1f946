/*!
 * Tests for configuration loading and validation
 */

use std::path::PathBuf;

use hytran::app_config::{LogLevel, PipelineConfig};

use crate::common::create_temp_dir;

fn two_stage_config() -> PipelineConfig {
    PipelineConfig {
        model_dir: PathBuf::from("models/opus-mt-en-vi"),
        model_id: "opus-mt-en-vi".to_string(),
        ..PipelineConfig::default()
    }
}

#[test]
fn test_default_withNoOverrides_shouldUseDocumentedDefaults() {
    let config = PipelineConfig::default();

    assert_eq!(config.source_language, "en");
    assert_eq!(config.target_language, "vi");
    assert_eq!(config.beam_size, 2);
    assert_eq!(config.chunk_budget, 400);
    assert!(!config.direct_only);
    assert_eq!(config.refinement.model, "llama3:8b");
    assert_eq!(config.refinement.endpoint, "http://localhost:11434");
    assert!((config.refinement.temperature - 0.2).abs() < f32::EPSILON);
    assert_eq!(config.refinement.timeout_secs, 600);
    assert_eq!(config.log_level, LogLevel::Info);
}

#[test]
fn test_validate_withTwoStageConfig_shouldAccept() {
    assert!(two_stage_config().validate().is_ok());
}

#[test]
fn test_validate_withInvalidLanguageCode_shouldReject() {
    let mut config = two_stage_config();
    config.target_language = "notalang".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withZeroBeamSize_shouldReject() {
    let mut config = two_stage_config();
    config.beam_size = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withZeroChunkBudget_shouldReject() {
    let mut config = two_stage_config();
    config.chunk_budget = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withOutOfRangeTemperature_shouldReject() {
    let mut config = two_stage_config();
    config.refinement.temperature = 3.5;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withMissingModelDirInTwoStageMode_shouldReject() {
    let mut config = two_stage_config();
    config.model_dir = PathBuf::new();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withDirectOnlyAndNoModelDir_shouldAccept() {
    let config = PipelineConfig {
        direct_only: true,
        ..PipelineConfig::default()
    };
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_withEmptyRefinementModel_shouldReject() {
    let mut config = two_stage_config();
    config.refinement.model = String::new();
    assert!(config.validate().is_err());
}

#[test]
fn test_fromFile_withSavedConfig_shouldRoundTrip() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("settings.json");

    let mut config = two_stage_config();
    config.refinement.max_tokens = Some(4096);
    config.save_to_file(&path).unwrap();

    let loaded = PipelineConfig::from_file(&path).unwrap();
    assert_eq!(loaded.model_id, "opus-mt-en-vi");
    assert_eq!(loaded.refinement.max_tokens, Some(4096));
    assert_eq!(loaded.chunk_budget, config.chunk_budget);
}

#[test]
fn test_fromFile_withMissingFile_shouldError() {
    assert!(PipelineConfig::from_file("/nonexistent/settings.json").is_err());
}

#[test]
fn test_fromFile_withPartialJson_shouldFillDefaults() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, r#"{"direct_only": true}"#).unwrap();

    let config = PipelineConfig::from_file(&path).unwrap();
    assert!(config.direct_only);
    assert_eq!(config.refinement.model, "llama3:8b");
    assert_eq!(config.chunk_budget, 400);
}
