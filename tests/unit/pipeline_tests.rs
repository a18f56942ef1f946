/*!
 * Tests for pipeline construction checks and the result envelope
 */

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use hytran::backend::Device;
use hytran::backend::mock::{MockBackend, MockLoader};
use hytran::errors::ConstructionError;
use hytran::pipeline::{FailedStage, TranslationPipeline, TranslationRequest};
use hytran::providers::mock::MockRefinementProvider;

use crate::common::{create_temp_dir, direct_config, test_config};

#[tokio::test]
async fn test_new_withValidConfigAndBackends_shouldConstruct() {
    let model_dir = create_temp_dir().unwrap();
    let loader = MockLoader::working();
    let provider = Arc::new(MockRefinementProvider::working());

    let pipeline =
        TranslationPipeline::new(test_config(model_dir.path().to_path_buf()), &loader, provider)
            .await;

    assert!(pipeline.is_ok());
}

#[tokio::test]
async fn test_new_withMissingModelDir_shouldFailConstruction() {
    let loader = MockLoader::working();
    let provider = Arc::new(MockRefinementProvider::working());
    let config = test_config(PathBuf::from("/nonexistent/model/dir"));

    let result = TranslationPipeline::new(config, &loader, provider).await;

    assert!(matches!(result, Err(ConstructionError::ModelDirMissing(_))));
}

#[tokio::test]
async fn test_new_withUnreachableRefinementHost_shouldFailConstruction() {
    let model_dir = create_temp_dir().unwrap();
    let loader = MockLoader::working();
    let provider = Arc::new(MockRefinementProvider::unreachable());

    let result =
        TranslationPipeline::new(test_config(model_dir.path().to_path_buf()), &loader, provider)
            .await;

    assert!(matches!(
        result,
        Err(ConstructionError::RefinementUnreachable { .. })
    ));
}

#[tokio::test]
async fn test_new_withCudaOnlyFailure_shouldFallBackToCpu() {
    let model_dir = create_temp_dir().unwrap();
    let loader = MockLoader::cpu_only();
    let provider = Arc::new(MockRefinementProvider::working());

    let pipeline =
        TranslationPipeline::new(test_config(model_dir.path().to_path_buf()), &loader, provider)
            .await;

    assert!(pipeline.is_ok());
    assert_eq!(loader.attempted_devices(), vec![Device::Cuda, Device::Cpu]);
}

#[tokio::test]
async fn test_new_withAllDevicesFailing_shouldFailConstruction() {
    let model_dir = create_temp_dir().unwrap();
    let loader = MockLoader::failing();
    let provider = Arc::new(MockRefinementProvider::working());

    let result =
        TranslationPipeline::new(test_config(model_dir.path().to_path_buf()), &loader, provider)
            .await;

    assert!(matches!(result, Err(ConstructionError::BackendInit(_))));
    assert_eq!(loader.attempted_devices(), vec![Device::Cuda, Device::Cpu]);
}

#[tokio::test]
async fn test_new_withMissingModelTag_shouldPullOnce() {
    let model_dir = create_temp_dir().unwrap();
    let loader = MockLoader::working();
    let provider = Arc::new(MockRefinementProvider::working().with_models(vec![]));

    let pipeline = TranslationPipeline::new(
        test_config(model_dir.path().to_path_buf()),
        &loader,
        provider.clone(),
    )
    .await;

    assert!(pipeline.is_ok());
    assert_eq!(provider.pulled_models(), vec!["llama3:8b".to_string()]);
}

#[tokio::test]
async fn test_new_withPresentModelTag_shouldNotPull() {
    let model_dir = create_temp_dir().unwrap();
    let loader = MockLoader::working();
    let provider = Arc::new(MockRefinementProvider::working());

    TranslationPipeline::new(
        test_config(model_dir.path().to_path_buf()),
        &loader,
        provider.clone(),
    )
    .await
    .unwrap();

    assert!(provider.pulled_models().is_empty());
}

#[tokio::test]
async fn test_translate_withEmptyInput_shouldShortCircuitWithoutBackendCalls() {
    let model_dir = create_temp_dir().unwrap();
    let backend = Arc::new(MockBackend::working_m2m100());
    let backend_calls = backend.call_counter();
    let loader = MockLoader::with_shared_backend(backend);
    let provider = Arc::new(MockRefinementProvider::working());
    let pipeline = TranslationPipeline::new(
        test_config(model_dir.path().to_path_buf()),
        &loader,
        provider.clone(),
    )
    .await
    .unwrap();

    let result = pipeline.translate_text("   ").await;

    let error = result.error.expect("empty input must be an error");
    assert_eq!(error.stage, FailedStage::Input);
    assert_eq!(error.message, "empty input");
    assert_eq!(result.raw_translation, "");
    assert_eq!(result.refined_translation, "");
    assert_eq!(result.time_stage1_sec, 0.0);
    assert_eq!(result.time_stage2_sec, 0.0);
    assert_eq!(backend_calls.load(Ordering::SeqCst), 0);
    assert_eq!(provider.call_counter().load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_translate_withStage1Failure_shouldShortCircuitRefinement() {
    let model_dir = create_temp_dir().unwrap();
    let backend = Arc::new(MockBackend::failing());
    let loader = MockLoader::with_shared_backend(backend);
    let provider = Arc::new(MockRefinementProvider::working());
    let pipeline = TranslationPipeline::new(
        test_config(model_dir.path().to_path_buf()),
        &loader,
        provider.clone(),
    )
    .await
    .unwrap();

    let result = pipeline.translate_text("Hello world.").await;

    let error = result.error.expect("stage-1 failure must surface");
    assert_eq!(error.stage, FailedStage::Translation);
    assert_eq!(result.raw_translation, "");
    assert_eq!(result.refined_translation, "");
    assert_eq!(result.time_stage2_sec, 0.0);
    // Refinement was never attempted
    assert_eq!(provider.call_counter().load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_translate_withStage2HardFailure_shouldPreserveRawTranslation() {
    let model_dir = create_temp_dir().unwrap();
    let backend = Arc::new(MockBackend::working_m2m100());
    let loader = MockLoader::with_shared_backend(backend);
    let provider = Arc::new(MockRefinementProvider::failing());
    let pipeline = TranslationPipeline::new(
        test_config(model_dir.path().to_path_buf()),
        &loader,
        provider,
    )
    .await
    .unwrap();

    let result = pipeline.translate_text("Hello world.").await;

    let error = result.error.as_ref().expect("stage-2 failure must surface");
    assert_eq!(error.stage, FailedStage::Refinement);
    assert_eq!(result.raw_translation, "Hello world.");
    assert_eq!(result.refined_translation, "");
    assert_eq!(result.best_translation(), "Hello world.");
    assert_eq!(result.time_stage2_sec, 0.0);
}

#[tokio::test]
async fn test_translate_withStage2Timeout_shouldTagRefinementStage() {
    let model_dir = create_temp_dir().unwrap();
    let backend = Arc::new(MockBackend::working_m2m100());
    let loader = MockLoader::with_shared_backend(backend);
    let provider = Arc::new(MockRefinementProvider::timing_out());
    let pipeline = TranslationPipeline::new(
        test_config(model_dir.path().to_path_buf()),
        &loader,
        provider,
    )
    .await
    .unwrap();

    let result = pipeline.translate_text("Hello world.").await;

    let error = result.error.expect("timeout must surface");
    assert_eq!(error.stage, FailedStage::Refinement);
    assert!(error.message.contains("timed out"));
    assert_eq!(result.raw_translation, "Hello world.");
}

#[tokio::test]
async fn test_translate_withEmptyRefinementResponse_shouldFallBackToRaw() {
    let model_dir = create_temp_dir().unwrap();
    let backend = Arc::new(MockBackend::working_m2m100());
    let loader = MockLoader::with_shared_backend(backend);
    let provider = Arc::new(MockRefinementProvider::empty());
    let pipeline = TranslationPipeline::new(
        test_config(model_dir.path().to_path_buf()),
        &loader,
        provider,
    )
    .await
    .unwrap();

    let result = pipeline.translate_text("Hello world.").await;

    assert!(!result.is_err());
    assert_eq!(result.raw_translation, "Hello world.");
    assert_eq!(result.refined_translation, "Hello world.");
}

#[tokio::test]
async fn test_translate_withDirectMode_shouldAttributeTimeToStage1Slot() {
    let loader = MockLoader::working();
    let provider = Arc::new(MockRefinementProvider::working().with_response("Xin chào"));
    let pipeline = TranslationPipeline::new(direct_config(), &loader, provider.clone())
        .await
        .unwrap();

    let result = pipeline.translate_text("Hello").await;

    assert!(!result.is_err());
    assert_eq!(result.raw_translation, "Xin chào");
    assert_eq!(result.refined_translation, "Xin chào");
    assert_eq!(result.time_stage2_sec, 0.0);
    assert_eq!(provider.call_counter().load(Ordering::SeqCst), 1);
    // Stage 1 was never constructed, so no devices were attempted
    assert!(loader.attempted_devices().is_empty());
}

#[tokio::test]
async fn test_translate_withTemperatureOverride_shouldReachProvider() {
    let model_dir = create_temp_dir().unwrap();
    let backend = Arc::new(MockBackend::working_m2m100());
    let loader = MockLoader::with_shared_backend(backend);
    let provider = Arc::new(MockRefinementProvider::working());
    let pipeline = TranslationPipeline::new(
        test_config(model_dir.path().to_path_buf()),
        &loader,
        provider.clone(),
    )
    .await
    .unwrap();

    let request = TranslationRequest::new("Hello world.").temperature(0.9);
    pipeline.translate(&request).await;

    let seen = provider.seen_requests();
    assert_eq!(seen.len(), 1);
    assert!((seen[0].temperature - 0.9).abs() < f32::EPSILON);
}

#[tokio::test]
async fn test_new_withInvalidConfig_shouldFailBeforeAnyCheck() {
    let loader = MockLoader::working();
    let provider = Arc::new(MockRefinementProvider::working());
    let mut config = direct_config();
    config.beam_size = 0;

    let result = TranslationPipeline::new(config, &loader, provider).await;

    assert!(matches!(result, Err(ConstructionError::InvalidConfig(_))));
}
