/*!
 * Tests for the stage-2 refiner: prompt budget, artifact stripping, and
 * fallback policy
 */

use std::sync::Arc;

use hytran::errors::Stage2Error;
use hytran::providers::mock::MockRefinementProvider;
use hytran::stage2::{Refiner, refine_max_tokens, strip_artifacts};

fn refiner_over(provider: Arc<MockRefinementProvider>) -> Refiner {
    Refiner::new(provider, "llama3:8b", 0.2, None, "en", "vi")
}

#[test]
fn test_refineMaxTokens_withShortInput_shouldClampToFloor() {
    assert_eq!(refine_max_tokens(0, None), 2048);
    assert_eq!(refine_max_tokens(100, None), 2048);
}

#[test]
fn test_refineMaxTokens_withMidRangeInput_shouldScale() {
    // 10000 / 2 + 500 = 5500
    assert_eq!(refine_max_tokens(10_000, None), 5500);
}

#[test]
fn test_refineMaxTokens_withHugeInput_shouldClampToCeiling() {
    assert_eq!(refine_max_tokens(100_000, None), 16384);
}

#[test]
fn test_refineMaxTokens_withConfiguredCap_shouldLowerCeiling() {
    assert_eq!(refine_max_tokens(10_000, Some(4096)), 4096);
    // A cap below the floor wins over the floor
    assert_eq!(refine_max_tokens(10_000, Some(1024)), 1024);
}

#[test]
fn test_stripArtifacts_withLabelPrefix_shouldRemoveIt() {
    assert_eq!(
        strip_artifacts("Translation: Xin chào thế giới", &["Translation:"]),
        "Xin chào thế giới"
    );
}

#[test]
fn test_stripArtifacts_withoutPrefix_shouldReturnTrimmedInput() {
    assert_eq!(
        strip_artifacts("  Xin chào thế giới  ", &["Translation:"]),
        "Xin chào thế giới"
    );
}

#[test]
fn test_stripArtifacts_withMidTextLabel_shouldNotTouchIt() {
    assert_eq!(
        strip_artifacts("Xin chào. Translation: is a word.", &["Translation:"]),
        "Xin chào. Translation: is a word."
    );
}

#[tokio::test]
async fn test_refine_withLabelledResponse_shouldStripArtifact() {
    let provider = Arc::new(
        MockRefinementProvider::working().with_response("Improved translation: Xin chào thế giới"),
    );
    let refiner = refiner_over(provider);

    let refined = refiner.refine("Hello world", "Xin chao the gioi").await.unwrap();

    assert_eq!(refined, "Xin chào thế giới");
}

#[tokio::test]
async fn test_refine_withEmptyResponse_shouldFallBackToRawTranslation() {
    let provider = Arc::new(MockRefinementProvider::empty());
    let refiner = refiner_over(provider);

    let refined = refiner.refine("Hello world", "Xin chào thế giới").await.unwrap();

    assert_eq!(refined, "Xin chào thế giới");
}

#[tokio::test]
async fn test_refine_withFailingProvider_shouldReturnProviderError() {
    let provider = Arc::new(MockRefinementProvider::failing());
    let refiner = refiner_over(provider);

    let result = refiner.refine("Hello world", "Xin chào").await;

    assert!(matches!(result, Err(Stage2Error::Provider(_))));
}

#[tokio::test]
async fn test_refine_withTimingOutProvider_shouldSurfaceDistinctTimeout() {
    let provider = Arc::new(MockRefinementProvider::timing_out());
    let refiner = refiner_over(provider);

    let result = refiner.refine("Hello world", "Xin chào").await;

    assert!(matches!(result, Err(Stage2Error::Timeout(_))));
}

#[tokio::test]
async fn test_refine_withRequest_shouldCarryPromptBudgetAndStops() {
    let provider = Arc::new(MockRefinementProvider::working());
    let refiner = refiner_over(provider.clone());

    let raw = "Xin chào thế giới";
    refiner.refine("Hello world", raw).await.unwrap();

    let requests = provider.seen_requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.model, "llama3:8b");
    assert_eq!(request.max_tokens, refine_max_tokens(raw.len(), None));
    assert!(request.prompt.contains("Hello world"));
    assert!(request.prompt.contains(raw));
    assert!(request.prompt.contains("Vietnamese"));
    assert!(request.system.contains("Vietnamese"));
    assert!(!request.stop.is_empty());
    assert_eq!(request.repeat_penalty, None);
}

#[tokio::test]
async fn test_translateDirect_withWorkingProvider_shouldStripArtifactAndUsePenalty() {
    let provider =
        Arc::new(MockRefinementProvider::working().with_response("Translation: Xin chào"));
    let refiner = refiner_over(provider.clone());

    let translation = refiner.translate_direct("Hello").await.unwrap();

    assert_eq!(translation, "Xin chào");
    let request = &provider.seen_requests()[0];
    assert_eq!(request.repeat_penalty, Some(1.2));
    assert!((request.temperature - 0.3).abs() < f32::EPSILON);
    assert!(request.prompt.contains("English"));
}

#[tokio::test]
async fn test_refineWith_withTemperatureOverride_shouldUseOverride() {
    let provider = Arc::new(MockRefinementProvider::working());
    let refiner = refiner_over(provider.clone());

    refiner.refine_with("Hello", "Xin chào", 0.9).await.unwrap();

    let request = &provider.seen_requests()[0];
    assert!((request.temperature - 0.9).abs() < f32::EPSILON);
}
