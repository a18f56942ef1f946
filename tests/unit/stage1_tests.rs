/*!
 * Tests for the stage-1 translator and its adaptive decoding bounds
 */

use std::sync::Arc;
use std::sync::atomic::Ordering;

use hytran::backend::TranslationBackend;
use hytran::backend::mock::MockBackend;
use hytran::errors::Stage1Error;
use hytran::stage1::{Stage1Translator, assess_output, max_decoding_length, min_decoding_length};
use hytran::tokenizer::TokenizerAdapter;

fn translator_over(backend: MockBackend) -> Stage1Translator {
    let backend: Arc<dyn TranslationBackend> = Arc::new(backend);
    let tokenizer = TokenizerAdapter::new(backend.clone(), "en", "vi");
    Stage1Translator::new(backend, tokenizer, 2, 400)
}

#[test]
fn test_maxDecodingLength_withShortInput_shouldClampToFloor() {
    assert_eq!(max_decoding_length(0), 512);
    assert_eq!(max_decoding_length(10), 512);
    assert_eq!(max_decoding_length(300), 512);
}

#[test]
fn test_maxDecodingLength_withMidRangeInput_shouldScaleLinearly() {
    // round(400 * 1.5) + 50 = 650
    assert_eq!(max_decoding_length(400), 650);
    // round(1000 * 1.5) + 50 = 1550
    assert_eq!(max_decoding_length(1000), 1550);
}

#[test]
fn test_maxDecodingLength_withHugeInput_shouldClampToCeiling() {
    assert_eq!(max_decoding_length(2000), 2048);
    assert_eq!(max_decoding_length(100_000), 2048);
}

#[test]
fn test_maxDecodingLength_withIncreasingInput_shouldBeMonotonic() {
    let mut previous = 0;
    for source_tokens in 0..3000 {
        let bound = max_decoding_length(source_tokens);
        assert!(bound >= previous, "bound decreased at {}", source_tokens);
        assert!((512..=2048).contains(&bound));
        previous = bound;
    }
}

#[test]
fn test_minDecodingLength_withInput_shouldRoundEightyPercent() {
    assert_eq!(min_decoding_length(0), 0);
    assert_eq!(min_decoding_length(10), 8);
    assert_eq!(min_decoding_length(101), 81);
}

#[test]
fn test_assessOutput_withEmptyOutput_shouldFlagEmpty() {
    let assessment = assess_output("some source text", "   ", true);
    assert!(assessment.empty);
    assert!(assessment.is_degenerate());
}

#[test]
fn test_assessOutput_withImplausiblyShortOutput_shouldFlagShort() {
    let source = "a reasonably long source sentence with many characters in it";
    let assessment = assess_output(source, "ngắn", true);
    assert!(assessment.implausibly_short);
    assert!(assessment.is_degenerate());
}

#[test]
fn test_assessOutput_withAsciiOnlyOutputForDiacriticTarget_shouldFlagWrongScript() {
    let assessment = assess_output(
        "hello world",
        "plain ascii output",
        true,
    );
    assert!(assessment.wrong_script);
}

#[test]
fn test_assessOutput_withPlausibleVietnameseOutput_shouldNotFlag() {
    let assessment = assess_output(
        "hello world everyone",
        "xin chào thế giới và mọi người",
        true,
    );
    assert!(!assessment.is_degenerate());
}

#[test]
fn test_assessOutput_withAsciiTargetLanguage_shouldNotFlagScript() {
    let assessment = assess_output("bonjour tout le monde", "hello everyone out there", false);
    assert!(!assessment.wrong_script);
}

#[test]
fn test_translate_withEchoBackend_shouldReturnReassembledText() {
    let translator = translator_over(MockBackend::working_m2m100());

    let output = translator.translate("Hello world! This is a test.").unwrap();

    assert_eq!(output, "Hello world! This is a test.");
}

#[test]
fn test_translate_withMultipleChunks_shouldPreserveChunkOrder() {
    let backend = MockBackend::working_m2m100();
    let counter = backend.call_counter();
    let backend: Arc<dyn TranslationBackend> = Arc::new(backend);
    let tokenizer = TokenizerAdapter::new(backend.clone(), "en", "vi");
    let translator = Stage1Translator::new(backend, tokenizer, 2, 5);

    let output = translator
        .translate("One two three four. Five six seven eight. Nine ten eleven twelve.")
        .unwrap();

    // One backend call per chunk, outputs joined in input order
    assert!(counter.load(Ordering::SeqCst) >= 2);
    assert!(output.starts_with("One two three four."));
    assert!(output.ends_with("Nine ten eleven twelve."));
}

#[test]
fn test_translate_withFailingBackend_shouldReturnBackendError() {
    let translator = translator_over(MockBackend::failing());

    let result = translator.translate("Hello world.");

    assert!(matches!(result, Err(Stage1Error::Backend(_))));
}

#[test]
fn test_translate_withEmptyHypotheses_shouldSkipChunkAndReturnEmpty() {
    let translator = translator_over(MockBackend::empty());

    let output = translator.translate("Hello world.").unwrap();

    assert_eq!(output, "");
}
