use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for ISO language code handling
///
/// The pipeline configures languages as ISO 639-1 (2-letter) codes, the
/// form multilingual NMT tokenizers expect. These helpers validate codes,
/// resolve display names for prompt templates, and answer whether a target
/// language is expected to produce non-ASCII output (used by the
/// degenerate-output guard in stage 1).
/// Validate that a language code is a known ISO 639-1 code
pub fn validate_language_code(code: &str) -> Result<()> {
    let normalized = code.trim().to_lowercase();

    if normalized.len() == 2 && Language::from_639_1(&normalized).is_some() {
        return Ok(());
    }

    Err(anyhow!("Invalid language code: {}", code))
}

/// Get the English display name for a language code (e.g. "vi" -> "Vietnamese")
///
/// Used when building refinement prompts, which reference the target
/// language by name. Falls back to the code itself for unknown codes.
pub fn get_language_name(code: &str) -> String {
    let normalized = code.trim().to_lowercase();

    Language::from_639_1(&normalized)
        .map(|lang| lang.to_name().to_string())
        .unwrap_or_else(|| code.to_string())
}

/// Check whether two language codes refer to the same language
pub fn language_codes_match(a: &str, b: &str) -> bool {
    let norm_a = a.trim().to_lowercase();
    let norm_b = b.trim().to_lowercase();

    if norm_a == norm_b {
        return true;
    }

    match (Language::from_639_1(&norm_a), Language::from_639_1(&norm_b)) {
        (Some(lang_a), Some(lang_b)) => lang_a == lang_b,
        _ => false,
    }
}

/// Whether translated text in this language is expected to contain a
/// substantial share of non-ASCII characters.
///
/// Latin-script-with-diacritics languages (Vietnamese) and non-Latin
/// scripts qualify; plain-ASCII languages like English do not. Stage 1
/// uses this to flag output that came back in the wrong script.
pub fn expects_non_ascii_output(code: &str) -> bool {
    matches!(
        code.trim().to_lowercase().as_str(),
        "vi" | "zh" | "ja" | "ko" | "th" | "ar" | "ru" | "uk" | "el" | "he" | "hi" | "bn"
    )
}
