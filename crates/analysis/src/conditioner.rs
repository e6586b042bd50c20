//! Input conditioning: bounds the document text sent to the model.
//!
//! Long documents keep their head (title, abstract, introduction) and their
//! tail (references, footers) and drop the middle. All lengths are counted
//! in chars so a cut never lands inside a code point.

use docportal_config::ConditioningConfig;
use docportal_core::error::ConditioningError;
use tracing::{info, warn};

/// Marker inserted where the middle of a long document was dropped.
pub const SEPARATOR: &str = "\n\n--- [TRUNCATED MIDDLE CONTENT] ---\n\n";

/// Keep the first `head_chars` and last `tail_chars` characters of `text`.
///
/// Text that already fits in `head_chars + tail_chars` is returned unchanged.
pub fn trim_for_prompt(
    text: &str,
    head_chars: usize,
    tail_chars: usize,
) -> Result<String, ConditioningError> {
    if head_chars == 0 && tail_chars == 0 {
        return Err(ConditioningError::EmptyBudget);
    }

    let total = text.chars().count();
    if total <= head_chars.saturating_add(tail_chars) {
        return Ok(text.to_string());
    }

    let head_end = byte_offset(text, head_chars);
    let tail_start = byte_offset(text, total - tail_chars);

    let mut trimmed = String::with_capacity(head_end + SEPARATOR.len() + text.len() - tail_start);
    trimmed.push_str(&text[..head_end]);
    trimmed.push_str(SEPARATOR);
    trimmed.push_str(&text[tail_start..]);
    Ok(trimmed)
}

/// Byte index of the `char_index`-th char, or the end of the string.
fn byte_offset(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// Estimate the token count for a string.
///
/// Heuristic: 1 token ≈ 4 characters, never less than one.
pub fn estimate_tokens(text: &str) -> usize {
    (text.chars().count() / 4).max(1)
}

/// Size of an outbound prompt, measured before the model call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptMetrics {
    /// Pipeline step the prompt belongs to (`metadata`, `comparison`).
    pub stage: &'static str,
    pub original_chars: usize,
    pub trimmed_chars: usize,
    pub format_instructions_chars: usize,
    pub approx_tokens_document: usize,
    pub approx_tokens_format_instructions: usize,
    pub approx_tokens_total: usize,
    /// The trimmed text is above the large-payload threshold.
    pub oversized: bool,
}

impl PromptMetrics {
    pub fn measure(
        stage: &'static str,
        original: &str,
        trimmed: &str,
        format_instructions: &str,
        large_payload_chars: usize,
    ) -> Self {
        let trimmed_chars = trimmed.chars().count();
        let approx_tokens_document = estimate_tokens(trimmed);
        let approx_tokens_format_instructions = estimate_tokens(format_instructions);
        Self {
            stage,
            original_chars: original.chars().count(),
            trimmed_chars,
            format_instructions_chars: format_instructions.chars().count(),
            approx_tokens_document,
            approx_tokens_format_instructions,
            approx_tokens_total: approx_tokens_document + approx_tokens_format_instructions,
            oversized: trimmed_chars > large_payload_chars,
        }
    }

    /// Emit the metrics as one info event, plus a warning when oversized.
    pub fn log(&self) {
        info!(
            stage = self.stage,
            original_length_chars = self.original_chars,
            trimmed_length_chars = self.trimmed_chars,
            format_instructions_chars = self.format_instructions_chars,
            approx_tokens_document = self.approx_tokens_document,
            approx_tokens_format_instructions = self.approx_tokens_format_instructions,
            approx_tokens_total = self.approx_tokens_total,
            "Prepared prompt payload"
        );
        if self.oversized {
            warn!(
                stage = self.stage,
                trimmed_length_chars = self.trimmed_chars,
                "Prompt text still large after conditioning"
            );
        }
    }
}

/// Conditioned document text and its measurements.
#[derive(Debug, Clone)]
pub struct Conditioned {
    pub text: String,
    pub metrics: PromptMetrics,
}

/// Applies the configured head/tail budget to outbound document text.
#[derive(Debug, Clone, Default)]
pub struct InputConditioner {
    config: ConditioningConfig,
}

impl InputConditioner {
    pub fn new(config: ConditioningConfig) -> Self {
        Self { config }
    }

    /// Trim `text`, measure the result against `format_instructions`, and log
    /// it under `stage`.
    ///
    /// An oversized result is logged but still returned.
    pub fn condition(
        &self,
        stage: &'static str,
        text: &str,
        format_instructions: &str,
    ) -> Result<Conditioned, ConditioningError> {
        let trimmed = trim_for_prompt(text, self.config.head_chars, self.config.tail_chars)?;
        let metrics = PromptMetrics::measure(
            stage,
            text,
            &trimmed,
            format_instructions,
            self.config.large_payload_chars,
        );
        metrics.log();
        Ok(Conditioned {
            text: trimmed,
            metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_unchanged() {
        let text = "a".repeat(100);
        assert_eq!(trim_for_prompt(&text, 60, 40).unwrap(), text);
    }

    #[test]
    fn long_text_keeps_exact_head_and_tail() {
        let text: String = (0..200).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let trimmed = trim_for_prompt(&text, 50, 20).unwrap();

        assert_eq!(trimmed.chars().count(), 50 + SEPARATOR.chars().count() + 20);
        assert!(trimmed.starts_with(&text[..50]));
        assert!(trimmed.ends_with(&text[180..]));
        assert!(trimmed.contains(SEPARATOR));
    }

    #[test]
    fn default_budgets() {
        let text = "x".repeat(20_000);
        let config = ConditioningConfig::default();
        let trimmed = trim_for_prompt(&text, config.head_chars, config.tail_chars).unwrap();
        assert_eq!(trimmed.len(), 15_000 + SEPARATOR.len() + 3_000);
    }

    #[test]
    fn counts_chars_not_bytes() {
        let text = "é".repeat(30);
        let trimmed = trim_for_prompt(&text, 5, 5).unwrap();
        assert_eq!(trimmed, format!("{}{SEPARATOR}{}", "é".repeat(5), "é".repeat(5)));
    }

    #[test]
    fn zero_tail_keeps_only_head() {
        let trimmed = trim_for_prompt("abcdefghij", 4, 0).unwrap();
        assert_eq!(trimmed, format!("abcd{SEPARATOR}"));
    }

    #[test]
    fn both_budgets_zero_is_error() {
        assert!(matches!(
            trim_for_prompt("abc", 0, 0),
            Err(ConditioningError::EmptyBudget)
        ));
    }

    #[test]
    fn token_estimate_has_floor() {
        assert_eq!(estimate_tokens(""), 1);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens(&"a".repeat(100)), 25);
    }

    #[test]
    fn metrics_flag_oversized() {
        let big = "x".repeat(60_000);
        let metrics = PromptMetrics::measure("comparison", &big, &big, "{}", 50_000);
        assert!(metrics.oversized);
        assert_eq!(metrics.approx_tokens_document, 15_000);
        assert_eq!(metrics.approx_tokens_total, 15_001);
    }

    #[test]
    fn conditioner_reports_original_and_trimmed() {
        let conditioner = InputConditioner::new(ConditioningConfig {
            head_chars: 10,
            tail_chars: 5,
            large_payload_chars: 50_000,
        });
        let text = "y".repeat(100);
        let conditioned = conditioner
            .condition("summary", &text, "instructions")
            .unwrap();
        assert_eq!(conditioned.metrics.stage, "summary");
        assert_eq!(conditioned.metrics.original_chars, 100);
        assert_eq!(
            conditioned.metrics.trimmed_chars,
            15 + SEPARATOR.chars().count()
        );
        assert!(!conditioned.metrics.oversized);
    }
}
