//! Prompt registry: named `tera` templates with `{{ variable }}` slots.
//!
//! Substituted values are never re-parsed, so document text containing
//! braces or template syntax is passed through as-is.

use std::collections::HashMap;

use docportal_core::error::Error;
use tera::{Context, Tera};

/// The prompts the pipelines use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptType {
    DocumentAnalysis,
    DocumentComparison,
    ContextualizeQuestion,
    ContextQa,
}

impl PromptType {
    pub const ALL: [PromptType; 4] = [
        PromptType::DocumentAnalysis,
        PromptType::DocumentComparison,
        PromptType::ContextualizeQuestion,
        PromptType::ContextQa,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PromptType::DocumentAnalysis => "document_analysis",
            PromptType::DocumentComparison => "document_comparison",
            PromptType::ContextualizeQuestion => "contextualize_question",
            PromptType::ContextQa => "context_qa",
        }
    }
}

impl std::fmt::Display for PromptType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const DOCUMENT_ANALYSIS: &str = "\
You are a highly capable assistant trained to analyze and summarize documents.
Return ONLY valid JSON matching the exact schema below.

{{ format_instructions }}

Analyze this document:
{{ document_text }}";

const DOCUMENT_COMPARISON: &str = "\
You will be provided with content from two documents. Your tasks are as follows:

1. Compare the content of the two documents page by page.
2. Identify the differences and note the page number of each.
3. Report one entry per page.
4. If a page has no change, report it as 'NO CHANGE'.

Input documents:

{{ combined_docs }}

Your response must follow this format:
{{ format_instructions }}";

const CONTEXTUALIZE_QUESTION: &str = "\
Given the conversation so far and the latest user question, rewrite the question \
so it can be understood without the conversation. Do not answer it. If it is \
already standalone, return it unchanged. Reply with the question only.";

const CONTEXT_QA: &str = "\
You are an assistant that answers questions using only the retrieved context below. \
If the answer is not in the context, say \"I don't know.\" \
Keep the answer concise, at most three sentences.

Context:
{{ context }}";

/// Template sources keyed by [`PromptType`], pre-filled with the built-in prompts.
#[derive(Debug, Clone)]
pub struct PromptRegistry {
    templates: HashMap<PromptType, String>,
}

impl PromptRegistry {
    pub fn new() -> Self {
        let templates = PromptType::ALL
            .into_iter()
            .map(|kind| (kind, Self::builtin(kind).to_string()))
            .collect();
        Self { templates }
    }

    fn builtin(kind: PromptType) -> &'static str {
        match kind {
            PromptType::DocumentAnalysis => DOCUMENT_ANALYSIS,
            PromptType::DocumentComparison => DOCUMENT_COMPARISON,
            PromptType::ContextualizeQuestion => CONTEXTUALIZE_QUESTION,
            PromptType::ContextQa => CONTEXT_QA,
        }
    }

    /// Replace the template for `kind`. Syntax errors surface on render.
    pub fn with_template(mut self, kind: PromptType, template: impl Into<String>) -> Self {
        self.templates.insert(kind, template.into());
        self
    }

    /// Template source for `kind`.
    pub fn get(&self, kind: PromptType) -> Option<&str> {
        self.templates.get(&kind).map(String::as_str)
    }

    /// Render `kind` with `values`. Every variable the template uses must
    /// have a value.
    pub fn render(&self, kind: PromptType, values: &[(&str, &str)]) -> Result<String, Error> {
        let template = self
            .get(kind)
            .ok_or_else(|| Error::Prompt(format!("no template registered for '{kind}'")))?;

        let mut context = Context::new();
        for (name, value) in values {
            context.insert(*name, value);
        }
        Tera::one_off(template, &context, false).map_err(|e| render_error(kind, &e))
    }
}

impl Default for PromptRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Flatten the tera error chain; the variable name sits in a nested cause.
fn render_error(kind: PromptType, error: &tera::Error) -> Error {
    let mut message = format!("{kind}: {error}");
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    Error::Prompt(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_render_with_their_variables() {
        let registry = PromptRegistry::new();

        let analysis = registry
            .render(
                PromptType::DocumentAnalysis,
                &[("format_instructions", "FORMAT"), ("document_text", "BODY")],
            )
            .unwrap();
        assert!(analysis.contains("FORMAT"));
        assert!(analysis.ends_with("Analyze this document:\nBODY"));

        let comparison = registry
            .render(
                PromptType::DocumentComparison,
                &[("combined_docs", "DOCS"), ("format_instructions", "FORMAT")],
            )
            .unwrap();
        assert!(comparison.contains("Input documents:\n\nDOCS"));

        let rewrite = registry.render(PromptType::ContextualizeQuestion, &[]).unwrap();
        assert!(rewrite.contains("Do not answer it."));

        let qa = registry
            .render(PromptType::ContextQa, &[("context", "chunk")])
            .unwrap();
        assert!(qa.ends_with("Context:\nchunk"));
    }

    #[test]
    fn values_are_not_rendered_again() {
        let registry = PromptRegistry::new();
        let rendered = registry
            .render(
                PromptType::DocumentAnalysis,
                &[
                    ("format_instructions", "{\"Title\": string}"),
                    ("document_text", "uses {{ format_instructions }} and {% if x %} literally"),
                ],
            )
            .unwrap();
        assert!(rendered.contains("{\"Title\": string}"));
        assert!(rendered.contains("uses {{ format_instructions }} and {% if x %} literally"));
    }

    #[test]
    fn missing_variable_is_error() {
        let err = PromptRegistry::new()
            .render(PromptType::ContextQa, &[])
            .unwrap_err();
        assert!(matches!(err, Error::Prompt(msg) if msg.contains("context_qa") && msg.contains("`context`")));
    }

    #[test]
    fn broken_override_is_error() {
        let registry =
            PromptRegistry::new().with_template(PromptType::ContextQa, "Only this: {{ context");
        assert!(matches!(
            registry.render(PromptType::ContextQa, &[("context", "chunk")]),
            Err(Error::Prompt(_))
        ));
    }

    #[test]
    fn registry_override() {
        let registry = PromptRegistry::new()
            .with_template(PromptType::ContextQa, "Only this: {{ context }}");
        assert_eq!(registry.get(PromptType::ContextQa), Some("Only this: {{ context }}"));
        let rendered = registry
            .render(PromptType::ContextQa, &[("context", "chunk")])
            .unwrap();
        assert_eq!(rendered, "Only this: chunk");
    }

    #[test]
    fn prompt_type_names() {
        let names: Vec<&str> = PromptType::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "document_analysis",
                "document_comparison",
                "contextualize_question",
                "context_qa"
            ]
        );
    }
}
