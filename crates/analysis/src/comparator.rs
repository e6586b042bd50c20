//! Document comparator: page-wise differences between two documents.

use std::fmt::Write as _;
use std::sync::Arc;

use docportal_config::ConditioningConfig;
use docportal_core::error::{Error, Result};
use docportal_core::provider::{Provider, ProviderRequest};
use tracing::{error, info};

use crate::conditioner::PromptMetrics;
use crate::document::Document;
use crate::normalizer::ComparisonResult;
use crate::prompts::{PromptRegistry, PromptType};
use crate::repair::{Reconciler, Stage};
use crate::schema::{ChangeListSchema, RecordSchema};
use crate::validator::RawReply;

const OPERATION: &str = "Document comparison";

/// Build the comparison input from a reference and an actual document.
///
/// Each document is introduced by a header naming its role and source, and
/// each page by its 1-based number, so the model can report changes per page.
pub fn combine_documents(reference: &Document, actual: &Document) -> String {
    let mut combined = String::new();
    for (role, document) in [("Reference", reference), ("Actual", actual)] {
        let _ = writeln!(combined, "<< {role} Document: {} >>", document.source);
        for (number, text) in document.numbered_pages() {
            let _ = writeln!(combined, "--- Page {number} ---");
            let _ = writeln!(combined, "{}", text.trim_end());
        }
        combined.push('\n');
    }
    combined
}

/// Page-wise comparison and what it took to get it.
#[derive(Debug, Clone)]
pub struct ComparisonReport {
    pub result: ComparisonResult,
    pub metrics: PromptMetrics,
    pub stage: Stage,
}

/// Compares two documents through the model and returns a [`ComparisonResult`].
pub struct DocumentComparator {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    large_payload_chars: usize,
    prompts: Arc<PromptRegistry>,
}

impl DocumentComparator {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.0,
            max_tokens: None,
            large_payload_chars: ConditioningConfig::default().large_payload_chars,
            prompts: Arc::new(PromptRegistry::default()),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Threshold above which the combined text is logged as oversized.
    pub fn with_large_payload_chars(mut self, chars: usize) -> Self {
        self.large_payload_chars = chars;
        self
    }

    pub fn with_prompts(mut self, prompts: Arc<PromptRegistry>) -> Self {
        self.prompts = prompts;
        self
    }

    /// Compare the documents in `combined_docs` page by page.
    ///
    /// The combined text is sent whole; only its size is measured.
    pub async fn compare(&self, combined_docs: &str) -> Result<ComparisonReport> {
        self.run(combined_docs).await.map_err(|e| {
            error!(error = %e, "Error in document comparison");
            Error::operation(OPERATION, e)
        })
    }

    async fn run(&self, combined_docs: &str) -> Result<ComparisonReport> {
        let format_instructions = ChangeListSchema::format_instructions();
        let metrics = PromptMetrics::measure(
            "comparison",
            combined_docs,
            combined_docs,
            &format_instructions,
            self.large_payload_chars,
        );
        metrics.log();

        let prompt = self.prompts.render(
            PromptType::DocumentComparison,
            &[
                ("combined_docs", combined_docs),
                ("format_instructions", format_instructions.as_str()),
            ],
        )?;

        let request = ProviderRequest::prompt(&self.model, prompt)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        info!(model = %self.model, provider = self.provider.name(), "Invoking document comparison");
        let response = self.provider.complete(request).await?;
        let reply = RawReply::from_response(&response);
        info!(response_preview = %reply.preview(200), "Comparison reply received");

        let reconciled = Reconciler::new(Arc::clone(&self.provider), &self.model)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
            .reconcile::<ChangeListSchema>(reply)
            .await?;

        let stage = reconciled.stage;
        let result = ComparisonResult::from_records(reconciled.value);
        info!(rows = result.len(), repaired = stage == Stage::Repaired, "Comparison result created");

        Ok(ComparisonReport {
            result,
            metrics,
            stage,
        })
    }
}
