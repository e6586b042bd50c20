//! Document analyzer: structured metadata extraction for one document.

use std::collections::BTreeSet;
use std::sync::Arc;

use docportal_config::ConditioningConfig;
use docportal_core::error::{Error, Result};
use docportal_core::provider::{Provider, ProviderRequest};
use docportal_core::record::MetadataRecord;
use tracing::{error, info};

use crate::conditioner::{InputConditioner, PromptMetrics};
use crate::normalizer::NormalizedMetadata;
use crate::prompts::{PromptRegistry, PromptType};
use crate::repair::{Reconciler, Stage};
use crate::schema::{MetadataSchema, RecordSchema};
use crate::validator::RawReply;

const OPERATION: &str = "Metadata extraction";

/// Extracted metadata plus what it took to get it.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub metadata: MetadataRecord,
    /// Wire names of the fields that carry a value.
    pub populated: BTreeSet<&'static str>,
    pub metrics: PromptMetrics,
    pub stage: Stage,
}

/// Extracts a [`MetadataRecord`] from document text.
pub struct DocumentAnalyzer {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    conditioner: InputConditioner,
    prompts: Arc<PromptRegistry>,
}

impl DocumentAnalyzer {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.0,
            max_tokens: None,
            conditioner: InputConditioner::default(),
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

    pub fn with_conditioning(mut self, config: ConditioningConfig) -> Self {
        self.conditioner = InputConditioner::new(config);
        self
    }

    pub fn with_prompts(mut self, prompts: Arc<PromptRegistry>) -> Self {
        self.prompts = prompts;
        self
    }

    /// Analyze a document's text and extract structured metadata.
    pub async fn analyze(&self, document_text: &str) -> Result<AnalysisReport> {
        self.run(document_text).await.map_err(|e| {
            error!(error = %e, "Metadata analysis failed");
            Error::operation(OPERATION, e)
        })
    }

    async fn run(&self, document_text: &str) -> Result<AnalysisReport> {
        let format_instructions = MetadataSchema::format_instructions();
        let conditioned = self
            .conditioner
            .condition("metadata", document_text, &format_instructions)?;

        let prompt = self.prompts.render(
            PromptType::DocumentAnalysis,
            &[
                ("format_instructions", format_instructions.as_str()),
                ("document_text", conditioned.text.as_str()),
            ],
        )?;

        let request = ProviderRequest::prompt(&self.model, prompt)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        info!(model = %self.model, provider = self.provider.name(), "Invoking metadata extraction");
        let response = self.provider.complete(request).await?;

        let reconciled = Reconciler::new(Arc::clone(&self.provider), &self.model)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
            .reconcile::<MetadataSchema>(RawReply::from_response(&response))
            .await?;

        let stage = reconciled.stage;
        let normalized = NormalizedMetadata::from_record(reconciled.value);
        info!(
            keys = ?normalized.populated,
            repaired = stage == Stage::Repaired,
            "Metadata extraction successful"
        );

        Ok(AnalysisReport {
            metadata: normalized.record,
            populated: normalized.populated,
            metrics: conditioned.metrics,
            stage,
        })
    }
}
