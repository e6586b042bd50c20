//! Document pipelines for DocPortal.
//!
//! Every pipeline that expects structured output from the model runs the
//! same reconciliation path:
//!
//! 1. **Condition** the outbound document text (head/tail truncation)
//! 2. **Call** the model through the configured provider
//! 3. **Validate** the reply against a fixed record schema
//! 4. **Repair** once on failure, then validate again
//! 5. **Normalize** the records into a deterministic result
//!
//! The conversational pipeline sits beside it and keeps per-session history
//! in a [`docportal_memory::SessionMemoryStore`].

pub mod analyzer;
pub mod chat;
pub mod comparator;
pub mod conditioner;
pub mod document;
pub mod normalizer;
pub mod prompts;
pub mod repair;
pub mod retriever;
pub mod schema;
pub mod validator;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use analyzer::{AnalysisReport, DocumentAnalyzer};
pub use chat::{ConversationalRag, RagAnswer};
pub use comparator::{ComparisonReport, DocumentComparator, combine_documents};
pub use conditioner::{InputConditioner, PromptMetrics, SEPARATOR, trim_for_prompt};
pub use document::Document;
pub use normalizer::{ComparisonResult, ComparisonRow, NormalizedMetadata};
pub use prompts::{PromptRegistry, PromptType};
pub use repair::{Reconciled, Reconciler, Stage};
pub use retriever::KeywordRetriever;
pub use schema::{ChangeListSchema, MetadataSchema, RecordSchema};
pub use validator::{RawReply, validate};
