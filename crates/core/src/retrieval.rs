//! Retriever trait: the narrow interface to document retrieval.
//!
//! Index construction and similarity search live behind this trait; the
//! conversational pipeline only needs ranked chunks tagged with their
//! source and page.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::RetrievalError;

/// A ranked piece of document text returned by a retriever.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextChunk {
    /// Where the text came from (file name, URL, ...)
    pub source: String,

    /// 1-based page within the source, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,

    /// The chunk text
    pub content: String,

    /// Relevance score assigned by the retriever (higher is better)
    #[serde(default)]
    pub score: f32,
}

#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return up to `k` chunks ranked by relevance to `query`.
    async fn retrieve(
        &self,
        query: &str,
        k: usize,
    ) -> std::result::Result<Vec<ContextChunk>, RetrievalError>;
}
