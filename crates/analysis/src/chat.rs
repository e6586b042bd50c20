//! Conversational RAG: history-aware retrieval and grounded answers.
//!
//! # Flow
//!
//! 1. Load the session history from the memory store
//! 2. If there is history, rewrite the question into a standalone query
//! 3. Retrieve the top-k chunks for that query
//! 4. Answer from the chunks, with the history as prior turns
//! 5. Append the question and the answer to the session

use std::sync::Arc;

use docportal_core::error::{Error, Result};
use docportal_core::message::{Message, SessionId};
use docportal_core::provider::{Provider, ProviderRequest};
use docportal_core::retrieval::{ContextChunk, Retriever};
use docportal_memory::SessionMemoryStore;
use tracing::{debug, error, info, warn};

use crate::prompts::{PromptRegistry, PromptType};

const OPERATION: &str = "Conversational answer";
const DEFAULT_TOP_K: usize = 5;

/// Result of one conversational turn.
#[derive(Debug, Clone)]
pub struct RagAnswer {
    /// The generated answer.
    pub answer: String,
    /// The query sent to the retriever (the rewritten question, if any).
    pub retrieval_query: String,
    /// Chunks the answer was grounded on.
    pub sources: Vec<ContextChunk>,
}

/// Answers questions for one session against a retriever.
pub struct ConversationalRag {
    session_id: SessionId,
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    retriever: Arc<dyn Retriever>,
    store: SessionMemoryStore,
    prompts: Arc<PromptRegistry>,
    top_k: usize,
}

impl ConversationalRag {
    pub fn new(
        session_id: SessionId,
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        retriever: Arc<dyn Retriever>,
        store: SessionMemoryStore,
    ) -> Self {
        info!(session_id = %session_id, "Conversational RAG created");
        Self {
            session_id,
            provider,
            model: model.into(),
            temperature: 0.0,
            max_tokens: None,
            retriever,
            store,
            prompts: Arc::new(PromptRegistry::default()),
            top_k: DEFAULT_TOP_K,
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

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_prompts(mut self, prompts: Arc<PromptRegistry>) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Answer `question` and record the exchange in the session history.
    pub async fn invoke(&self, question: &str) -> Result<RagAnswer> {
        self.run(question).await.map_err(|e| {
            error!(session_id = %self.session_id, error = %e, "Failed to invoke conversational RAG");
            Error::operation(OPERATION, e)
        })
    }

    async fn run(&self, question: &str) -> Result<RagAnswer> {
        let history = self.store.get_history(&self.session_id).await?;
        let prior = history.messages().await;

        let retrieval_query = if prior.is_empty() {
            question.to_string()
        } else {
            self.contextualize(&prior, question).await?
        };

        let sources = self.retriever.retrieve(&retrieval_query, self.top_k).await?;
        if sources.is_empty() {
            warn!(session_id = %self.session_id, "No documents retrieved for question");
        } else {
            let top: Vec<_> = sources.iter().take(3).collect();
            info!(
                session_id = %self.session_id,
                count = sources.len(),
                top_sources = ?top.iter().map(|c| c.source.as_str()).collect::<Vec<_>>(),
                top_pages = ?top.iter().map(|c| c.page).collect::<Vec<_>>(),
                "Retrieved docs"
            );
        }

        let context = sources
            .iter()
            .map(|chunk| chunk.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let system = self
            .prompts
            .render(PromptType::ContextQa, &[("context", context.as_str())])?;

        let response = self
            .provider
            .complete(self.request(system, &prior, question))
            .await?;
        let answer = response.message.content;
        if answer.trim().is_empty() {
            warn!(session_id = %self.session_id, "Empty answer received");
        }

        history
            .extend([Message::user(question), Message::assistant(answer.as_str())])
            .await;

        info!(
            session_id = %self.session_id,
            answer_preview = %answer.chars().take(150).collect::<String>(),
            "Chain invoked successfully"
        );

        Ok(RagAnswer {
            answer,
            retrieval_query,
            sources,
        })
    }

    /// Rewrite `question` into a query that stands without the history.
    async fn contextualize(&self, prior: &[Message], question: &str) -> Result<String> {
        let system = self.prompts.render(PromptType::ContextualizeQuestion, &[])?;
        let response = self
            .provider
            .complete(self.request(system, prior, question))
            .await?;

        let rewritten = response.message.content.trim();
        if rewritten.is_empty() {
            return Ok(question.to_string());
        }
        debug!(session_id = %self.session_id, query = rewritten, "Question contextualized");
        Ok(rewritten.to_string())
    }

    fn request(&self, system: String, prior: &[Message], question: &str) -> ProviderRequest {
        let mut messages = Vec::with_capacity(prior.len() + 2);
        messages.push(Message::system(system));
        messages.extend(prior.iter().cloned());
        messages.push(Message::user(question));

        ProviderRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}
