//! Keyword retriever: an in-memory index over page-split documents.

use async_trait::async_trait;
use docportal_core::error::RetrievalError;
use docportal_core::retrieval::{ContextChunk, Retriever};
use tracing::debug;

use crate::document::Document;

/// Query words shorter than this are ignored.
const MIN_TERM_CHARS: usize = 3;

/// Ranks fixed-size chunks by how often the query's words occur in them.
#[derive(Debug, Clone, Default)]
pub struct KeywordRetriever {
    chunks: Vec<ContextChunk>,
}

impl KeywordRetriever {
    /// Index every page of `documents`, splitting pages into chunks of at
    /// most `chunk_chars` characters.
    pub fn from_documents(documents: &[Document], chunk_chars: usize) -> Self {
        let chunk_chars = chunk_chars.max(1);
        let mut chunks = Vec::new();
        for document in documents {
            for (page, text) in document.numbered_pages() {
                for piece in split_chunks(text, chunk_chars) {
                    chunks.push(ContextChunk {
                        source: document.source.clone(),
                        page: Some(page),
                        content: piece,
                        score: 0.0,
                    });
                }
            }
        }
        debug!(chunks = chunks.len(), "Keyword index built");
        Self { chunks }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Split on whitespace boundaries into pieces of at most `max_chars` chars.
/// A single word longer than the limit becomes its own piece.
fn split_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0;
    for word in text.split_whitespace() {
        let word_chars = word.chars().count();
        if current_chars > 0 && current_chars + 1 + word_chars > max_chars {
            pieces.push(std::mem::take(&mut current));
            current_chars = 0;
        }
        if current_chars > 0 {
            current.push(' ');
            current_chars += 1;
        }
        current.push_str(word);
        current_chars += word_chars;
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

fn query_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= MIN_TERM_CHARS)
        .map(str::to_lowercase)
        .collect();
    terms.sort();
    terms.dedup();
    terms
}

#[async_trait]
impl Retriever for KeywordRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ContextChunk>, RetrievalError> {
        if self.chunks.is_empty() {
            return Err(RetrievalError::EmptyIndex);
        }

        let terms = query_terms(query);
        let mut results: Vec<ContextChunk> = self
            .chunks
            .iter()
            .filter_map(|chunk| {
                let content = chunk.content.to_lowercase();
                let occurrences: usize = terms.iter().map(|t| content.matches(t.as_str()).count()).sum();
                if occurrences == 0 {
                    return None;
                }
                // Simple keyword relevance score
                let score = occurrences as f32 / (content.len() as f32 / 100.0).max(1.0);
                Some(ContextChunk {
                    score,
                    ..chunk.clone()
                })
            })
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(k);
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> KeywordRetriever {
        let paper = Document::from_text(
            "attention.txt",
            "The Transformer relies on attention.\x0cResults on translation benchmarks.",
        );
        let notes = Document::from_text("notes.txt", "Recurrent networks process tokens sequentially.");
        KeywordRetriever::from_documents(&[paper, notes], 1000)
    }

    #[tokio::test]
    async fn finds_matching_page() {
        let results = index().retrieve("What is attention?", 5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, "attention.txt");
        assert_eq!(results[0].page, Some(1));
        assert!(results[0].score > 0.0);
    }

    #[tokio::test]
    async fn no_match_is_empty() {
        let results = index().retrieve("quantum chromodynamics", 5).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn respects_k() {
        let results = index().retrieve("the transformer translation tokens", 2).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn empty_index_is_error() {
        let retriever = KeywordRetriever::default();
        assert!(matches!(
            retriever.retrieve("anything", 3).await,
            Err(RetrievalError::EmptyIndex)
        ));
    }

    #[test]
    fn chunks_respect_size() {
        let pieces = split_chunks("aaa bbb ccc ddd", 7);
        assert_eq!(pieces, vec!["aaa bbb", "ccc ddd"]);
        assert_eq!(split_chunks("   ", 10), Vec::<String>::new());
    }

    #[test]
    fn short_terms_ignored() {
        assert_eq!(query_terms("Is it a GPU?"), vec!["gpu"]);
    }
}
