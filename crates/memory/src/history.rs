//! Shared handle to one session's ordered message history.

use docportal_core::message::{Message, SessionId};
use std::sync::Arc;
use tokio::sync::RwLock;

/// An ordered, append-only list of turns for a single session.
///
/// Cloning the handle shares the underlying history; every clone observes
/// the same turns in the same order.
#[derive(Debug, Clone)]
pub struct SessionHistory {
    session_id: SessionId,
    messages: Arc<RwLock<Vec<Message>>>,
}

impl SessionHistory {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            messages: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Snapshot of the turns recorded so far.
    pub async fn messages(&self) -> Vec<Message> {
        self.messages.read().await.clone()
    }

    pub async fn push(&self, message: Message) {
        self.messages.write().await.push(message);
    }

    /// Append several turns under a single lock so no other writer can
    /// interleave between them.
    pub async fn extend(&self, messages: impl IntoIterator<Item = Message>) {
        self.messages.write().await.extend(messages);
    }

    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.messages.write().await.clear();
    }

    /// Whether both handles point at the same underlying history.
    pub fn same_as(&self, other: &SessionHistory) -> bool {
        Arc::ptr_eq(&self.messages, &other.messages)
    }
}
