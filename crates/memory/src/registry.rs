//! Session registry: session id to history map.

use crate::history::SessionHistory;
use docportal_core::message::SessionId;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Holds one [`SessionHistory`] per session id.
///
/// Lookups take the read lock; creating a missing history takes the write
/// lock and re-checks, so concurrent first accesses for one id end up with
/// the same history.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, SessionHistory>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the history for `session_id`, creating an empty one on first access.
    pub async fn get_or_create(&self, session_id: &SessionId) -> SessionHistory {
        if let Some(history) = self.sessions.read().await.get(session_id) {
            return history.clone();
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.clone())
            .or_insert_with(|| {
                debug!(session_id = %session_id, "Creating session history");
                SessionHistory::new(session_id.clone())
            })
            .clone()
    }

    /// The history for `session_id`, if it has been accessed before.
    pub async fn get(&self, session_id: &SessionId) -> Option<SessionHistory> {
        self.sessions.read().await.get(session_id).cloned()
    }

    pub async fn contains(&self, session_id: &SessionId) -> bool {
        self.sessions.read().await.contains_key(session_id)
    }

    /// Number of sessions with a history.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Session ids in sorted order.
    pub async fn session_ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docportal_core::message::Message;
    use std::sync::Arc;

    #[tokio::test]
    async fn first_access_creates_empty_history() {
        let registry = SessionRegistry::new();
        assert!(registry.is_empty().await);

        let history = registry.get_or_create(&"s1".into()).await;
        assert!(history.is_empty().await);
        assert!(registry.contains(&"s1".into()).await);
        assert!(registry.get(&"s2".into()).await.is_none());
    }

    #[tokio::test]
    async fn repeated_access_returns_same_history() {
        let registry = SessionRegistry::new();
        let a = registry.get_or_create(&"s1".into()).await;
        a.push(Message::user("hi")).await;
        let b = registry.get_or_create(&"s1".into()).await;

        assert!(a.same_as(&b));
        assert_eq!(b.len().await, 1);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_access_yields_one_history() {
        let registry = Arc::new(SessionRegistry::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                registry.get_or_create(&"shared".into()).await
            }));
        }

        let mut histories = Vec::new();
        for handle in handles {
            histories.push(handle.await.unwrap());
        }
        assert!(histories.windows(2).all(|w| w[0].same_as(&w[1])));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn session_ids_sorted() {
        let registry = SessionRegistry::new();
        registry.get_or_create(&"b".into()).await;
        registry.get_or_create(&"a".into()).await;
        let ids = registry.session_ids().await;
        assert_eq!(ids, vec![SessionId::from("a"), SessionId::from("b")]);
    }
}
