//! Session memory store: backend selection per call.

use crate::history::SessionHistory;
use crate::interactive::{ContextDetector, InteractiveSession, TaskLocalDetector};
use crate::registry::SessionRegistry;
use docportal_core::error::{Error, Result, SessionError};
use docportal_core::message::{Message, SessionId};
use std::sync::Arc;
use tracing::{debug, warn};

/// Which storage backed a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// The registry owned by the live interactive session.
    Interactive,
    /// The process-scoped registry given to the store at construction.
    Fallback,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Interactive => "interactive",
            Backend::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps session ids to histories, choosing the backend on every call.
///
/// The selection is never cached: the same store used inside and outside an
/// interactive scope reads and writes two disjoint registries.
#[derive(Clone)]
pub struct SessionMemoryStore {
    fallback: Arc<SessionRegistry>,
    detector: Arc<dyn ContextDetector>,
}

impl SessionMemoryStore {
    /// A store that detects the interactive session bound to the current task.
    pub fn new(fallback: Arc<SessionRegistry>) -> Self {
        Self::with_detector(fallback, Arc::new(TaskLocalDetector))
    }

    pub fn with_detector(
        fallback: Arc<SessionRegistry>,
        detector: Arc<dyn ContextDetector>,
    ) -> Self {
        Self { fallback, detector }
    }

    /// The backend the next call would use.
    pub fn backend(&self) -> Result<Backend> {
        let selected = self
            .detector
            .detect()
            .map_err(|e| Error::operation("Session backend detection", e))?;
        Ok(match selected {
            Some(_) => Backend::Interactive,
            None => Backend::Fallback,
        })
    }

    /// The history for `session_id`, created empty on first access.
    pub async fn get_history(&self, session_id: &SessionId) -> Result<SessionHistory> {
        let (backend, registry) = self
            .select(session_id)
            .map_err(|e| Error::operation("Session history lookup", e))?;
        let history = registry.get_or_create(session_id).await;
        debug!(
            session_id = %session_id,
            backend = %backend,
            turns = history.len().await,
            "Session history resolved"
        );
        Ok(history)
    }

    /// Append one turn to the end of the session's history.
    pub async fn append_turn(&self, session_id: &SessionId, turn: Message) -> Result<()> {
        let (backend, registry) = self
            .select(session_id)
            .map_err(|e| Error::operation("Session append", e))?;
        let history = registry.get_or_create(session_id).await;
        history.push(turn).await;
        debug!(session_id = %session_id, backend = %backend, "Turn appended");
        Ok(())
    }

    /// Drop every turn of the session. The history handle stays valid.
    pub async fn clear_history(&self, session_id: &SessionId) -> Result<()> {
        let (backend, registry) = self
            .select(session_id)
            .map_err(|e| Error::operation("Session clear", e))?;
        if let Some(history) = registry.get(session_id).await {
            history.clear().await;
            debug!(session_id = %session_id, backend = %backend, "Session history cleared");
        }
        Ok(())
    }

    fn select(
        &self,
        session_id: &SessionId,
    ) -> std::result::Result<(Backend, Arc<SessionRegistry>), SessionError> {
        match self.detector.detect()? {
            Some(session) => Self::interactive_registry(&session, session_id)
                .map(|registry| (Backend::Interactive, registry)),
            None => Ok((Backend::Fallback, Arc::clone(&self.fallback))),
        }
    }

    fn interactive_registry(
        session: &InteractiveSession,
        session_id: &SessionId,
    ) -> std::result::Result<Arc<SessionRegistry>, SessionError> {
        session.registry().ok_or_else(|| {
            warn!(
                session_id = %session_id,
                context = %session.id(),
                "Interactive session is closed"
            );
            SessionError::Storage {
                session_id: session_id.to_string(),
                reason: "interactive session has been closed".into(),
            }
        })
    }
}
