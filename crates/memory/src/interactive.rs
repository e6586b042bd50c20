//! Interactive session scope and backend detection.
//!
//! An [`InteractiveSession`] owns its own [`SessionRegistry`] and is bound to
//! a task with [`InteractiveSession::scope`]. Code running inside that scope
//! sees the session through [`TaskLocalDetector`]; code outside it (including
//! tasks spawned from inside, which do not inherit task-locals) sees none.

use crate::registry::SessionRegistry;
use docportal_core::error::SessionError;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;
use uuid::Uuid;

tokio::task_local! {
    static CURRENT_SESSION: InteractiveSession;
}

#[derive(Debug)]
struct Inner {
    id: String,
    registry: Arc<SessionRegistry>,
    closed: AtomicBool,
}

/// A live interactive context and the session histories it owns.
#[derive(Debug, Clone)]
pub struct InteractiveSession {
    inner: Arc<Inner>,
}

impl InteractiveSession {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                id: Uuid::new_v4().to_string(),
                registry: Arc::new(SessionRegistry::new()),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Identifier of this interactive context (not a conversation session id).
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// The registry owned by this context, or `None` once it has been closed.
    pub fn registry(&self) -> Option<Arc<SessionRegistry>> {
        if self.is_closed() {
            None
        } else {
            Some(Arc::clone(&self.inner.registry))
        }
    }

    /// End the context. Later storage access through it fails.
    pub fn close(&self) {
        if !self.inner.closed.swap(true, Ordering::SeqCst) {
            debug!(context = %self.inner.id, "Interactive session closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Run `fut` with this session bound to the current task.
    pub async fn scope<F>(&self, fut: F) -> F::Output
    where
        F: Future,
    {
        CURRENT_SESSION.scope(self.clone(), fut).await
    }

    /// The session bound to the current task, if any.
    pub fn current() -> Option<InteractiveSession> {
        CURRENT_SESSION.try_with(|session| session.clone()).ok()
    }
}

impl Default for InteractiveSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Reports whether an interactive context is active for the current call.
///
/// Any `Fn() -> Result<Option<InteractiveSession>, SessionError>` closure is a
/// detector, which lets tests script the probe outcome.
pub trait ContextDetector: Send + Sync {
    fn detect(&self) -> Result<Option<InteractiveSession>, SessionError>;
}

impl<F> ContextDetector for F
where
    F: Fn() -> Result<Option<InteractiveSession>, SessionError> + Send + Sync,
{
    fn detect(&self) -> Result<Option<InteractiveSession>, SessionError> {
        self()
    }
}

/// Default detector: the session bound to the current tokio task.
#[derive(Debug, Default, Clone, Copy)]
pub struct TaskLocalDetector;

impl ContextDetector for TaskLocalDetector {
    fn detect(&self) -> Result<Option<InteractiveSession>, SessionError> {
        Ok(InteractiveSession::current())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_session_outside_scope() {
        assert!(InteractiveSession::current().is_none());
        assert!(TaskLocalDetector.detect().unwrap().is_none());
    }

    #[tokio::test]
    async fn scope_binds_session() {
        let session = InteractiveSession::new();
        let id = session.id().to_string();
        let seen = session
            .scope(async { TaskLocalDetector.detect().unwrap().map(|s| s.id().to_string()) })
            .await;
        assert_eq!(seen, Some(id));
        assert!(InteractiveSession::current().is_none());
    }

    #[tokio::test]
    async fn spawned_task_does_not_inherit_scope() {
        let session = InteractiveSession::new();
        let inner = session
            .scope(async { tokio::spawn(async { InteractiveSession::current().is_some() }).await })
            .await
            .unwrap();
        assert!(!inner);
    }

    #[test]
    fn closed_session_has_no_registry() {
        let session = InteractiveSession::new();
        assert!(session.registry().is_some());
        session.close();
        session.close();
        assert!(session.is_closed());
        assert!(session.registry().is_none());
    }

    #[test]
    fn closure_detector() {
        let failing = || -> Result<Option<InteractiveSession>, SessionError> {
            Err(SessionError::ProbeFailed("no runtime".into()))
        };
        assert!(matches!(failing.detect(), Err(SessionError::ProbeFailed(_))));
    }
}
