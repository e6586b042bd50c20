//! Error types for the DocPortal domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each pipeline stage has its own error type; `Error` unifies them.

use thiserror::Error;

/// The top-level error type for all DocPortal operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Pipeline stage errors ---
    #[error("Conditioning error: {0}")]
    Conditioning(#[from] ConditioningError),

    #[error("Reconciliation error: {0}")]
    Reconcile(#[from] ReconcileError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("Prompt error: {0}")]
    Prompt(String),

    // --- Operation wrapper ---
    /// A public operation failed; `source` is the stage error that triggered it.
    #[error("{operation} failed: {source}")]
    Operation {
        operation: &'static str,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap a stage failure with the name of the operation that was running.
    pub fn operation(operation: &'static str, source: impl Into<Error>) -> Self {
        Error::Operation {
            operation,
            source: Box::new(source.into()),
        }
    }

    /// The innermost error, skipping any operation wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Error::Operation { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Raised only for budgets that cannot produce any prompt text.
#[derive(Debug, Clone, Error)]
pub enum ConditioningError {
    #[error("head and tail budgets are both zero")]
    EmptyBudget,
}

/// How a reply failed to match its target schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The reply was text that is not parseable as JSON at all.
    Decode,
    /// The reply parsed, but fields are missing, extra, or ill-typed.
    Shape,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Decode => write!(f, "decode"),
            FailureKind::Shape => write!(f, "shape"),
        }
    }
}

/// A reply did not satisfy its target schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{schema} reply failed {kind} validation: {detail}")]
pub struct ValidationFailure {
    pub schema: &'static str,
    pub kind: FailureKind,
    pub detail: String,
}

impl ValidationFailure {
    pub fn decode(schema: &'static str, detail: impl Into<String>) -> Self {
        Self {
            schema,
            kind: FailureKind::Decode,
            detail: detail.into(),
        }
    }

    pub fn shape(schema: &'static str, detail: impl Into<String>) -> Self {
        Self {
            schema,
            kind: FailureKind::Shape,
            detail: detail.into(),
        }
    }
}

/// The single repair attempt also produced an invalid reply.
///
/// Carries both raw replies verbatim so the failure can be diagnosed.
#[derive(Debug, Clone, Error)]
#[error("{schema} reply still invalid after repair: {repaired_failure}")]
pub struct ReconciliationFailure {
    pub schema: &'static str,
    pub original_reply: String,
    pub original_failure: ValidationFailure,
    pub repaired_reply: String,
    #[source]
    pub repaired_failure: ValidationFailure,
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Unrepaired(Box<ReconciliationFailure>),

    #[error("repair call failed after first-pass {first_failure}")]
    RepairCall {
        first_failure: ValidationFailure,
        #[source]
        source: ProviderError,
    },
}

#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("Interactive context probe failed: {0}")]
    ProbeFailed(String),

    #[error("Session storage unavailable for '{session_id}': {reason}")]
    Storage { session_id: String, reason: String },
}

#[derive(Debug, Clone, Error)]
pub enum RetrievalError {
    #[error("Retriever has no indexed content")]
    EmptyIndex,
}
