//! Reconciliation of a model reply with its target schema.
//!
//! Two stages, no loop:
//!
//! ```text
//! FirstPass ──valid──────────────────────────────▶ Done (FirstPass)
//!     │
//!     └─invalid─▶ Repair ──valid──────────────────▶ Done (Repaired)
//!                   │
//!                   ├─invalid──▶ Failed (ReconciliationFailure)
//!                   └─call error─▶ Failed (RepairCall)
//! ```
//!
//! Decode and shape failures both get exactly one repair call.

use std::sync::Arc;

use crate::schema::RecordSchema;
use crate::validator::{RawReply, validate};
use docportal_core::error::{ReconcileError, ReconciliationFailure, ValidationFailure};
use docportal_core::provider::{Provider, ProviderRequest};
use tracing::{error, info, warn};

/// Which stage produced the accepted reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    FirstPass,
    Repaired,
}

/// A schema-valid value and how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled<T> {
    pub value: T,
    pub stage: Stage,
}

impl<T> Reconciled<T> {
    pub fn was_repaired(&self) -> bool {
        self.stage == Stage::Repaired
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reconciled<U> {
        Reconciled {
            value: f(self.value),
            stage: self.stage,
        }
    }
}

/// Outcome of validating the first reply.
enum FirstPass<T> {
    Valid(T),
    NeedsRepair {
        original: RawReply,
        failure: ValidationFailure,
    },
}

/// Build the corrective prompt for schema `S`, embedding the bad reply verbatim.
pub fn repair_prompt<S: RecordSchema>(bad_output: &str) -> String {
    format!(
        "Fix the following output so it is VALID JSON ONLY.\n\
         Do not include explanations, markdown, code fences, or extra text.\n\
         {}\n\n\
         BAD_OUTPUT:\n{bad_output}",
        S::repair_shape_hint()
    )
}

/// Validates replies and issues the single repair call when needed.
pub struct Reconciler {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl Reconciler {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.0,
            max_tokens: None,
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

    /// Turn `reply` into a value of schema `S`, repairing at most once.
    pub async fn reconcile<S: RecordSchema>(
        &self,
        reply: RawReply,
    ) -> Result<Reconciled<S::Output>, ReconcileError> {
        match Self::first_pass::<S>(reply) {
            FirstPass::Valid(value) => Ok(Reconciled {
                value,
                stage: Stage::FirstPass,
            }),
            FirstPass::NeedsRepair { original, failure } => {
                self.repair::<S>(original, failure).await
            }
        }
    }

    fn first_pass<S: RecordSchema>(reply: RawReply) -> FirstPass<S::Output> {
        match validate::<S>(&reply) {
            Ok(value) => FirstPass::Valid(value),
            Err(failure) => {
                warn!(
                    schema = S::NAME,
                    kind = %failure.kind,
                    error = %failure.detail,
                    reply_preview = %reply.preview(200),
                    "Schema validation failed; attempting one JSON repair call"
                );
                FirstPass::NeedsRepair {
                    original: reply,
                    failure,
                }
            }
        }
    }

    async fn repair<S: RecordSchema>(
        &self,
        original: RawReply,
        first_failure: ValidationFailure,
    ) -> Result<Reconciled<S::Output>, ReconcileError> {
        let original_reply = original.verbatim();
        let request = ProviderRequest::prompt(&self.model, repair_prompt::<S>(&original_reply))
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        let response = match self.provider.complete(request).await {
            Ok(response) => response,
            Err(source) => {
                error!(schema = S::NAME, error = %source, "Repair call failed");
                return Err(ReconcileError::RepairCall {
                    first_failure,
                    source,
                });
            }
        };

        let repaired = RawReply::from_response(&response);
        match validate::<S>(&repaired) {
            Ok(value) => {
                info!(schema = S::NAME, "Repair produced a valid reply");
                Ok(Reconciled {
                    value,
                    stage: Stage::Repaired,
                })
            }
            Err(repaired_failure) => {
                error!(
                    schema = S::NAME,
                    kind = %repaired_failure.kind,
                    error = %repaired_failure.detail,
                    "Reply still invalid after repair"
                );
                Err(ReconcileError::Unrepaired(Box::new(ReconciliationFailure {
                    schema: S::NAME,
                    original_reply,
                    original_failure: first_failure,
                    repaired_reply: repaired.verbatim(),
                    repaired_failure,
                })))
            }
        }
    }
}
