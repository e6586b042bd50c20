//! # DocPortal Core
//!
//! Domain types, traits, and error definitions for the DocPortal document
//! assistant. This crate has **zero framework dependencies**: it defines the
//! domain model that every other crate implements against.
//!
//! ## Design Philosophy
//!
//! Each external collaborator (the language model, the retriever) is a trait
//! here. Implementations live in their respective crates, which keeps the
//! reconciliation pipeline testable against scripted mocks.

pub mod error;
pub mod message;
pub mod provider;
pub mod record;
pub mod retrieval;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use message::{Message, Role, SessionId};
pub use provider::{Provider, ProviderRequest, ProviderResponse};
pub use record::{ChangeRecord, MetadataRecord, PageCount, NOT_AVAILABLE, NO_CHANGE};
pub use retrieval::{ContextChunk, Retriever};
