//! Session memory for DocPortal.
//!
//! A [`SessionMemoryStore`] maps a session id to an append-only message
//! history. Each call picks one of two backends:
//!
//! - the registry owned by the [`InteractiveSession`] bound to the current
//!   task, when one is live;
//! - otherwise the process-scoped fallback [`SessionRegistry`] handed to the
//!   store at construction.
//!
//! The two backends never see each other's sessions.

pub mod history;
pub mod interactive;
pub mod registry;
pub mod store;

pub use history::SessionHistory;
pub use interactive::{ContextDetector, InteractiveSession, TaskLocalDetector};
pub use registry::SessionRegistry;
pub use store::{Backend, SessionMemoryStore};
