//! Quorum LLM layer
//!
//! The persona analysts delegate their reasoning to an external model. This
//! crate owns the seam: an immutable model catalog constructed at process
//! start (no ambient global registry) and the `LlmClient` trait the analysts
//! call through. Client failures surface as producer-level errors only; the
//! engine never sees them as anything else.
//!
//! Network transports are out of scope. `ScriptedClient` is the deterministic
//! stand-in used by simulations and tests.

pub mod client;
pub mod models;

pub use client::{ChatMessage, ChatRole, LlmClient, LlmError, ScriptedClient};
pub use models::{ModelCatalog, ModelInfo, ModelProvider};
