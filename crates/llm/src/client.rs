//! LLM client seam
//!
//! Persona analysts talk to models through `LlmClient`. The trait is the
//! whole contract: prompt content is the analyst's business, transport is the
//! implementation's. `ScriptedClient` answers from a fixed script keyed on a
//! marker found in the prompt, which keeps simulations and tests
//! deterministic and offline.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::models::ModelInfo;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("model invocation failed: {0}")]
    Invocation(String),

    #[error("no scripted response matches the prompt")]
    NoScriptedResponse,
}

/// Conversational turn role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One turn of the conversation sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// The client seam persona analysts call through.
///
/// Implementations may block for seconds; callers run them inside the graph
/// executor's fan-out so one slow call never stalls a ready sibling.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn invoke(&self, model: &ModelInfo, messages: &[ChatMessage])
        -> Result<String, LlmError>;
}

/// Deterministic client: replies with the first scripted response whose key
/// appears anywhere in the prompt text.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    responses: Vec<(String, String)>,
    /// Reply with this when no key matches (None = error)
    fallback: Option<String>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: respond with `response` when `marker` appears in the prompt.
    pub fn with_response(mut self, marker: impl Into<String>, response: impl Into<String>) -> Self {
        self.responses.push((marker.into(), response.into()));
        self
    }

    /// Builder: respond with `response` when nothing else matches.
    pub fn with_fallback(mut self, response: impl Into<String>) -> Self {
        self.fallback = Some(response.into());
        self
    }

    /// Builder: seed from a map of marker -> response.
    pub fn with_responses(mut self, responses: HashMap<String, String>) -> Self {
        for (marker, response) in responses {
            self.responses.push((marker, response));
        }
        self
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn invoke(
        &self,
        model: &ModelInfo,
        messages: &[ChatMessage],
    ) -> Result<String, LlmError> {
        let prompt: String = messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        for (marker, response) in &self.responses {
            if prompt.contains(marker.as_str()) {
                log::debug!(
                    "[llm] scripted response for marker '{}' via {}",
                    marker,
                    model.model_name
                );
                return Ok(response.clone());
            }
        }

        self.fallback
            .clone()
            .ok_or(LlmError::NoScriptedResponse)
    }
}
