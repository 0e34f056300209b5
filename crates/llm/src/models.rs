//! Model catalog
//!
//! An immutable configuration value listing the reasoning models the fund
//! may use. Built once at startup and passed by reference into the pipeline;
//! there is no module-level mutable state to drift between runs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported model providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelProvider {
    Anthropic,
    DeepSeek,
    Gemini,
    Groq,
    OpenAi,
    /// Deterministic in-process stand-in, used by simulations and tests
    Scripted,
}

impl fmt::Display for ModelProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelProvider::Anthropic => "Anthropic",
            ModelProvider::DeepSeek => "DeepSeek",
            ModelProvider::Gemini => "Gemini",
            ModelProvider::Groq => "Groq",
            ModelProvider::OpenAi => "OpenAI",
            ModelProvider::Scripted => "Scripted",
        };
        f.write_str(name)
    }
}

/// One model entry in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Human-facing name for selection menus
    pub display_name: String,
    /// Provider-facing model identifier
    pub model_name: String,
    pub provider: ModelProvider,
}

impl ModelInfo {
    pub fn new(
        display_name: impl Into<String>,
        model_name: impl Into<String>,
        provider: ModelProvider,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            model_name: model_name.into(),
            provider,
        }
    }

    /// Does the provider support structured JSON output mode?
    pub fn has_json_mode(&self) -> bool {
        !matches!(self.provider, ModelProvider::Gemini)
    }
}

/// Immutable list of available models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCatalog {
    models: Vec<ModelInfo>,
    default_model: String,
}

impl ModelCatalog {
    /// Build a catalog. The default falls back to the first entry when the
    /// named default is absent.
    pub fn new(models: Vec<ModelInfo>, default_model: impl Into<String>) -> Self {
        let default_model = default_model.into();
        if !models.iter().any(|m| m.model_name == default_model) {
            log::warn!(
                "[llm] default model '{}' not in catalog, falling back to first entry",
                default_model
            );
        }
        Self {
            models,
            default_model,
        }
    }

    /// The standard catalog shipped with the simulator.
    pub fn standard() -> Self {
        Self::new(
            vec![
                ModelInfo::new(
                    "[anthropic] claude-3.5-haiku",
                    "claude-3-5-haiku-latest",
                    ModelProvider::Anthropic,
                ),
                ModelInfo::new(
                    "[anthropic] claude-3.5-sonnet",
                    "claude-3-5-sonnet-latest",
                    ModelProvider::Anthropic,
                ),
                ModelInfo::new(
                    "[deepseek] deepseek-r1",
                    "deepseek-reasoner",
                    ModelProvider::DeepSeek,
                ),
                ModelInfo::new(
                    "[deepseek] deepseek-v3",
                    "deepseek-chat",
                    ModelProvider::DeepSeek,
                ),
                ModelInfo::new(
                    "[gemini] gemini-2.0-flash",
                    "gemini-2.0-flash",
                    ModelProvider::Gemini,
                ),
                ModelInfo::new(
                    "[groq] llama-4-scout-17b",
                    "meta-llama/llama-4-scout-17b-16e-instruct",
                    ModelProvider::Groq,
                ),
                ModelInfo::new("[openai] gpt-4o", "gpt-4o", ModelProvider::OpenAi),
                ModelInfo::new("[openai] o3-mini", "o3-mini", ModelProvider::OpenAi),
                ModelInfo::new("[scripted] scripted", "scripted", ModelProvider::Scripted),
            ],
            "deepseek-reasoner",
        )
    }

    pub fn all(&self) -> &[ModelInfo] {
        &self.models
    }

    /// Look up a model by its provider-facing name.
    pub fn find(&self, model_name: &str) -> Option<&ModelInfo> {
        self.models.iter().find(|m| m.model_name == model_name)
    }

    /// The configured default, or the first catalog entry.
    pub fn default_model(&self) -> Option<&ModelInfo> {
        self.find(&self.default_model).or_else(|| self.models.first())
    }
}
