//! Decision - the final per-ticker output of the pipeline
//!
//! The portfolio stage serializes a `DecisionSet` as the last message of the
//! run; `parse_decisions` is the inverse. Parsing never returns a bare
//! failure value: malformed payloads come back as a structured
//! `ParseFailure` carrying the raw text so callers can display it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::state::Ticker;

/// What the fund does with a ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Buy,
    Sell,
    Short,
    Cover,
    #[default]
    Hold,
}

/// Final decision for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub action: Action,
    pub quantity: u64,
    /// Confidence in the decision, 0-100
    pub confidence: Decimal,
    pub reasoning: String,
}

impl Decision {
    /// The default decision when no signals contributed.
    pub fn hold(reasoning: impl Into<String>) -> Self {
        Self {
            action: Action::Hold,
            quantity: 0,
            confidence: Decimal::ZERO,
            reasoning: reasoning.into(),
        }
    }
}

/// Ticker -> decision, JSON-serializable as the final message payload.
pub type DecisionSet = BTreeMap<Ticker, Decision>;

/// Structured parse error: the caller always gets something renderable,
/// including the raw response text.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("decision payload parse failed: {details}")]
pub struct ParseFailure {
    pub details: String,
    pub response: String,
}

/// Parse the final message payload back into a `DecisionSet`.
pub fn parse_decisions(payload: &str) -> Result<DecisionSet, ParseFailure> {
    let trimmed = payload.trim();
    if trimmed.is_empty() || !trimmed.starts_with('{') {
        return Err(ParseFailure {
            details: "payload is not a JSON object".to_string(),
            response: payload.to_string(),
        });
    }
    serde_json::from_str(trimmed).map_err(|e| ParseFailure {
        details: e.to_string(),
        response: payload.to_string(),
    })
}
