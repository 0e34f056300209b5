//! Signal - what analysts output
//!
//! Analysts don't output orders. They output a per-ticker view (direction,
//! confidence, rationale) that the portfolio stage aggregates into decisions.
//! A failing analyst reports its failure in-band through the `error` field so
//! the display layer can distinguish "ran and failed" from "didn't run".

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::state::Ticker;

/// Categorical trading view.
///
/// Analytical and persona analysts emit the bullish/bearish/neutral family;
/// the buy/sell/short/cover/hold family appears when an upstream source
/// already speaks in actions. Both are accepted by the aggregation vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalDirection {
    Bullish,
    Bearish,
    #[default]
    Neutral,
    Buy,
    Sell,
    Short,
    Cover,
    Hold,
}

impl SignalDirection {
    /// Vote weight sign for aggregation: +1 long bias, -1 short bias, 0 flat.
    pub fn bias(&self) -> i8 {
        match self {
            SignalDirection::Bullish | SignalDirection::Buy | SignalDirection::Cover => 1,
            SignalDirection::Bearish | SignalDirection::Sell | SignalDirection::Short => -1,
            SignalDirection::Neutral | SignalDirection::Hold => 0,
        }
    }
}

/// Free-form or structured rationale attached to a signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reasoning {
    Text(String),
    Structured(Value),
}

impl Default for Reasoning {
    fn default() -> Self {
        Reasoning::Text(String::new())
    }
}

impl From<&str> for Reasoning {
    fn from(s: &str) -> Self {
        Reasoning::Text(s.to_string())
    }
}

impl From<String> for Reasoning {
    fn from(s: String) -> Self {
        Reasoning::Text(s)
    }
}

/// One analyst's view of one ticker.
///
/// Invariant: a record carries either a usable signal or an error, never
/// both. `failure` forces the direction to neutral and drops confidence so a
/// failed record can never contribute to aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub direction: SignalDirection,
    /// Confidence in the view, 0-100. Unset when the analyst abstains.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Decimal>,
    pub reasoning: Reasoning,
    /// Set when the analyst ran and failed for this ticker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SignalRecord {
    pub fn new(direction: SignalDirection) -> Self {
        Self {
            direction,
            confidence: None,
            reasoning: Reasoning::default(),
            error: None,
        }
    }

    /// A per-ticker failure record: neutral, no confidence, error set.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            direction: SignalDirection::Neutral,
            confidence: None,
            reasoning: Reasoning::default(),
            error: Some(error.into()),
        }
    }

    /// Builder: set confidence, clamped to [0, 100].
    pub fn with_confidence(mut self, confidence: Decimal) -> Self {
        self.confidence = Some(confidence.clamp(Decimal::ZERO, Decimal::from(100)));
        self
    }

    /// Builder: set reasoning.
    pub fn with_reasoning(mut self, reasoning: impl Into<Reasoning>) -> Self {
        self.reasoning = reasoning.into();
        self
    }

    /// Did this record fail? Failed records are display-only.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Usable for quantitative aggregation?
    pub fn is_actionable(&self) -> bool {
        self.error.is_none()
    }
}

/// Signal payload: a plain record, or a record enriched with display-only
/// detail (indicator snapshots, tabular data). Consumers pattern-match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SignalPayload {
    Simple(SignalRecord),
    Detailed { record: SignalRecord, detail: Value },
}

impl SignalPayload {
    /// The underlying record, regardless of variant.
    pub fn record(&self) -> &SignalRecord {
        match self {
            SignalPayload::Simple(record) => record,
            SignalPayload::Detailed { record, .. } => record,
        }
    }
}

impl From<SignalRecord> for SignalPayload {
    fn from(record: SignalRecord) -> Self {
        SignalPayload::Simple(record)
    }
}

/// Per-ticker signals from one analyst.
pub type TickerSignals = BTreeMap<Ticker, SignalPayload>;

/// Signals from all analysts, keyed by canonical analyst key.
pub type AnalystSignals = BTreeMap<String, TickerSignals>;
