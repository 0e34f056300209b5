//! Persona analysts
//!
//! Investor personas delegate judgement to a reasoning model through the
//! `quorum-llm` client seam. Each run resolves the model named in the run
//! metadata against the catalog, falling back to the catalog default.
//!
//! Call failures and malformed replies become per-ticker error records; the
//! node itself only fails when no model can be resolved at all.

use async_trait::async_trait;
use log::{debug, warn};
use quorum_core::{
    FundState, Reasoning, SignalDirection, SignalPayload, SignalRecord, Ticker, TickerSignals,
};
use quorum_llm::{ChatMessage, LlmClient, ModelCatalog, ModelInfo};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;

use crate::analyst::{Analyst, AnalystError, Result};
use crate::data::MarketData;

/// The investor personalities available as graph nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persona {
    BenGraham,
    BillAckman,
    WarrenBuffett,
}

impl Persona {
    pub fn name(&self) -> &'static str {
        match self {
            Persona::BenGraham => "ben_graham",
            Persona::BillAckman => "bill_ackman",
            Persona::WarrenBuffett => "warren_buffett",
        }
    }

    fn system_prompt(&self) -> &'static str {
        match self {
            Persona::BenGraham => {
                "You are Ben Graham. Judge the stock strictly on margin of safety: \
                 net-nets, conservative balance sheets, earnings stability and a deep \
                 discount to intrinsic value. Ignore stories and momentum."
            }
            Persona::BillAckman => {
                "You are Bill Ackman. Look for high-quality, simple, predictable \
                 businesses with pricing power, and for situations where an activist \
                 push or a catalyst could unlock value. Be willing to take a strong, \
                 concentrated view."
            }
            Persona::WarrenBuffett => {
                "You are Warren Buffett. Favor wonderful businesses at fair prices: \
                 durable moats, high returns on equity, honest management and low \
                 leverage. Stay inside your circle of competence and think in decades."
            }
        }
    }
}

/// Shape the model is asked to reply with.
#[derive(Debug, Deserialize)]
struct PersonaReply {
    signal: SignalDirection,
    confidence: Option<Decimal>,
    reasoning: Option<String>,
}

pub struct PersonaAnalyst {
    persona: Persona,
    catalog: Arc<ModelCatalog>,
    client: Arc<dyn LlmClient>,
    data: Arc<dyn MarketData>,
}

impl PersonaAnalyst {
    pub fn new(
        persona: Persona,
        catalog: Arc<ModelCatalog>,
        client: Arc<dyn LlmClient>,
        data: Arc<dyn MarketData>,
    ) -> Self {
        Self {
            persona,
            catalog,
            client,
            data,
        }
    }

    fn resolve_model(&self, state: &FundState) -> Result<ModelInfo> {
        let model = self
            .catalog
            .find(&state.metadata.model_name)
            .or_else(|| self.catalog.default_model())
            .ok_or_else(|| AnalystError::Failed("model catalog is empty".to_string()))?;
        if model.model_name != state.metadata.model_name {
            warn!(
                "[{}] model '{}' not in catalog, using '{}'",
                self.persona.name(),
                state.metadata.model_name,
                model.model_name
            );
        }
        Ok(model.clone())
    }

    fn prompt_for(&self, state: &FundState, ticker: &Ticker) -> std::result::Result<String, String> {
        let fundamentals = self
            .data
            .fundamentals(ticker)
            .map_err(|e| e.to_string())?;
        let price = self
            .data
            .close_on(ticker, state.data.window.end)
            .map_err(|e| e.to_string())?;

        let facts = serde_json::json!({
            "ticker": ticker,
            "price": price,
            "market_cap": fundamentals.market_cap(price),
            "fundamentals": fundamentals,
        });
        Ok(format!(
            "Evaluate {ticker} as an investment using these facts:\n{facts}\n\
             Reply with JSON only: \
             {{\"signal\": \"bullish\"|\"bearish\"|\"neutral\", \
             \"confidence\": 0-100, \"reasoning\": \"...\"}}",
        ))
    }

    async fn evaluate(&self, state: &FundState, model: &ModelInfo, ticker: &Ticker) -> SignalRecord {
        let prompt = match self.prompt_for(state, ticker) {
            Ok(prompt) => prompt,
            Err(details) => return SignalRecord::failure(details),
        };
        let messages = [
            ChatMessage::system(self.persona.system_prompt()),
            ChatMessage::user(prompt),
        ];

        let reply = match self.client.invoke(model, &messages).await {
            Ok(reply) => reply,
            Err(e) => return SignalRecord::failure(e.to_string()),
        };

        match serde_json::from_str::<PersonaReply>(reply.trim()) {
            Ok(parsed) => {
                let mut record = SignalRecord::new(parsed.signal);
                if let Some(confidence) = parsed.confidence {
                    record = record.with_confidence(confidence);
                }
                if let Some(reasoning) = parsed.reasoning {
                    record = record.with_reasoning(Reasoning::Text(reasoning));
                }
                record
            }
            Err(e) => SignalRecord::failure(format!("unparseable model reply: {e}")),
        }
    }
}

#[async_trait]
impl Analyst for PersonaAnalyst {
    fn name(&self) -> &str {
        self.persona.name()
    }

    async fn analyze(&self, state: &FundState) -> Result<TickerSignals> {
        let model = self.resolve_model(state)?;
        let mut signals = TickerSignals::new();
        for ticker in &state.data.tickers {
            let record = self.evaluate(state, &model, ticker).await;
            debug!(
                "[{}] {}: {:?} ({:?})",
                self.persona.name(),
                ticker,
                record.direction,
                record.confidence
            );
            signals.insert(ticker.clone(), SignalPayload::Simple(record));
        }
        Ok(signals)
    }
}
