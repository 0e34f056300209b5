//! Sentiment analyst
//!
//! Averages scored news inside the run window. An empty window is a valid
//! neutral read, not an error; a missing feed is an error record.

use async_trait::async_trait;
use log::debug;
use quorum_core::{
    FundState, Reasoning, SignalDirection, SignalPayload, SignalRecord, Ticker, TickerSignals,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

use crate::analyst::{Analyst, Result};
use crate::data::MarketData;

const BULLISH_THRESHOLD: Decimal = dec!(0.2);

pub struct SentimentAnalyst {
    data: Arc<dyn MarketData>,
}

impl SentimentAnalyst {
    pub fn new(data: Arc<dyn MarketData>) -> Self {
        Self { data }
    }

    fn evaluate(&self, state: &FundState, ticker: &Ticker) -> SignalRecord {
        let events = match self.data.sentiment(ticker, &state.data.window) {
            Ok(events) => events,
            Err(e) => return SignalRecord::failure(e.to_string()),
        };
        if events.is_empty() {
            return SignalRecord::new(SignalDirection::Neutral)
                .with_confidence(Decimal::ZERO)
                .with_reasoning(Reasoning::Text("no news in window".to_string()));
        }

        let sum: Decimal = events.iter().map(|e| e.score).sum();
        let mean = sum / Decimal::from(events.len());

        let direction = if mean > BULLISH_THRESHOLD {
            SignalDirection::Bullish
        } else if mean < -BULLISH_THRESHOLD {
            SignalDirection::Bearish
        } else {
            SignalDirection::Neutral
        };
        let confidence = (mean.abs() * dec!(100)).min(dec!(100));

        SignalRecord::new(direction)
            .with_confidence(confidence)
            .with_reasoning(Reasoning::Text(format!(
                "mean score {mean:.2} over {} items",
                events.len()
            )))
    }
}

#[async_trait]
impl Analyst for SentimentAnalyst {
    fn name(&self) -> &str {
        "sentiment_analyst"
    }

    async fn analyze(&self, state: &FundState) -> Result<TickerSignals> {
        let mut signals = TickerSignals::new();
        for ticker in &state.data.tickers {
            let record = self.evaluate(state, ticker);
            debug!(
                "[sentiment_analyst] {}: {:?} ({:?})",
                ticker, record.direction, record.confidence
            );
            signals.insert(ticker.clone(), SignalPayload::Simple(record));
        }
        Ok(signals)
    }
}
