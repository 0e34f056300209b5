//! Valuation analyst
//!
//! Compares an owner-earnings intrinsic value against the latest close.
//! Intrinsic value is free cash flow per share on a 15x base multiple,
//! nudged up by earnings growth (capped at 20 extra turns).

use async_trait::async_trait;
use log::debug;
use quorum_core::{
    FundState, Reasoning, SignalDirection, SignalPayload, SignalRecord, Ticker, TickerSignals,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use std::sync::Arc;

use crate::analyst::{Analyst, Result};
use crate::data::MarketData;

const GAP_THRESHOLD: Decimal = dec!(0.15);

pub struct ValuationAnalyst {
    data: Arc<dyn MarketData>,
}

impl ValuationAnalyst {
    pub fn new(data: Arc<dyn MarketData>) -> Self {
        Self { data }
    }

    fn evaluate(&self, state: &FundState, ticker: &Ticker) -> SignalRecord {
        let fundamentals = match self.data.fundamentals(ticker) {
            Ok(f) => f,
            Err(e) => return SignalRecord::failure(e.to_string()),
        };
        let price = match self.data.close_on(ticker, state.data.window.end) {
            Ok(p) => p,
            Err(e) => return SignalRecord::failure(e.to_string()),
        };
        if price <= Decimal::ZERO {
            return SignalRecord::failure(format!("non-positive price {price} for {ticker}"));
        }
        if fundamentals.free_cash_flow_per_share <= Decimal::ZERO {
            return SignalRecord::new(SignalDirection::Bearish)
                .with_confidence(dec!(35))
                .with_reasoning(Reasoning::Text(
                    "negative free cash flow, no intrinsic value support".to_string(),
                ));
        }

        let growth_turns = (fundamentals.earnings_growth * dec!(100))
            .clamp(Decimal::ZERO, dec!(20));
        let multiple = dec!(15) + growth_turns;
        let intrinsic = fundamentals.free_cash_flow_per_share * multiple;
        let gap = (intrinsic - price) / price;

        let (direction, confidence) = if gap > GAP_THRESHOLD {
            (SignalDirection::Bullish, (gap * dec!(200)).min(dec!(100)))
        } else if gap < -GAP_THRESHOLD {
            (SignalDirection::Bearish, (gap.abs() * dec!(200)).min(dec!(100)))
        } else {
            (SignalDirection::Neutral, dec!(20))
        };

        SignalRecord::new(direction)
            .with_confidence(confidence)
            .with_reasoning(Reasoning::Structured(json!({
                "intrinsic_value": intrinsic,
                "price": price,
                "gap": gap,
                "multiple": multiple,
            })))
    }
}

#[async_trait]
impl Analyst for ValuationAnalyst {
    fn name(&self) -> &str {
        "valuation_analyst"
    }

    async fn analyze(&self, state: &FundState) -> Result<TickerSignals> {
        let mut signals = TickerSignals::new();
        for ticker in &state.data.tickers {
            let record = self.evaluate(state, ticker);
            debug!(
                "[valuation_analyst] {}: {:?} ({:?})",
                ticker, record.direction, record.confidence
            );
            signals.insert(ticker.clone(), SignalPayload::Simple(record));
        }
        Ok(signals)
    }
}
