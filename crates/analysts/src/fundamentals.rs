//! Fundamentals analyst
//!
//! Screens profitability, growth, leverage and earnings multiple against
//! fixed thresholds and votes each check.

use async_trait::async_trait;
use log::debug;
use quorum_core::{FundState, SignalPayload, SignalRecord, Ticker, TickerSignals};
use rust_decimal_macros::dec;
use serde_json::json;
use std::sync::Arc;

use crate::analyst::{Analyst, Result};
use crate::data::MarketData;
use crate::vote::Ballot;

pub struct FundamentalsAnalyst {
    data: Arc<dyn MarketData>,
}

impl FundamentalsAnalyst {
    pub fn new(data: Arc<dyn MarketData>) -> Self {
        Self { data }
    }

    fn evaluate(&self, ticker: &Ticker) -> SignalRecord {
        let f = match self.data.fundamentals(ticker) {
            Ok(f) => f,
            Err(e) => return SignalRecord::failure(e.to_string()),
        };

        let mut ballot = Ballot::new();

        let margin_bias = if f.net_margin > dec!(0.15) {
            1
        } else if f.net_margin < dec!(0) {
            -1
        } else {
            0
        };
        ballot.cast("net_margin", margin_bias, json!(f.net_margin));

        let growth_bias = if f.revenue_growth > dec!(0.08) {
            1
        } else if f.revenue_growth < dec!(0) {
            -1
        } else {
            0
        };
        ballot.cast("revenue_growth", growth_bias, json!(f.revenue_growth));

        let roe_bias = if f.return_on_equity > dec!(0.15) {
            1
        } else if f.return_on_equity < dec!(0.05) {
            -1
        } else {
            0
        };
        ballot.cast("return_on_equity", roe_bias, json!(f.return_on_equity));

        let leverage_bias = if f.debt_to_equity > dec!(1.5) { -1 } else { 0 };
        ballot.cast("debt_to_equity", leverage_bias, json!(f.debt_to_equity));

        let pe_bias = if f.pe_ratio <= dec!(0) {
            // Negative earnings; the multiple is meaningless
            -1
        } else if f.pe_ratio < dec!(15) {
            1
        } else if f.pe_ratio > dec!(35) {
            -1
        } else {
            0
        };
        ballot.cast("pe_ratio", pe_bias, json!(f.pe_ratio));

        ballot.into_record()
    }
}

#[async_trait]
impl Analyst for FundamentalsAnalyst {
    fn name(&self) -> &str {
        "fundamentals_analyst"
    }

    async fn analyze(&self, state: &FundState) -> Result<TickerSignals> {
        let mut signals = TickerSignals::new();
        for ticker in &state.data.tickers {
            let record = self.evaluate(ticker);
            debug!(
                "[fundamentals_analyst] {}: {:?} ({:?})",
                ticker, record.direction, record.confidence
            );
            signals.insert(ticker.clone(), SignalPayload::Simple(record));
        }
        Ok(signals)
    }
}
