//! Quantitative analyst
//!
//! Standalone producer: runs outside the graph in a synchronous per-ticker
//! loop and emits a detailed indicator snapshot alongside its verdict. Any
//! problem is reported in-band through the record's error field so the
//! caller's loop never breaks.

use log::debug;
use quorum_core::{DateWindow, SignalPayload, SignalRecord, Ticker};
use rust_decimal::prelude::ToPrimitive;
use serde_json::json;
use std::sync::Arc;

use crate::analyst::StandaloneProducer;
use crate::data::MarketData;
use crate::indicators;
use crate::vote::Ballot;

const MIN_BARS: usize = 35;

pub struct QuantitativeAnalyst {
    data: Arc<dyn MarketData>,
}

impl QuantitativeAnalyst {
    pub fn new(data: Arc<dyn MarketData>) -> Self {
        Self { data }
    }

    fn snapshot(&self, ticker: &Ticker, window: &DateWindow) -> Result<SignalPayload, String> {
        let bars = self
            .data
            .bars(ticker, window)
            .map_err(|e| e.to_string())?;
        if bars.len() < MIN_BARS {
            return Err(format!(
                "insufficient price history: {} bars, need {}",
                bars.len(),
                MIN_BARS
            ));
        }

        let closes: Vec<f64> = bars.iter().filter_map(|b| b.close.to_f64()).collect();
        let highs: Vec<f64> = bars.iter().filter_map(|b| b.high.to_f64()).collect();
        let lows: Vec<f64> = bars.iter().filter_map(|b| b.low.to_f64()).collect();
        let last = closes[closes.len() - 1];

        let rsi = indicators::rsi(&closes, 14);
        let macd = indicators::macd(&closes);
        let bands = indicators::bollinger(&closes, 20, 2.0);
        let atr = indicators::atr(&highs, &lows, &closes, 14);
        let stoch = indicators::stochastic(&highs, &lows, &closes, 14, 3);

        let mut ballot = Ballot::new();
        if let Some(rsi) = rsi {
            let bias = if rsi < 30.0 {
                1
            } else if rsi > 70.0 {
                -1
            } else {
                0
            };
            ballot.cast("rsi_14", bias, json!(rsi));
        }
        if let Some((_, _, hist)) = macd {
            let bias = if hist > 0.0 {
                1
            } else if hist < 0.0 {
                -1
            } else {
                0
            };
            ballot.cast("macd_histogram", bias, json!(hist));
        }
        if let Some((k, d)) = stoch {
            let bias = if k < 20.0 {
                1
            } else if k > 80.0 {
                -1
            } else {
                0
            };
            ballot.cast("stochastic_14_3", bias, json!({ "k": k, "d": d }));
        }

        let detail = json!({
            "close": last,
            "rsi_14": rsi,
            "macd": macd.map(|(line, signal, hist)| {
                json!({ "line": line, "signal": signal, "histogram": hist })
            }),
            "bollinger_20_2": bands.map(|(lower, mid, upper)| {
                json!({ "lower": lower, "middle": mid, "upper": upper })
            }),
            "sma_50": indicators::sma(&closes, 50),
            "sma_200": indicators::sma(&closes, 200),
            "ema_12": indicators::ema(&closes, 12),
            "ema_26": indicators::ema(&closes, 26),
            "atr_14": atr,
            "stochastic_14_3": stoch.map(|(k, d)| json!({ "k": k, "d": d })),
        });

        Ok(SignalPayload::Detailed {
            record: ballot.into_record(),
            detail,
        })
    }
}

impl StandaloneProducer for QuantitativeAnalyst {
    fn name(&self) -> &str {
        "quantitative_analyst"
    }

    fn produce(&self, ticker: &Ticker, window: &DateWindow) -> SignalPayload {
        match self.snapshot(ticker, window) {
            Ok(payload) => {
                debug!("[quantitative_analyst] {}: snapshot ready", ticker);
                payload
            }
            Err(details) => {
                debug!("[quantitative_analyst] {}: {}", ticker, details);
                SignalPayload::Simple(SignalRecord::failure(details))
            }
        }
    }
}
