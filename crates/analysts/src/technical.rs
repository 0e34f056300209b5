//! Technical analyst
//!
//! Votes four indicator checks per ticker: RSI extremes, MACD crossover,
//! Bollinger band touches and the 50/200 SMA trend (only when enough
//! history exists). Requires 35 bars so MACD has its full lookback.

use async_trait::async_trait;
use log::debug;
use quorum_core::{FundState, SignalPayload, SignalRecord, Ticker, TickerSignals};
use rust_decimal::prelude::ToPrimitive;
use serde_json::json;
use std::sync::Arc;

use crate::analyst::{Analyst, Result};
use crate::data::MarketData;
use crate::indicators;
use crate::vote::Ballot;

const MIN_BARS: usize = 35;

pub struct TechnicalAnalyst {
    data: Arc<dyn MarketData>,
}

impl TechnicalAnalyst {
    pub fn new(data: Arc<dyn MarketData>) -> Self {
        Self { data }
    }

    fn evaluate(&self, state: &FundState, ticker: &Ticker) -> SignalRecord {
        let bars = match self.data.bars(ticker, &state.data.window) {
            Ok(bars) => bars,
            Err(e) => return SignalRecord::failure(e.to_string()),
        };
        if bars.len() < MIN_BARS {
            return SignalRecord::failure(format!(
                "insufficient price history: {} bars, need {}",
                bars.len(),
                MIN_BARS
            ));
        }

        let closes: Vec<f64> = bars.iter().filter_map(|b| b.close.to_f64()).collect();
        let last = closes[closes.len() - 1];
        let mut ballot = Ballot::new();

        if let Some(rsi) = indicators::rsi(&closes, 14) {
            let bias = if rsi < 30.0 {
                1
            } else if rsi > 70.0 {
                -1
            } else {
                0
            };
            ballot.cast("rsi_14", bias, json!(rsi));
        }

        if let Some((line, signal, hist)) = indicators::macd(&closes) {
            let bias = if hist > 0.0 {
                1
            } else if hist < 0.0 {
                -1
            } else {
                0
            };
            ballot.cast(
                "macd",
                bias,
                json!({ "line": line, "signal": signal, "histogram": hist }),
            );
        }

        if let Some((lower, _, upper)) = indicators::bollinger(&closes, 20, 2.0) {
            let bias = if last < lower {
                1
            } else if last > upper {
                -1
            } else {
                0
            };
            ballot.cast("bollinger_20_2", bias, json!({ "lower": lower, "upper": upper, "close": last }));
        }

        // Trend check only fires with a full 200-day lookback
        if closes.len() >= 200 {
            if let (Some(fast), Some(slow)) =
                (indicators::sma(&closes, 50), indicators::sma(&closes, 200))
            {
                let bias = if fast > slow {
                    1
                } else if fast < slow {
                    -1
                } else {
                    0
                };
                ballot.cast("sma_50_200", bias, json!({ "sma_50": fast, "sma_200": slow }));
            }
        }

        ballot.into_record()
    }
}

#[async_trait]
impl Analyst for TechnicalAnalyst {
    fn name(&self) -> &str {
        "technical_analyst"
    }

    async fn analyze(&self, state: &FundState) -> Result<TickerSignals> {
        let mut signals = TickerSignals::new();
        for ticker in &state.data.tickers {
            let record = self.evaluate(state, ticker);
            debug!(
                "[technical_analyst] {}: {:?} ({:?})",
                ticker, record.direction, record.confidence
            );
            signals.insert(ticker.clone(), SignalPayload::Simple(record));
        }
        Ok(signals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Bar, StaticMarketData};
    use chrono::NaiveDate;
    use quorum_core::{DateWindow, Portfolio, RunMetadata, SignalDirection};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn metadata() -> RunMetadata {
        RunMetadata {
            show_reasoning: false,
            model_name: "scripted".to_string(),
            model_provider: "Scripted".to_string(),
            run_id: Uuid::new_v4(),
        }
    }

    fn seed_bars(data: &StaticMarketData, ticker: &Ticker, closes: &[Decimal]) {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars: Vec<Bar> = closes
            .iter()
            .enumerate()
            .map(|(i, close)| Bar {
                date: start + chrono::Days::new(i as u64),
                open: *close,
                high: *close + dec!(1),
                low: *close - dec!(1),
                close: *close,
                volume: 10_000,
            })
            .collect();
        data.insert_bars(ticker.clone(), bars);
    }

    fn state_for(ticker: &Ticker) -> FundState {
        let window = DateWindow::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        );
        FundState::new(
            vec![ticker.clone()],
            Portfolio::with_cash(dec!(100_000)),
            window,
            metadata(),
        )
    }

    #[tokio::test]
    async fn test_short_history_yields_error_record() {
        let data = Arc::new(StaticMarketData::new());
        let ticker = Ticker::from("AAPL");
        seed_bars(&data, &ticker, &[dec!(100); 10]);

        let analyst = TechnicalAnalyst::new(data);
        let signals = analyst.analyze(&state_for(&ticker)).await.unwrap();
        let record = signals.get(&ticker).unwrap().record();
        assert!(record.is_error());
        assert_eq!(record.direction, SignalDirection::Neutral);
    }

    #[tokio::test]
    async fn test_downtrend_reads_bearish_or_oversold() {
        let data = Arc::new(StaticMarketData::new());
        let ticker = Ticker::from("TSLA");
        // Steady decline: MACD histogram negative, RSI deep in oversold.
        // The two checks disagree by construction, so just assert a verdict
        // with structured reasoning came back.
        let closes: Vec<Decimal> = (0..60).map(|i| dec!(200) - Decimal::from(i)).collect();
        seed_bars(&data, &ticker, &closes);

        let analyst = TechnicalAnalyst::new(data);
        let signals = analyst.analyze(&state_for(&ticker)).await.unwrap();
        let record = signals.get(&ticker).unwrap().record();
        assert!(!record.is_error());
        assert!(record.confidence.is_some());
    }

    #[tokio::test]
    async fn test_every_ticker_gets_an_entry() {
        let data = Arc::new(StaticMarketData::new());
        let aapl = Ticker::from("AAPL");
        seed_bars(&data, &aapl, &[dec!(150); 40]);
        // MSFT has no data at all

        let window = DateWindow::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        );
        let state = FundState::new(
            vec![aapl.clone(), Ticker::from("MSFT")],
            Portfolio::with_cash(dec!(100_000)),
            window,
            metadata(),
        );

        let analyst = TechnicalAnalyst::new(data);
        let signals = analyst.analyze(&state).await.unwrap();
        assert_eq!(signals.len(), 2);
        assert!(!signals.get(&aapl).unwrap().record().is_error());
        assert!(signals.get(&Ticker::from("MSFT")).unwrap().record().is_error());
    }
}
