//! Risk stage
//!
//! Computes per-ticker position limits from the portfolio snapshot and the
//! latest prices. Limits go into the typed `risk_limits` field on the state;
//! the portfolio stage reads them from there.
//!
//! Runs with any number of upstream signals including zero; limits derive
//! from portfolio state, not from analyst opinions. A ticker without price
//! data gets a zero limit and a warning, never a stage abort.

use log::{debug, warn};
use quorum_analysts::MarketData;
use quorum_core::{FundState, RiskLimit, Ticker};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

use crate::error::StageError;

/// Default cap on a single position as a fraction of equity.
const DEFAULT_LIMIT_FRACTION: Decimal = dec!(0.20);

pub struct RiskStage {
    limit_fraction: Decimal,
}

impl Default for RiskStage {
    fn default() -> Self {
        Self {
            limit_fraction: DEFAULT_LIMIT_FRACTION,
        }
    }
}

impl RiskStage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: override the per-position equity fraction.
    pub fn with_limit_fraction(mut self, fraction: Decimal) -> Self {
        self.limit_fraction = fraction;
        self
    }

    pub fn run(&self, state: &mut FundState, data: &dyn MarketData) -> Result<(), StageError> {
        let as_of = state.data.window.end;

        let mut prices: BTreeMap<Ticker, Decimal> = BTreeMap::new();
        for ticker in &state.data.tickers {
            match data.close_on(ticker, as_of) {
                Ok(price) => {
                    prices.insert(ticker.clone(), price);
                }
                Err(e) => {
                    warn!("[risk] no price for {} as of {}: {}", ticker, as_of, e);
                }
            }
        }

        let equity = state.data.portfolio.equity(&prices);
        debug!(
            "[risk] equity {} across {} priced tickers",
            equity,
            prices.len()
        );

        for ticker in state.data.tickers.clone() {
            let limit = match prices.get(&ticker) {
                Some(price) => {
                    let position_limit = (self.limit_fraction * equity).max(Decimal::ZERO);
                    let current = state
                        .data
                        .portfolio
                        .position(&ticker)
                        .net_value(*price)
                        .abs();
                    RiskLimit {
                        position_limit,
                        remaining_limit: (position_limit - current).max(Decimal::ZERO),
                        current_price: *price,
                    }
                }
                // Unpriced ticker: nothing may be opened
                None => RiskLimit::default(),
            };
            debug!(
                "[risk] {}: limit {} remaining {} at {}",
                ticker, limit.position_limit, limit.remaining_limit, limit.current_price
            );
            state.data.risk_limits.insert(ticker, limit);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use quorum_analysts::{Bar, StaticMarketData};
    use quorum_core::{DateWindow, Portfolio, RunMetadata};
    use uuid::Uuid;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn seed_price(data: &StaticMarketData, ticker: &Ticker, price: Decimal) {
        data.insert_bars(
            ticker.clone(),
            vec![Bar {
                date: day(3, 1),
                open: price,
                high: price,
                low: price,
                close: price,
                volume: 1_000,
            }],
        );
    }

    fn state(tickers: Vec<Ticker>, portfolio: Portfolio) -> FundState {
        FundState::new(
            tickers,
            portfolio,
            DateWindow::new(day(1, 1), day(3, 31)),
            RunMetadata {
                show_reasoning: false,
                model_name: "scripted".to_string(),
                model_provider: "Scripted".to_string(),
                run_id: Uuid::new_v4(),
            },
        )
    }

    #[test]
    fn test_limit_is_fraction_of_equity() {
        let data = StaticMarketData::new();
        let aapl = Ticker::from("AAPL");
        seed_price(&data, &aapl, dec!(100));

        let mut state = state(vec![aapl.clone()], Portfolio::with_cash(dec!(100_000)));
        RiskStage::new().run(&mut state, &data).unwrap();

        let limit = state.data.risk_limits.get(&aapl).unwrap();
        assert_eq!(limit.position_limit, dec!(20_000));
        assert_eq!(limit.remaining_limit, dec!(20_000));
        assert_eq!(limit.current_price, dec!(100));
    }

    #[test]
    fn test_existing_position_consumes_headroom() {
        let data = StaticMarketData::new();
        let msft = Ticker::from("MSFT");
        seed_price(&data, &msft, dec!(100));

        let mut portfolio = Portfolio::with_cash(dec!(90_000));
        portfolio.position_mut(&msft).long = 100; // 10_000 notional

        // equity = 90_000 + 10_000 = 100_000, limit 20_000, used 10_000
        let mut state = state(vec![msft.clone()], portfolio);
        RiskStage::new().run(&mut state, &data).unwrap();

        let limit = state.data.risk_limits.get(&msft).unwrap();
        assert_eq!(limit.position_limit, dec!(20_000));
        assert_eq!(limit.remaining_limit, dec!(10_000));
    }

    #[test]
    fn test_unpriced_ticker_gets_zero_limit_without_abort() {
        let data = StaticMarketData::new();
        let aapl = Ticker::from("AAPL");
        let ghost = Ticker::from("GHOST");
        seed_price(&data, &aapl, dec!(50));

        let mut state = state(
            vec![aapl.clone(), ghost.clone()],
            Portfolio::with_cash(dec!(10_000)),
        );
        RiskStage::new().run(&mut state, &data).unwrap();

        assert_eq!(
            state.data.risk_limits.get(&ghost).unwrap(),
            &RiskLimit::default()
        );
        assert!(state.data.risk_limits.get(&aapl).unwrap().position_limit > Decimal::ZERO);
    }

    #[test]
    fn test_runs_with_empty_signal_map() {
        let data = StaticMarketData::new();
        let ko = Ticker::from("KO");
        seed_price(&data, &ko, dec!(60));

        let mut state = state(vec![ko.clone()], Portfolio::with_cash(dec!(5_000)));
        assert!(state.data.analyst_signals.is_empty());
        RiskStage::new().run(&mut state, &data).unwrap();
        assert_eq!(state.data.risk_limits.len(), 1);
    }
}
