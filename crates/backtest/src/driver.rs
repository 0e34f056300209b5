//! Backtest driver
//!
//! Owns the portfolio exclusively and replays the pipeline over the
//! configured range sequentially. Each trading day the pipeline gets a clone
//! of the book plus a lookback window ending that day; fills from the parsed
//! decisions are applied at the day's close and the updated book carries
//! into the next day.
//!
//! A failed day is recorded and skipped, never fatal to the run.

use chrono::{Days, NaiveDate};
use log::{info, warn};
use quorum_analysts::MarketData;
use quorum_core::{DateWindow, DecisionSet, Portfolio, Ticker};
use quorum_engine::{Pipeline, PipelineRequest, RunError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::fills::apply_decision;

/// Calendar days of history handed to each daily invocation.
const DEFAULT_LOOKBACK_DAYS: u64 = 120;

#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub tickers: Vec<Ticker>,
    pub window: DateWindow,
    pub initial_cash: Decimal,
    pub margin_requirement: Decimal,
    pub selected_analysts: Option<Vec<String>>,
    pub model_name: String,
    pub model_provider: String,
    pub lookback_days: u64,
}

impl BacktestConfig {
    pub fn new(tickers: Vec<Ticker>, window: DateWindow) -> Self {
        Self {
            tickers,
            window,
            initial_cash: dec!(100_000),
            margin_requirement: Decimal::ZERO,
            selected_analysts: None,
            model_name: "scripted".to_string(),
            model_provider: "Scripted".to_string(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
        }
    }

    /// Builder: set starting cash.
    pub fn with_initial_cash(mut self, cash: Decimal) -> Self {
        self.initial_cash = cash;
        self
    }

    /// Builder: set the short margin requirement.
    pub fn with_margin_requirement(mut self, requirement: Decimal) -> Self {
        self.margin_requirement = requirement;
        self
    }

    /// Builder: restrict the analyst selection.
    pub fn with_analysts(mut self, keys: Vec<String>) -> Self {
        self.selected_analysts = Some(keys);
        self
    }
}

/// Portfolio value at one day's close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: Decimal,
    pub cash: Decimal,
}

/// One day the pipeline failed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayError {
    pub date: NaiveDate,
    pub error: RunError,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub equity_curve: Vec<EquityPoint>,
    pub final_portfolio: Portfolio,
    pub days_run: usize,
    pub decision_log: Vec<(NaiveDate, DecisionSet)>,
    pub errors: Vec<DayError>,
}

pub struct BacktestDriver {
    pipeline: Pipeline,
    data: Arc<dyn MarketData>,
    config: BacktestConfig,
}

impl BacktestDriver {
    pub fn new(pipeline: Pipeline, data: Arc<dyn MarketData>, config: BacktestConfig) -> Self {
        Self {
            pipeline,
            data,
            config,
        }
    }

    /// Run the whole range. Sequential by design: the next day's invocation
    /// sees the book as the previous day's fills left it.
    pub async fn run(&self) -> BacktestReport {
        let mut portfolio = Portfolio::with_cash(self.config.initial_cash);
        portfolio.margin_requirement = self.config.margin_requirement;

        let mut equity_curve = Vec::new();
        let mut decision_log = Vec::new();
        let mut errors = Vec::new();
        let mut days_run = 0;

        for date in self.config.window.trading_days() {
            let lookback_start = date
                .checked_sub_days(Days::new(self.config.lookback_days))
                .unwrap_or(date);

            let report = self
                .pipeline
                .run(&PipelineRequest {
                    tickers: self.config.tickers.clone(),
                    window: DateWindow::new(lookback_start, date),
                    portfolio: portfolio.clone(),
                    selected_analysts: self.config.selected_analysts.clone(),
                    show_reasoning: false,
                    model_name: self.config.model_name.clone(),
                    model_provider: self.config.model_provider.clone(),
                })
                .await;

            if let Some(error) = report.error {
                warn!("[backtest] {}: {} ({})", date, error.error, error.details);
                errors.push(DayError { date, error });
            }
            if let Some(decisions) = report.decisions {
                for (ticker, decision) in &decisions {
                    match self.data.close_on(ticker, date) {
                        Ok(price) => {
                            apply_decision(&mut portfolio, ticker, decision, price);
                        }
                        Err(e) => {
                            warn!("[backtest] {}: no fill price for {}: {}", date, ticker, e);
                        }
                    }
                }
                decision_log.push((date, decisions));
            }

            equity_curve.push(EquityPoint {
                date,
                equity: portfolio.equity(&self.closing_prices(date)),
                cash: portfolio.cash,
            });
            days_run += 1;
        }

        if let Some(last) = equity_curve.last() {
            info!(
                "[backtest] {} days, final equity {} (cash {})",
                days_run, last.equity, last.cash
            );
        }

        BacktestReport {
            equity_curve,
            final_portfolio: portfolio,
            days_run,
            decision_log,
            errors,
        }
    }

    fn closing_prices(&self, date: NaiveDate) -> BTreeMap<Ticker, Decimal> {
        let mut prices = BTreeMap::new();
        for ticker in &self.config.tickers {
            if let Ok(price) = self.data.close_on(ticker, date) {
                prices.insert(ticker.clone(), price);
            }
        }
        prices
    }
}
