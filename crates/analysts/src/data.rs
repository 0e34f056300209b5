//! Market data seam
//!
//! Analysts read prices, fundamentals and news sentiment through the
//! `MarketData` trait. `StaticMarketData` is the in-memory implementation
//! used by the runner, backtests and tests; it is dashmap-backed so sibling
//! analysts can read it concurrently during graph fan-out.

use chrono::NaiveDate;
use dashmap::DashMap;
use quorum_core::{DateWindow, Ticker};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum DataError {
    #[error("no price history for {0}")]
    NoPriceHistory(Ticker),

    #[error("no fundamentals for {0}")]
    NoFundamentals(Ticker),

    #[error("no sentiment data for {0}")]
    NoSentiment(Ticker),
}

/// One daily OHLCV bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
}

/// Point-in-time fundamental metrics. Ratios are fractions (0.15 = 15%).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    pub revenue_growth: Decimal,
    pub earnings_growth: Decimal,
    pub net_margin: Decimal,
    pub operating_margin: Decimal,
    pub return_on_equity: Decimal,
    pub debt_to_equity: Decimal,
    pub pe_ratio: Decimal,
    pub pb_ratio: Decimal,
    pub earnings_per_share: Decimal,
    pub free_cash_flow_per_share: Decimal,
    pub book_value_per_share: Decimal,
    pub shares_outstanding: u64,
}

impl Fundamentals {
    /// Market capitalization at the given share price.
    pub fn market_cap(&self, price: Decimal) -> Decimal {
        Decimal::from(self.shares_outstanding) * price
    }
}

/// One scored news item. Score in [-1, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentEvent {
    pub date: NaiveDate,
    pub score: Decimal,
    pub headline: String,
}

/// Read-only data access for analysts. Implementations must be safe for
/// concurrent reads from sibling graph nodes.
pub trait MarketData: Send + Sync {
    /// Daily bars dated at or before `window.end`, oldest first. More
    /// history than the window may be returned - indicator lookbacks reach
    /// further than the requested range.
    fn bars(&self, ticker: &Ticker, window: &DateWindow) -> Result<Vec<Bar>, DataError>;

    fn fundamentals(&self, ticker: &Ticker) -> Result<Fundamentals, DataError>;

    /// Scored news within the window, oldest first.
    fn sentiment(
        &self,
        ticker: &Ticker,
        window: &DateWindow,
    ) -> Result<Vec<SentimentEvent>, DataError>;

    /// Closing price of the last bar at or before `date`.
    fn close_on(&self, ticker: &Ticker, date: NaiveDate) -> Result<Decimal, DataError> {
        let window = DateWindow::new(date, date);
        let bars = self.bars(ticker, &window)?;
        bars.last()
            .map(|b| b.close)
            .ok_or_else(|| DataError::NoPriceHistory(ticker.clone()))
    }
}

/// In-memory provider seeded up front.
#[derive(Debug, Default)]
pub struct StaticMarketData {
    bars: DashMap<Ticker, Vec<Bar>>,
    fundamentals: DashMap<Ticker, Fundamentals>,
    sentiment: DashMap<Ticker, Vec<SentimentEvent>>,
}

impl StaticMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed bar history for a ticker (sorted by date on insert).
    pub fn insert_bars(&self, ticker: Ticker, mut bars: Vec<Bar>) {
        bars.sort_by_key(|b| b.date);
        self.bars.insert(ticker, bars);
    }

    pub fn insert_fundamentals(&self, ticker: Ticker, fundamentals: Fundamentals) {
        self.fundamentals.insert(ticker, fundamentals);
    }

    pub fn insert_sentiment(&self, ticker: Ticker, mut events: Vec<SentimentEvent>) {
        events.sort_by_key(|e| e.date);
        self.sentiment.insert(ticker, events);
    }
}

impl MarketData for StaticMarketData {
    fn bars(&self, ticker: &Ticker, window: &DateWindow) -> Result<Vec<Bar>, DataError> {
        let bars = self
            .bars
            .get(ticker)
            .ok_or_else(|| DataError::NoPriceHistory(ticker.clone()))?;
        let filtered: Vec<Bar> = bars
            .iter()
            .filter(|b| b.date <= window.end)
            .cloned()
            .collect();
        if filtered.is_empty() {
            return Err(DataError::NoPriceHistory(ticker.clone()));
        }
        Ok(filtered)
    }

    fn fundamentals(&self, ticker: &Ticker) -> Result<Fundamentals, DataError> {
        self.fundamentals
            .get(ticker)
            .map(|f| f.clone())
            .ok_or_else(|| DataError::NoFundamentals(ticker.clone()))
    }

    fn sentiment(
        &self,
        ticker: &Ticker,
        window: &DateWindow,
    ) -> Result<Vec<SentimentEvent>, DataError> {
        let events = self
            .sentiment
            .get(ticker)
            .ok_or_else(|| DataError::NoSentiment(ticker.clone()))?;
        Ok(events
            .iter()
            .filter(|e| window.contains(e.date))
            .cloned()
            .collect())
    }
}
