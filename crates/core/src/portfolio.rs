//! Portfolio - cash, positions and margin bookkeeping
//!
//! Owned exclusively by the driver across invocations. The pipeline reads an
//! incoming snapshot and may emit an updated one; it never retains a
//! reference between calls.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::state::Ticker;

/// Long/short holdings for one ticker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Shares held long
    pub long: u64,
    /// Shares held short
    pub short: u64,
    /// Average cost per long share
    pub long_cost_basis: Decimal,
    /// Average entry price per short share
    pub short_cost_basis: Decimal,
    /// Margin posted against the short leg
    pub short_margin_used: Decimal,
}

impl Position {
    pub fn is_flat(&self) -> bool {
        self.long == 0 && self.short == 0
    }

    /// Gross notional at the given price (long + short legs).
    pub fn gross_value(&self, price: Decimal) -> Decimal {
        Decimal::from(self.long + self.short) * price
    }

    /// Net notional at the given price (long minus short).
    pub fn net_value(&self, price: Decimal) -> Decimal {
        (Decimal::from(self.long) - Decimal::from(self.short)) * price
    }
}

/// Realized PnL per ticker, split by side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RealizedGains {
    pub long: Decimal,
    pub short: Decimal,
}

/// The fund's book: cash plus per-ticker positions and realized gains.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    /// Free cash. Non-negative under normal operation; may dip negative only
    /// transiently before risk checks.
    pub cash: Decimal,
    /// Total margin currently posted
    pub margin_used: Decimal,
    /// Margin fraction required on short notional (e.g. 0.5 = 50%)
    pub margin_requirement: Decimal,
    pub positions: BTreeMap<Ticker, Position>,
    pub realized_gains: BTreeMap<Ticker, RealizedGains>,
}

impl Portfolio {
    /// A fresh portfolio holding only cash.
    pub fn with_cash(cash: Decimal) -> Self {
        Self {
            cash,
            ..Default::default()
        }
    }

    /// Position for a ticker (default flat if never traded).
    pub fn position(&self, ticker: &Ticker) -> Position {
        self.positions.get(ticker).cloned().unwrap_or_default()
    }

    /// Mutable position entry, created on first touch.
    pub fn position_mut(&mut self, ticker: &Ticker) -> &mut Position {
        self.positions.entry(ticker.clone()).or_default()
    }

    /// Mutable realized-gains entry, created on first touch.
    pub fn gains_mut(&mut self, ticker: &Ticker) -> &mut RealizedGains {
        self.realized_gains.entry(ticker.clone()).or_default()
    }

    /// Net value of all positions at the supplied prices. Tickers without a
    /// price contribute nothing.
    pub fn total_position_value(&self, prices: &BTreeMap<Ticker, Decimal>) -> Decimal {
        self.positions
            .iter()
            .filter_map(|(ticker, pos)| prices.get(ticker).map(|p| pos.net_value(*p)))
            .sum()
    }

    /// Cash plus net position value.
    pub fn equity(&self, prices: &BTreeMap<Ticker, Decimal>) -> Decimal {
        self.cash + self.total_position_value(prices)
    }
}
