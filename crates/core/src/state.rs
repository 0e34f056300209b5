//! FundState - the single context threaded through the execution graph
//!
//! Created fresh per pipeline invocation, mutated in place by each node, and
//! discarded once the result merger has extracted what it needs. Nothing is
//! retained across invocations.

use chrono::{NaiveDate, Weekday, Datelike};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::portfolio::Portfolio;
use crate::signal::AnalystSignals;

/// Ticker symbol, stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticker(String);

impl Ticker {
    pub fn new(symbol: impl AsRef<str>) -> Self {
        Self(symbol.as_ref().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Ticker {
    fn from(s: &str) -> Self {
        Ticker::new(s)
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Inclusive calendar window for an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Weekdays in the window, in order. Holidays are not modeled.
    pub fn trading_days(&self) -> Vec<NaiveDate> {
        let mut days = Vec::new();
        let mut day = self.start;
        while day <= self.end {
            if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
                days.push(day);
            }
            day = match day.succ_opt() {
                Some(next) => next,
                None => break,
            };
        }
        days
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Conversational turn role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One conversational turn. The last message at termination is the
/// authoritative decision payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Per-ticker position limit computed by the risk stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskLimit {
    /// Maximum notional allowed in this ticker
    pub position_limit: Decimal,
    /// Headroom left after the current position
    pub remaining_limit: Decimal,
    /// Price used for the limit computation
    pub current_price: Decimal,
}

/// Structured payload threaded through the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundData {
    /// Requested tickers, order-preserving, deduped
    pub tickers: Vec<Ticker>,
    pub portfolio: Portfolio,
    pub window: DateWindow,
    /// Analyst key -> ticker -> signal. Siblings write disjoint keys; no
    /// ordering dependency is permitted between them.
    pub analyst_signals: AnalystSignals,
    /// Populated by the risk stage, consumed by the portfolio stage
    pub risk_limits: BTreeMap<Ticker, RiskLimit>,
}

/// Immutable run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub show_reasoning: bool,
    pub model_name: String,
    pub model_provider: String,
    pub run_id: Uuid,
}

/// The mutable context threaded through every node of one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundState {
    /// Append-only conversation; last entry is the decision payload
    pub messages: Vec<Message>,
    pub data: FundData,
    pub metadata: RunMetadata,
}

impl FundState {
    pub fn new(
        tickers: Vec<Ticker>,
        portfolio: Portfolio,
        window: DateWindow,
        metadata: RunMetadata,
    ) -> Self {
        let mut seen = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            if !seen.contains(&ticker) {
                seen.push(ticker);
            }
        }
        Self {
            messages: vec![Message::user(
                "Make trading decisions based on the provided data.",
            )],
            data: FundData {
                tickers: seen,
                portfolio,
                window,
                analyst_signals: AnalystSignals::new(),
                risk_limits: BTreeMap::new(),
            },
            metadata,
        }
    }

    /// Content of the final message, if any.
    pub fn final_message(&self) -> Option<&str> {
        self.messages.last().map(|m| m.content.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn metadata() -> RunMetadata {
        RunMetadata {
            show_reasoning: false,
            model_name: "scripted".to_string(),
            model_provider: "Scripted".to_string(),
            run_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_ticker_normalized_uppercase() {
        assert_eq!(Ticker::new(" aapl "), Ticker::from("AAPL"));
    }

    #[test]
    fn test_tickers_deduped_order_preserved() {
        let state = FundState::new(
            vec![
                Ticker::from("MSFT"),
                Ticker::from("AAPL"),
                Ticker::from("MSFT"),
            ],
            Portfolio::with_cash(dec!(1_000)),
            DateWindow::new(
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            ),
            metadata(),
        );
        assert_eq!(
            state.data.tickers,
            vec![Ticker::from("MSFT"), Ticker::from("AAPL")]
        );
    }

    #[test]
    fn test_trading_days_skip_weekends() {
        // 2024-06-03 is a Monday
        let window = DateWindow::new(
            NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 9).unwrap(),
        );
        let days = window.trading_days();
        assert_eq!(days.len(), 5);
        assert_eq!(days[0], NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
        assert_eq!(days[4], NaiveDate::from_ymd_opt(2024, 6, 7).unwrap());
    }

    #[test]
    fn test_initial_message_present() {
        let state = FundState::new(
            vec![Ticker::from("AAPL")],
            Portfolio::default(),
            DateWindow::new(
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            ),
            metadata(),
        );
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.messages[0].role, Role::User);
    }
}
