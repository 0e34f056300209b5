//! Quorum Backtest
//!
//! Replays the fund pipeline over a calendar range, one trading day at a
//! time. The driver owns the portfolio exclusively: each day gets a clone,
//! the pipeline never holds a reference across invocations, and fills are
//! applied back onto the owned book at that day's close.

pub mod driver;
pub mod fills;

// Re-export main types
pub use driver::{BacktestConfig, BacktestDriver, BacktestReport, DayError, EquityPoint};
pub use fills::apply_decision;
