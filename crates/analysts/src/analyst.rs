//! Analyst traits - the producer seams the engine executes against
//!
//! Graph analysts receive the full fund state and return signals for every
//! requested ticker. A per-ticker problem becomes an error record inside the
//! returned map; returning `Err` is a node-level failure and the executor
//! drops the whole contribution. Standalone producers run outside the graph,
//! one ticker at a time, and never fail out-of-band.

use async_trait::async_trait;
use quorum_core::{DateWindow, FundState, SignalPayload, Ticker, TickerSignals};
use thiserror::Error;

use crate::data::DataError;

#[derive(Error, Debug)]
pub enum AnalystError {
    #[error("market data error: {0}")]
    Data(#[from] DataError),

    #[error("analyst failed: {0}")]
    Failed(String),
}

pub type Result<T> = std::result::Result<T, AnalystError>;

/// A graph-native signal producer.
#[async_trait]
pub trait Analyst: Send + Sync {
    /// Analyst name for logging.
    fn name(&self) -> &str;

    /// Evaluate every ticker in `state.data.tickers` over the state's date
    /// window. The returned map must contain an entry for each of them,
    /// using `SignalRecord::failure` for per-ticker problems.
    async fn analyze(&self, state: &FundState) -> Result<TickerSignals>;
}

/// A producer that runs outside the graph in a synchronous per-ticker loop.
/// Errors are reported in-band through the payload's error field.
pub trait StandaloneProducer: Send + Sync {
    /// Producer name for logging.
    fn name(&self) -> &str;

    fn produce(&self, ticker: &Ticker, window: &DateWindow) -> SignalPayload;
}
