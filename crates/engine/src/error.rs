//! Engine error taxonomy
//!
//! Three failure classes with different blast radii:
//!
//! - producer failures stay inside the producer (error record or absent key),
//! - `BuildError` aborts before anything runs,
//! - `StageError` aborts the invocation but carries the signals gathered so
//!   far, so partial results are never dropped.

use quorum_core::AnalystSignals;
use thiserror::Error;

/// Fatal pre-execution problems.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("no analysts registered")]
    EmptyRegistry,
}

/// A post-fan-in stage failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    #[error("risk stage failed: {0}")]
    Risk(String),

    #[error("portfolio stage failed: {0}")]
    Portfolio(String),
}

/// Executor failure wrapping the stage error together with every analyst
/// signal accumulated before the failure.
#[derive(Error, Debug)]
#[error("{stage}")]
pub struct ExecuteError {
    #[source]
    pub stage: StageError,
    pub partial_signals: AnalystSignals,
}
