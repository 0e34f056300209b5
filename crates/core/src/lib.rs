//! Quorum Core
//!
//! Domain types shared by every stage of the fund pipeline:
//!
//! - **Signals**: what analysts emit per ticker (direction, confidence,
//!   reasoning, in-band errors)
//! - **Portfolio**: cash, long/short positions, margin bookkeeping
//! - **Decisions**: the final per-ticker action/quantity output
//! - **FundState**: the single context threaded through the execution graph
//!
//! These types carry no orchestration logic. The graph builder, executor and
//! stages live in `quorum-engine`; analyst implementations in
//! `quorum-analysts`.

pub mod decision;
pub mod portfolio;
pub mod signal;
pub mod state;

// Re-export main types
pub use decision::{Action, Decision, DecisionSet, ParseFailure, parse_decisions};
pub use portfolio::{Portfolio, Position, RealizedGains};
pub use signal::{
    AnalystSignals, Reasoning, SignalDirection, SignalPayload, SignalRecord, TickerSignals,
};
pub use state::{DateWindow, FundData, FundState, Message, RiskLimit, Role, RunMetadata, Ticker};
