//! Quorum Analysts
//!
//! The signal producers. Three families:
//!
//! - **Analytical analysts** (technical, fundamentals, sentiment, valuation):
//!   deterministic computations over provider data, run as graph nodes.
//! - **Persona analysts** (Ben Graham, Bill Ackman, Warren Buffett):
//!   delegate their reasoning to an external model through the
//!   `quorum-llm` client seam; higher latency, may fail per call. Also run
//!   as graph nodes.
//! - **Standalone producers** (quantitative analyst): run outside the graph
//!   in a synchronous per-ticker loop, report errors in-band, and emit rich
//!   detail payloads for display.
//!
//! All three populate every requested ticker - a producer never omits a
//! ticker it was asked to evaluate; per-ticker failures become error records.

pub mod analyst;
pub mod data;
pub mod fundamentals;
pub mod indicators;
pub mod personas;
pub mod quantitative;
pub mod sentiment;
pub mod technical;
pub mod valuation;
mod vote;

// Re-export main types
pub use analyst::{Analyst, AnalystError, Result, StandaloneProducer};
pub use data::{Bar, DataError, Fundamentals, MarketData, SentimentEvent, StaticMarketData};
pub use fundamentals::FundamentalsAnalyst;
pub use personas::{Persona, PersonaAnalyst};
pub use quantitative::QuantitativeAnalyst;
pub use sentiment::SentimentAnalyst;
pub use technical::TechnicalAnalyst;
pub use valuation::ValuationAnalyst;
