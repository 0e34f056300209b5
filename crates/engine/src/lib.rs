//! Quorum Engine
//!
//! The orchestration core. One pipeline invocation:
//!
//! 1. resolve the requested analyst keys against the typed registry,
//! 2. run standalone producers in a synchronous per-ticker loop,
//! 3. build the execution plan for the graph analysts,
//! 4. fan the graph analysts out concurrently, fan their signals back in,
//! 5. run the risk stage, then the portfolio decision stage,
//! 6. merge standalone and graph signals and parse the decision payload.
//!
//! Producer failures are isolated (absent key or error record); risk and
//! portfolio stage failures are fatal but always surface with the partial
//! signals attached.

pub mod error;
pub mod executor;
pub mod merger;
pub mod pipeline;
pub mod plan;
pub mod portfolio_stage;
pub mod registry;
pub mod risk;

// Re-export main types
pub use error::{BuildError, ExecuteError, StageError};
pub use executor::GraphExecutor;
pub use merger::merge_signals;
pub use pipeline::{Pipeline, PipelineRequest, RunError, RunReport};
pub use plan::{ExecutionPlan, NodeId, PlanBuilder};
pub use portfolio_stage::PortfolioStage;
pub use registry::{AnalystId, AnalystRegistry};
pub use risk::RiskStage;
