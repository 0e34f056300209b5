//! Pipeline entry point
//!
//! One invocation end to end: resolve the selection, run standalone
//! producers, execute the graph, merge, parse. The report is always
//! renderable; failure modes carry structured detail and whatever signals
//! were gathered, never an empty shape.

use log::{info, warn};
use quorum_analysts::MarketData;
use quorum_core::{
    AnalystSignals, DateWindow, DecisionSet, FundState, Portfolio, RunMetadata, Ticker,
    parse_decisions,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::error::BuildError;
use crate::executor::GraphExecutor;
use crate::merger::merge_signals;
use crate::plan::PlanBuilder;
use crate::registry::{AnalystId, AnalystRegistry};

/// Everything one invocation needs.
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub tickers: Vec<Ticker>,
    pub window: DateWindow,
    pub portfolio: Portfolio,
    /// None or empty selects every registered analyst
    pub selected_analysts: Option<Vec<String>>,
    pub show_reasoning: bool,
    pub model_name: String,
    pub model_provider: String,
}

/// Structured top-level failure, always displayable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunError {
    pub error: String,
    pub details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

/// What one invocation returns. `analyst_signals` is populated even when
/// `error` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub decisions: Option<DecisionSet>,
    pub analyst_signals: AnalystSignals,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RunError>,
}

pub struct Pipeline {
    registry: Arc<AnalystRegistry>,
    data: Arc<dyn MarketData>,
}

impl Pipeline {
    /// Fails fast on an empty registry; nothing downstream can recover from
    /// having no producers at all.
    pub fn new(
        registry: Arc<AnalystRegistry>,
        data: Arc<dyn MarketData>,
    ) -> Result<Self, BuildError> {
        registry.ensure_non_empty()?;
        Ok(Self { registry, data })
    }

    pub async fn run(&self, request: &PipelineRequest) -> RunReport {
        let started = Instant::now();
        let run_id = Uuid::new_v4();

        let requested = request.selected_analysts.clone().unwrap_or_default();
        let (selection, dropped) = self.registry.resolve(&requested);
        if !dropped.is_empty() {
            warn!("[pipeline] dropped unknown analyst keys: {:?}", dropped);
        }

        let standalone_signals = self.run_standalone(&selection, request);

        let state = FundState::new(
            request.tickers.clone(),
            request.portfolio.clone(),
            request.window,
            RunMetadata {
                show_reasoning: request.show_reasoning,
                model_name: request.model_name.clone(),
                model_provider: request.model_provider.clone(),
                run_id,
            },
        );

        let plan = PlanBuilder::build(&selection);
        let executor = GraphExecutor::new(Arc::clone(&self.registry), Arc::clone(&self.data));
        let report = match executor.execute(&plan, state).await {
            Ok(final_state) => {
                let analyst_signals = merge_signals(
                    &selection,
                    standalone_signals,
                    final_state.data.analyst_signals.clone(),
                );
                self.extract_decisions(&final_state, analyst_signals)
            }
            Err(e) => {
                let analyst_signals =
                    merge_signals(&selection, standalone_signals, e.partial_signals.clone());
                RunReport {
                    decisions: None,
                    analyst_signals,
                    error: Some(RunError {
                        error: "pipeline stage failed".to_string(),
                        details: e.stage.to_string(),
                        response: None,
                    }),
                }
            }
        };

        info!(
            "[pipeline] run {} over {} tickers finished in {:?}",
            run_id,
            request.tickers.len(),
            started.elapsed()
        );
        report
    }

    /// Standalone producers run before the graph, synchronously, one ticker
    /// at a time. They report problems in-band and never abort the run.
    fn run_standalone(
        &self,
        selection: &[AnalystId],
        request: &PipelineRequest,
    ) -> AnalystSignals {
        let mut all = AnalystSignals::new();
        for id in selection.iter().filter(|id| id.is_standalone()) {
            let Some(producer) = self.registry.standalone_producer(*id) else {
                continue;
            };
            let mut signals = quorum_core::TickerSignals::new();
            for ticker in &request.tickers {
                signals.insert(ticker.clone(), producer.produce(ticker, &request.window));
            }
            all.insert(id.key().to_string(), signals);
        }
        all
    }

    fn extract_decisions(
        &self,
        final_state: &FundState,
        analyst_signals: AnalystSignals,
    ) -> RunReport {
        let Some(payload) = final_state.final_message() else {
            return RunReport {
                decisions: None,
                analyst_signals,
                error: Some(RunError {
                    error: "no decisions produced".to_string(),
                    details: "run terminated without a final message".to_string(),
                    response: None,
                }),
            };
        };

        match parse_decisions(payload) {
            Ok(decisions) => RunReport {
                decisions: Some(decisions),
                analyst_signals,
                error: None,
            },
            Err(failure) => RunReport {
                decisions: None,
                analyst_signals,
                error: Some(RunError {
                    error: "decision payload parse failed".to_string(),
                    details: failure.details,
                    response: Some(failure.response),
                }),
            },
        }
    }
}
