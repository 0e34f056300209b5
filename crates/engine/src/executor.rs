//! Graph executor
//!
//! Fans the plan's analyst nodes out as concurrent tasks, each against its
//! own snapshot of the state, then folds their signals back in and runs the
//! risk and portfolio stages in order.
//!
//! Sibling ordering is unspecified and must not matter: each analyst writes
//! one disjoint key of `analyst_signals`. A failing or panicking analyst
//! leaves its key absent; absent means "no signal", never neutral.

use log::{debug, warn};
use quorum_analysts::MarketData;
use quorum_core::FundState;
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::error::ExecuteError;
use crate::plan::ExecutionPlan;
use crate::portfolio_stage::PortfolioStage;
use crate::registry::AnalystRegistry;
use crate::risk::RiskStage;

pub struct GraphExecutor {
    registry: Arc<AnalystRegistry>,
    data: Arc<dyn MarketData>,
    risk: RiskStage,
    portfolio: PortfolioStage,
}

impl GraphExecutor {
    pub fn new(registry: Arc<AnalystRegistry>, data: Arc<dyn MarketData>) -> Self {
        Self {
            registry,
            data,
            risk: RiskStage::new(),
            portfolio: PortfolioStage::new(),
        }
    }

    /// Builder: override the risk stage configuration.
    pub fn with_risk_stage(mut self, risk: RiskStage) -> Self {
        self.risk = risk;
        self
    }

    /// Run the plan to completion. On stage failure the error carries every
    /// signal gathered before it.
    pub async fn execute(
        &self,
        plan: &ExecutionPlan,
        mut state: FundState,
    ) -> Result<FundState, ExecuteError> {
        let mut tasks = JoinSet::new();
        for id in plan.analyst_nodes() {
            let Some(analyst) = self.registry.graph_analyst(id) else {
                warn!("[executor] plan node '{}' has no registered analyst", id);
                continue;
            };
            let analyst = Arc::clone(analyst);
            let snapshot = state.clone();
            tasks.spawn(async move {
                let result = analyst.analyze(&snapshot).await;
                (id, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((id, Ok(signals))) => {
                    debug!("[executor] {} returned {} signals", id, signals.len());
                    state.data.analyst_signals.insert(id.key().to_string(), signals);
                }
                Ok((id, Err(e))) => {
                    warn!("[executor] analyst '{}' failed, dropping its key: {}", id, e);
                }
                Err(e) => {
                    warn!("[executor] analyst task aborted: {}", e);
                }
            }
        }

        self.risk
            .run(&mut state, self.data.as_ref())
            .map_err(|stage| ExecuteError {
                stage,
                partial_signals: state.data.analyst_signals.clone(),
            })?;

        self.portfolio.run(&mut state).map_err(|stage| ExecuteError {
            stage,
            partial_signals: state.data.analyst_signals.clone(),
        })?;

        Ok(state)
    }
}
