//! Portfolio decision stage
//!
//! Folds every analyst's view of a ticker into one action by a
//! confidence-weighted vote, then sizes the trade inside the risk limits.
//! Deterministic: same signals and limits always produce the same decisions.
//!
//! Unwind before reversal: a short book is covered before any buying, a long
//! book is sold before any shorting. Every requested ticker gets a decision;
//! zero contributing signals means hold with confidence zero.

use log::debug;
use quorum_core::{
    Action, Decision, DecisionSet, FundState, Message, RiskLimit, SignalRecord, Ticker,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::StageError;

#[derive(Default)]
pub struct PortfolioStage;

impl PortfolioStage {
    pub fn new() -> Self {
        Self
    }

    pub fn run(&self, state: &mut FundState) -> Result<(), StageError> {
        let mut decisions = DecisionSet::new();
        for ticker in state.data.tickers.clone() {
            let records: Vec<&SignalRecord> = state
                .data
                .analyst_signals
                .values()
                .filter_map(|signals| signals.get(&ticker))
                .map(|payload| payload.record())
                .filter(|record| record.is_actionable())
                .collect();

            let limit = state
                .data
                .risk_limits
                .get(&ticker)
                .cloned()
                .unwrap_or_default();
            let decision = self.decide(state, &ticker, &records, &limit);
            debug!(
                "[portfolio] {}: {:?} x{} ({})",
                ticker, decision.action, decision.quantity, decision.confidence
            );
            decisions.insert(ticker, decision);
        }

        let payload = serde_json::to_string(&decisions)
            .map_err(|e| StageError::Portfolio(format!("decision serialization failed: {e}")))?;
        state.messages.push(Message::assistant(payload));
        Ok(())
    }

    fn decide(
        &self,
        state: &FundState,
        ticker: &Ticker,
        records: &[&SignalRecord],
        limit: &RiskLimit,
    ) -> Decision {
        // Confidence-weighted net vote. Abstaining records (no confidence)
        // carry no weight.
        let mut net = Decimal::ZERO;
        let mut contributing = 0u32;
        for record in records {
            let weight = record.confidence.unwrap_or(Decimal::ZERO);
            net += Decimal::from(record.direction.bias()) * weight;
            contributing += 1;
        }

        if contributing == 0 {
            return Decision::hold("no actionable signals");
        }
        let confidence = (net.abs() / Decimal::from(contributing)).min(Decimal::from(100));
        if net == Decimal::ZERO {
            return Decision {
                action: Action::Hold,
                quantity: 0,
                confidence,
                reasoning: format!("signals balanced across {contributing} analysts"),
            };
        }

        let position = state.data.portfolio.position(ticker);
        let price = limit.current_price;
        if price <= Decimal::ZERO {
            return Decision::hold("no price data");
        }

        let (action, quantity) = if net > Decimal::ZERO {
            if position.short > 0 {
                (Action::Cover, position.short)
            } else {
                (Action::Buy, self.buy_quantity(state, limit))
            }
        } else if position.long > 0 {
            (Action::Sell, position.long)
        } else {
            (Action::Short, self.short_quantity(state, limit))
        };

        if quantity == 0 {
            return Decision {
                action: Action::Hold,
                quantity: 0,
                confidence,
                reasoning: format!("{action:?} signal with no headroom"),
            };
        }

        Decision {
            action,
            quantity,
            confidence,
            reasoning: format!(
                "net weighted vote {net} across {contributing} analysts"
            ),
        }
    }

    /// Shares purchasable inside both the risk headroom and free cash.
    fn buy_quantity(&self, state: &FundState, limit: &RiskLimit) -> u64 {
        let by_limit = limit.remaining_limit / limit.current_price;
        let by_cash = state.data.portfolio.cash.max(Decimal::ZERO) / limit.current_price;
        floor_shares(by_limit.min(by_cash))
    }

    /// Shares shortable inside the risk headroom and the cash available to
    /// post as margin.
    fn short_quantity(&self, state: &FundState, limit: &RiskLimit) -> u64 {
        let by_limit = limit.remaining_limit / limit.current_price;
        let margin_requirement = state.data.portfolio.margin_requirement;
        let by_margin = if margin_requirement > Decimal::ZERO {
            state.data.portfolio.cash.max(Decimal::ZERO)
                / (limit.current_price * margin_requirement)
        } else {
            by_limit
        };
        floor_shares(by_limit.min(by_margin))
    }
}

fn floor_shares(value: Decimal) -> u64 {
    value.floor().to_u64().unwrap_or(0)
}
