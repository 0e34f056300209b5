//! Typed analyst registry
//!
//! `AnalystId` is the single normalization boundary for analyst keys. Callers
//! may pass the bare key or the legacy `_agent` suffix form; both
//! canonicalize here and nowhere else. Everything downstream works with the
//! enum.

use log::warn;
use quorum_analysts::{Analyst, StandaloneProducer};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::BuildError;

/// Every analyst the simulator knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AnalystId {
    TechnicalAnalyst,
    FundamentalsAnalyst,
    SentimentAnalyst,
    ValuationAnalyst,
    BenGraham,
    BillAckman,
    WarrenBuffett,
    QuantitativeAnalyst,
}

impl AnalystId {
    /// Canonical ordering used for plans and reports.
    pub const ALL: [AnalystId; 8] = [
        AnalystId::TechnicalAnalyst,
        AnalystId::FundamentalsAnalyst,
        AnalystId::SentimentAnalyst,
        AnalystId::ValuationAnalyst,
        AnalystId::BenGraham,
        AnalystId::BillAckman,
        AnalystId::WarrenBuffett,
        AnalystId::QuantitativeAnalyst,
    ];

    /// Canonical key used in `analyst_signals` and on the wire.
    pub fn key(&self) -> &'static str {
        match self {
            AnalystId::TechnicalAnalyst => "technical_analyst",
            AnalystId::FundamentalsAnalyst => "fundamentals_analyst",
            AnalystId::SentimentAnalyst => "sentiment_analyst",
            AnalystId::ValuationAnalyst => "valuation_analyst",
            AnalystId::BenGraham => "ben_graham",
            AnalystId::BillAckman => "bill_ackman",
            AnalystId::WarrenBuffett => "warren_buffett",
            AnalystId::QuantitativeAnalyst => "quantitative_analyst",
        }
    }

    /// Parse a requested key. Tolerates surrounding whitespace, case and the
    /// `_agent` suffix form.
    pub fn parse(raw: &str) -> Option<AnalystId> {
        let key = raw.trim().to_lowercase();
        let key = key.strip_suffix("_agent").unwrap_or(key.as_str());
        Self::ALL.iter().copied().find(|id| id.key() == key)
    }

    /// Runs outside the graph in the standalone loop?
    pub fn is_standalone(&self) -> bool {
        matches!(self, AnalystId::QuantitativeAnalyst)
    }
}

impl fmt::Display for AnalystId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Immutable mapping from id to producer handle. Built once at bootstrap.
#[derive(Default)]
pub struct AnalystRegistry {
    graph: BTreeMap<AnalystId, Arc<dyn Analyst>>,
    standalone: BTreeMap<AnalystId, Arc<dyn StandaloneProducer>>,
}

impl AnalystRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: register a graph analyst under an id.
    pub fn with_graph(mut self, id: AnalystId, analyst: Arc<dyn Analyst>) -> Self {
        self.graph.insert(id, analyst);
        self
    }

    /// Builder: register a standalone producer under an id.
    pub fn with_standalone(mut self, id: AnalystId, producer: Arc<dyn StandaloneProducer>) -> Self {
        self.standalone.insert(id, producer);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty() && self.standalone.is_empty()
    }

    /// Fails when nothing is registered; a pipeline over an empty registry
    /// can never produce a meaningful report.
    pub fn ensure_non_empty(&self) -> Result<(), BuildError> {
        if self.is_empty() {
            return Err(BuildError::EmptyRegistry);
        }
        Ok(())
    }

    pub fn graph_analyst(&self, id: AnalystId) -> Option<&Arc<dyn Analyst>> {
        self.graph.get(&id)
    }

    pub fn standalone_producer(&self, id: AnalystId) -> Option<&Arc<dyn StandaloneProducer>> {
        self.standalone.get(&id)
    }

    /// All registered ids in canonical order.
    pub fn registered_ids(&self) -> Vec<AnalystId> {
        AnalystId::ALL
            .iter()
            .copied()
            .filter(|id| self.graph.contains_key(id) || self.standalone.contains_key(id))
            .collect()
    }

    /// Resolve requested keys to registered ids. Unknown or unregistered keys
    /// are dropped with a warning, duplicates collapse, and the result is in
    /// canonical order. An empty request selects everything registered.
    pub fn resolve(&self, requested: &[String]) -> (Vec<AnalystId>, Vec<String>) {
        if requested.is_empty() {
            return (self.registered_ids(), Vec::new());
        }

        let mut selected = Vec::new();
        let mut dropped = Vec::new();
        for raw in requested {
            match AnalystId::parse(raw) {
                Some(id)
                    if self.graph.contains_key(&id) || self.standalone.contains_key(&id) =>
                {
                    if !selected.contains(&id) {
                        selected.push(id);
                    }
                }
                Some(id) => {
                    warn!("[registry] analyst '{}' is not registered, dropping", id);
                    dropped.push(raw.clone());
                }
                None => {
                    warn!("[registry] unknown analyst key '{}', dropping", raw);
                    dropped.push(raw.clone());
                }
            }
        }
        selected.sort();
        (selected, dropped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use quorum_core::{DateWindow, FundState, SignalPayload, SignalRecord, Ticker, TickerSignals};

    struct NullAnalyst;

    #[async_trait]
    impl Analyst for NullAnalyst {
        fn name(&self) -> &str {
            "null"
        }

        async fn analyze(&self, _state: &FundState) -> quorum_analysts::Result<TickerSignals> {
            Ok(TickerSignals::new())
        }
    }

    struct NullProducer;

    impl StandaloneProducer for NullProducer {
        fn name(&self) -> &str {
            "null"
        }

        fn produce(&self, _ticker: &Ticker, _window: &DateWindow) -> SignalPayload {
            SignalPayload::Simple(SignalRecord::failure("null"))
        }
    }

    fn registry() -> AnalystRegistry {
        AnalystRegistry::new()
            .with_graph(AnalystId::TechnicalAnalyst, Arc::new(NullAnalyst))
            .with_graph(AnalystId::WarrenBuffett, Arc::new(NullAnalyst))
            .with_standalone(AnalystId::QuantitativeAnalyst, Arc::new(NullProducer))
    }

    #[test]
    fn test_parse_tolerates_agent_suffix_and_case() {
        assert_eq!(
            AnalystId::parse("technical_analyst"),
            Some(AnalystId::TechnicalAnalyst)
        );
        assert_eq!(
            AnalystId::parse("technical_analyst_agent"),
            Some(AnalystId::TechnicalAnalyst)
        );
        assert_eq!(
            AnalystId::parse("  Warren_Buffett  "),
            Some(AnalystId::WarrenBuffett)
        );
        assert_eq!(AnalystId::parse("astrologer"), None);
    }

    #[test]
    fn test_empty_request_selects_all_registered() {
        let (selected, dropped) = registry().resolve(&[]);
        assert_eq!(
            selected,
            vec![
                AnalystId::TechnicalAnalyst,
                AnalystId::WarrenBuffett,
                AnalystId::QuantitativeAnalyst,
            ]
        );
        assert!(dropped.is_empty());
    }

    #[test]
    fn test_unknown_and_unregistered_keys_dropped() {
        let (selected, dropped) = registry().resolve(&[
            "technical_analyst".to_string(),
            "astrologer".to_string(),
            "ben_graham".to_string(), // known id, not registered here
        ]);
        assert_eq!(selected, vec![AnalystId::TechnicalAnalyst]);
        assert_eq!(dropped.len(), 2);
    }

    #[test]
    fn test_duplicates_collapse_canonical_order() {
        let (selected, _) = registry().resolve(&[
            "quantitative_analyst".to_string(),
            "technical_analyst_agent".to_string(),
            "quantitative_analyst".to_string(),
        ]);
        assert_eq!(
            selected,
            vec![AnalystId::TechnicalAnalyst, AnalystId::QuantitativeAnalyst]
        );
    }

    #[test]
    fn test_empty_registry_fails_fast() {
        let empty = AnalystRegistry::new();
        assert_eq!(empty.ensure_non_empty(), Err(BuildError::EmptyRegistry));
        assert!(registry().ensure_non_empty().is_ok());
    }
}
