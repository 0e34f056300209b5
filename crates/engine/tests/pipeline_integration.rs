//! End-to-end pipeline runs against seeded in-memory data and scripted
//! model replies.

use async_trait::async_trait;
use chrono::NaiveDate;
use quorum_analysts::{
    Analyst, AnalystError, Bar, Fundamentals, MarketData, QuantitativeAnalyst, StaticMarketData,
    TechnicalAnalyst,
};
use quorum_core::{
    Action, DateWindow, FundState, Portfolio, SignalDirection, SignalPayload, SignalRecord,
    Ticker, TickerSignals, parse_decisions,
};
use quorum_engine::{AnalystId, AnalystRegistry, Pipeline, PipelineRequest};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

fn day(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, d).unwrap()
}

fn window() -> DateWindow {
    DateWindow::new(day(1, 1), day(3, 28))
}

fn seeded_data(tickers: &[&str]) -> Arc<StaticMarketData> {
    let data = StaticMarketData::new();
    for symbol in tickers {
        let ticker = Ticker::from(*symbol);
        let bars: Vec<Bar> = (0..60)
            .map(|i| {
                let close = dec!(100) + Decimal::from(i % 9);
                Bar {
                    date: day(1, 1) + chrono::Days::new(i as u64),
                    open: close,
                    high: close + dec!(2),
                    low: close - dec!(2),
                    close,
                    volume: 10_000,
                }
            })
            .collect();
        data.insert_bars(ticker.clone(), bars);
        data.insert_fundamentals(
            ticker.clone(),
            Fundamentals {
                net_margin: dec!(0.2),
                revenue_growth: dec!(0.1),
                return_on_equity: dec!(0.18),
                pe_ratio: dec!(18),
                free_cash_flow_per_share: dec!(6),
                shares_outstanding: 1_000_000,
                ..Fundamentals::default()
            },
        );
    }
    Arc::new(data)
}

/// Deterministic graph analyst used where a fixed opinion is needed.
struct OpinionatedAnalyst {
    direction: SignalDirection,
    fail_for: Option<Ticker>,
}

#[async_trait]
impl Analyst for OpinionatedAnalyst {
    fn name(&self) -> &str {
        "opinionated"
    }

    async fn analyze(&self, state: &FundState) -> quorum_analysts::Result<TickerSignals> {
        let mut signals = TickerSignals::new();
        for ticker in &state.data.tickers {
            let record = match &self.fail_for {
                Some(bad) if bad == ticker => SignalRecord::failure("simulated feed outage"),
                _ => SignalRecord::new(self.direction).with_confidence(dec!(80)),
            };
            signals.insert(ticker.clone(), SignalPayload::Simple(record));
        }
        Ok(signals)
    }
}

/// Graph analyst that always fails at node level.
struct DeadAnalyst;

#[async_trait]
impl Analyst for DeadAnalyst {
    fn name(&self) -> &str {
        "dead"
    }

    async fn analyze(&self, _state: &FundState) -> quorum_analysts::Result<TickerSignals> {
        Err(AnalystError::Failed("always down".to_string()))
    }
}

fn request(tickers: &[&str], analysts: Option<Vec<&str>>) -> PipelineRequest {
    PipelineRequest {
        tickers: tickers.iter().map(|t| Ticker::from(*t)).collect(),
        window: window(),
        portfolio: Portfolio::with_cash(dec!(100_000)),
        selected_analysts: analysts
            .map(|keys| keys.into_iter().map(str::to_string).collect()),
        show_reasoning: false,
        model_name: "scripted".to_string(),
        model_provider: "Scripted".to_string(),
    }
}

#[tokio::test]
async fn test_quant_only_run_produces_decision_and_quant_key() {
    let data = seeded_data(&["AAPL"]);
    let registry = Arc::new(AnalystRegistry::new().with_standalone(
        AnalystId::QuantitativeAnalyst,
        Arc::new(QuantitativeAnalyst::new(Arc::clone(&data) as Arc<dyn MarketData>)),
    ));

    let pipeline = Pipeline::new(registry, data).unwrap();
    let report = pipeline
        .run(&request(&["AAPL"], Some(vec!["quantitative_analyst"])))
        .await;

    assert!(report.error.is_none());
    assert_eq!(report.analyst_signals.len(), 1);
    assert!(report.analyst_signals.contains_key("quantitative_analyst"));

    let decisions = report.decisions.unwrap();
    assert!(decisions.contains_key(&Ticker::from("AAPL")));
}

#[tokio::test]
async fn test_empty_selection_runs_everything_registered() {
    let data = seeded_data(&["AAPL", "MSFT"]);
    let registry = Arc::new(
        AnalystRegistry::new()
            .with_graph(
                AnalystId::TechnicalAnalyst,
                Arc::new(TechnicalAnalyst::new(Arc::clone(&data) as Arc<dyn MarketData>)),
            )
            .with_standalone(
                AnalystId::QuantitativeAnalyst,
                Arc::new(QuantitativeAnalyst::new(Arc::clone(&data) as Arc<dyn MarketData>)),
            ),
    );

    let pipeline = Pipeline::new(registry, data).unwrap();
    let report = pipeline.run(&request(&["AAPL", "MSFT"], None)).await;

    assert!(report.error.is_none());
    assert!(report.analyst_signals.contains_key("technical_analyst"));
    assert!(report.analyst_signals.contains_key("quantitative_analyst"));

    // Decision key set equals the requested ticker set exactly
    let decisions = report.decisions.unwrap();
    let keys: Vec<&Ticker> = decisions.keys().collect();
    assert_eq!(keys, vec![&Ticker::from("AAPL"), &Ticker::from("MSFT")]);
}

#[tokio::test]
async fn test_no_producers_selected_yields_all_holds() {
    let data = seeded_data(&["KO"]);
    let registry = Arc::new(AnalystRegistry::new().with_graph(
        AnalystId::TechnicalAnalyst,
        Arc::new(TechnicalAnalyst::new(Arc::clone(&data) as Arc<dyn MarketData>)),
    ));

    let pipeline = Pipeline::new(registry, data).unwrap();
    // Selection resolves to nothing but the run still goes through risk and
    // portfolio stages
    let report = pipeline
        .run(&request(&["KO"], Some(vec!["astrologer"])))
        .await;

    assert!(report.error.is_none());
    assert!(report.analyst_signals.is_empty());

    let decisions = report.decisions.unwrap();
    let decision = decisions.get(&Ticker::from("KO")).unwrap();
    assert_eq!(decision.action, Action::Hold);
    assert_eq!(decision.quantity, 0);
    assert_eq!(decision.confidence, Decimal::ZERO);
}

#[tokio::test]
async fn test_per_ticker_failure_does_not_block_other_decisions() {
    let data = seeded_data(&["AAPL", "MSFT"]);
    let registry = Arc::new(
        AnalystRegistry::new()
            .with_graph(
                AnalystId::TechnicalAnalyst,
                Arc::new(OpinionatedAnalyst {
                    direction: SignalDirection::Bullish,
                    fail_for: None,
                }),
            )
            .with_graph(
                AnalystId::WarrenBuffett,
                Arc::new(OpinionatedAnalyst {
                    direction: SignalDirection::Bullish,
                    fail_for: Some(Ticker::from("MSFT")),
                }),
            ),
    );

    let pipeline = Pipeline::new(registry, data).unwrap();
    let report = pipeline.run(&request(&["AAPL", "MSFT"], None)).await;

    let decisions = report.decisions.unwrap();
    assert!(decisions.contains_key(&Ticker::from("MSFT")));

    // The error sits only under the failing analyst's key
    let buffett = &report.analyst_signals["warren_buffett"];
    assert!(buffett[&Ticker::from("MSFT")].record().is_error());
    assert!(!buffett[&Ticker::from("AAPL")].record().is_error());
    let technical = &report.analyst_signals["technical_analyst"];
    assert!(!technical[&Ticker::from("MSFT")].record().is_error());
}

#[tokio::test]
async fn test_whole_node_failure_leaves_key_absent() {
    let data = seeded_data(&["AAPL"]);
    let registry = Arc::new(
        AnalystRegistry::new()
            .with_graph(
                AnalystId::TechnicalAnalyst,
                Arc::new(OpinionatedAnalyst {
                    direction: SignalDirection::Bullish,
                    fail_for: None,
                }),
            )
            .with_graph(AnalystId::BenGraham, Arc::new(DeadAnalyst)),
    );

    let pipeline = Pipeline::new(registry, data).unwrap();
    let report = pipeline.run(&request(&["AAPL"], None)).await;

    assert!(report.error.is_none());
    assert!(report.analyst_signals.contains_key("technical_analyst"));
    assert!(!report.analyst_signals.contains_key("ben_graham"));
    assert!(report.decisions.is_some());
}

#[tokio::test]
async fn test_agent_suffix_keys_accepted() {
    let data = seeded_data(&["AAPL"]);
    let registry = Arc::new(AnalystRegistry::new().with_graph(
        AnalystId::TechnicalAnalyst,
        Arc::new(TechnicalAnalyst::new(Arc::clone(&data) as Arc<dyn MarketData>)),
    ));

    let pipeline = Pipeline::new(registry, data).unwrap();
    let report = pipeline
        .run(&request(&["AAPL"], Some(vec!["technical_analyst_agent"])))
        .await;

    assert!(report.analyst_signals.contains_key("technical_analyst"));
}

#[tokio::test]
async fn test_decision_payload_round_trips() {
    let data = seeded_data(&["AAPL"]);
    let registry = Arc::new(AnalystRegistry::new().with_graph(
        AnalystId::TechnicalAnalyst,
        Arc::new(OpinionatedAnalyst {
            direction: SignalDirection::Bullish,
            fail_for: None,
        }),
    ));

    let pipeline = Pipeline::new(registry, data).unwrap();
    let report = pipeline.run(&request(&["AAPL"], None)).await;

    let decisions = report.decisions.unwrap();
    let payload = serde_json::to_string(&decisions).unwrap();
    assert_eq!(parse_decisions(&payload).unwrap(), decisions);
}

#[tokio::test]
async fn test_persona_runs_through_scripted_client() {
    use quorum_analysts::{Persona, PersonaAnalyst};
    use quorum_llm::{ModelCatalog, ScriptedClient};

    let data = seeded_data(&["AAPL"]);
    let client = Arc::new(ScriptedClient::new().with_response(
        "AAPL",
        r#"{"signal": "bullish", "confidence": 90, "reasoning": "wide moat"}"#,
    ));
    let registry = Arc::new(AnalystRegistry::new().with_graph(
        AnalystId::WarrenBuffett,
        Arc::new(PersonaAnalyst::new(
            Persona::WarrenBuffett,
            Arc::new(ModelCatalog::standard()),
            client,
            Arc::clone(&data) as Arc<dyn MarketData>,
        )),
    ));

    let pipeline = Pipeline::new(registry, data).unwrap();
    let report = pipeline.run(&request(&["AAPL"], None)).await;

    let record = report.analyst_signals["warren_buffett"][&Ticker::from("AAPL")].record();
    assert_eq!(record.direction, SignalDirection::Bullish);

    let decision = report.decisions.unwrap().remove(&Ticker::from("AAPL")).unwrap();
    assert_eq!(decision.action, Action::Buy);
    assert!(decision.quantity > 0);
}

#[tokio::test]
async fn test_empty_registry_rejected_at_build() {
    let data = seeded_data(&[]);
    let registry = Arc::new(AnalystRegistry::new());
    assert!(Pipeline::new(registry, data).is_err());
}
