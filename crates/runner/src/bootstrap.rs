//! Bootstrap
//!
//! Wires the concrete pieces together: a deterministic offline market-data
//! provider, the model catalog, the scripted LLM client and a registry with
//! every analyst registered. Real data and network clients are out of scope;
//! the seeded provider generates a reproducible price history per ticker so
//! every run over the same inputs prints the same report.

use chrono::Days;
use log::info;
use quorum_analysts::{
    Bar, Fundamentals, FundamentalsAnalyst, MarketData, Persona, PersonaAnalyst,
    QuantitativeAnalyst, SentimentAnalyst, SentimentEvent, StaticMarketData, TechnicalAnalyst,
    ValuationAnalyst,
};
use quorum_core::{DateWindow, Ticker};
use quorum_engine::{AnalystId, AnalystRegistry};
use quorum_llm::{LlmClient, ModelCatalog, ScriptedClient};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

/// Bars of history seeded ahead of the window start.
const HISTORY_DAYS: u64 = 250;

/// Cheap deterministic hash of a ticker symbol, used to vary the synthetic
/// series per ticker.
fn seed_of(ticker: &Ticker) -> i64 {
    ticker
        .as_str()
        .bytes()
        .fold(7i64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as i64))
        .abs()
}

/// Deterministic daily closes in cents: a base level per ticker, a mild
/// drift and a short wave so indicators have something to chew on.
fn close_cents(seed: i64, index: i64) -> i64 {
    let base = 5_000 + (seed % 180) * 100;
    let drift = (seed % 7 - 3) * 4 * index;
    let wave = ((index * (3 + seed % 5)) % 41 - 20) * 25;
    (base + drift + wave).max(100)
}

/// Seed an offline provider for the requested tickers.
pub fn market_data(tickers: &[Ticker], window: &DateWindow) -> Arc<StaticMarketData> {
    let data = StaticMarketData::new();
    let first = window
        .end
        .checked_sub_days(Days::new(HISTORY_DAYS))
        .unwrap_or(window.start);

    for ticker in tickers {
        let seed = seed_of(ticker);

        let mut bars = Vec::new();
        let mut date = first;
        let mut index = 0i64;
        while date <= window.end {
            let close = Decimal::new(close_cents(seed, index), 2);
            let spread = Decimal::new(close_cents(seed, index) / 50, 2);
            bars.push(Bar {
                date,
                open: close - spread / dec!(2),
                high: close + spread,
                low: close - spread,
                close,
                volume: 10_000 + (seed % 9) as u64 * 1_000,
            });
            date = match date.succ_opt() {
                Some(next) => next,
                None => break,
            };
            index += 1;
        }
        data.insert_bars(ticker.clone(), bars);

        data.insert_fundamentals(
            ticker.clone(),
            Fundamentals {
                revenue_growth: Decimal::new(seed % 25 - 5, 2),
                earnings_growth: Decimal::new(seed % 20 - 4, 2),
                net_margin: Decimal::new(seed % 30, 2),
                operating_margin: Decimal::new(seed % 35, 2),
                return_on_equity: Decimal::new(seed % 28, 2),
                debt_to_equity: Decimal::new(seed % 220, 2),
                pe_ratio: Decimal::from(8 + seed % 32),
                pb_ratio: Decimal::new(100 + seed % 700, 2),
                earnings_per_share: Decimal::new(100 + seed % 1_500, 2),
                free_cash_flow_per_share: Decimal::new(50 + seed % 1_200, 2),
                book_value_per_share: Decimal::new(500 + seed % 9_000, 2),
                shares_outstanding: 1_000_000 + (seed % 50) as u64 * 100_000,
            },
        );

        let mut events = Vec::new();
        let mut date = window.start;
        let mut index = 0i64;
        while date <= window.end {
            if (seed + index) % 5 == 0 {
                events.push(SentimentEvent {
                    date,
                    score: Decimal::new((seed + index * 13) % 19 - 9, 1),
                    headline: format!("{} coverage item {}", ticker, index),
                });
            }
            date = match date.succ_opt() {
                Some(next) => next,
                None => break,
            };
            index += 1;
        }
        data.insert_sentiment(ticker.clone(), events);
    }

    info!("[bootstrap] seeded offline data for {} tickers", tickers.len());
    Arc::new(data)
}

/// The scripted client used in place of network transports. Personas get a
/// mildly cautious canned reply so end-to-end runs exercise the whole path.
pub fn llm_client() -> Arc<dyn LlmClient> {
    Arc::new(ScriptedClient::new().with_fallback(
        r#"{"signal": "neutral", "confidence": 25, "reasoning": "No strong edge either way on the presented facts."}"#,
    ))
}

pub fn model_catalog() -> Arc<ModelCatalog> {
    Arc::new(ModelCatalog::standard())
}

/// Register every analyst the simulator ships with.
pub fn registry(
    data: Arc<dyn MarketData>,
    catalog: Arc<ModelCatalog>,
    client: Arc<dyn LlmClient>,
) -> Arc<AnalystRegistry> {
    let persona = |p: Persona| {
        Arc::new(PersonaAnalyst::new(
            p,
            Arc::clone(&catalog),
            Arc::clone(&client),
            Arc::clone(&data),
        ))
    };

    Arc::new(
        AnalystRegistry::new()
            .with_graph(
                AnalystId::TechnicalAnalyst,
                Arc::new(TechnicalAnalyst::new(Arc::clone(&data))),
            )
            .with_graph(
                AnalystId::FundamentalsAnalyst,
                Arc::new(FundamentalsAnalyst::new(Arc::clone(&data))),
            )
            .with_graph(
                AnalystId::SentimentAnalyst,
                Arc::new(SentimentAnalyst::new(Arc::clone(&data))),
            )
            .with_graph(
                AnalystId::ValuationAnalyst,
                Arc::new(ValuationAnalyst::new(Arc::clone(&data))),
            )
            .with_graph(AnalystId::BenGraham, persona(Persona::BenGraham))
            .with_graph(AnalystId::BillAckman, persona(Persona::BillAckman))
            .with_graph(AnalystId::WarrenBuffett, persona(Persona::WarrenBuffett))
            .with_standalone(
                AnalystId::QuantitativeAnalyst,
                Arc::new(QuantitativeAnalyst::new(Arc::clone(&data))),
            ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_seeded_data_is_deterministic() {
        let window = DateWindow::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        );
        let tickers = vec![Ticker::from("AAPL")];
        let a = market_data(&tickers, &window);
        let b = market_data(&tickers, &window);

        let bars_a = a.bars(&tickers[0], &window).unwrap();
        let bars_b = b.bars(&tickers[0], &window).unwrap();
        assert_eq!(bars_a, bars_b);
        assert!(bars_a.len() > 200);
    }

    #[test]
    fn test_registry_has_every_analyst() {
        let window = DateWindow::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        );
        let data = market_data(&[Ticker::from("AAPL")], &window);
        let registry = registry(data, model_catalog(), llm_client());
        assert_eq!(registry.registered_ids().len(), AnalystId::ALL.len());
    }
}
