//! quorum - multi-analyst fund simulator
//!
//! Single-shot mode runs the pipeline once over the window and prints the
//! decision table. Backtest mode replays it day by day and prints the equity
//! curve summary.

use chrono::{Months, NaiveDate, Utc};
use clap::Parser;
use quorum_analysts::MarketData;
use quorum_backtest::{BacktestConfig, BacktestDriver, BacktestReport};
use quorum_core::{AnalystSignals, DateWindow, DecisionSet, Portfolio, Ticker};
use quorum_engine::{Pipeline, PipelineRequest, RunError, RunReport};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

mod bootstrap;

#[derive(Parser, Debug)]
#[command(name = "quorum", version, about = "Multi-analyst fund simulator")]
struct Cli {
    /// Tickers to evaluate (comma separated)
    #[arg(long, value_delimiter = ',', required = true)]
    tickers: Vec<String>,

    /// Window start date (YYYY-MM-DD), default: end minus three months
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// Window end date (YYYY-MM-DD), default: today
    #[arg(long)]
    end_date: Option<NaiveDate>,

    /// Starting cash
    #[arg(long, default_value = "100000")]
    initial_cash: Decimal,

    /// Margin fraction required on short notional
    #[arg(long, default_value = "0.5")]
    margin_requirement: Decimal,

    /// Analyst keys to run (comma separated), default: all registered
    #[arg(long, value_delimiter = ',')]
    analysts: Option<Vec<String>>,

    /// Model name from the catalog
    #[arg(long, default_value = "scripted")]
    model: String,

    /// Print analyst reasoning alongside decisions
    #[arg(long)]
    show_reasoning: bool,

    /// Replay the window day by day instead of a single invocation
    #[arg(long)]
    backtest: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let end = cli.end_date.unwrap_or_else(|| Utc::now().date_naive());
    let start = cli
        .start_date
        .or_else(|| end.checked_sub_months(Months::new(3)))
        .unwrap_or(end);
    let window = DateWindow::new(start, end);
    let tickers: Vec<Ticker> = cli.tickers.iter().map(Ticker::new).collect();

    let data: Arc<dyn MarketData> = bootstrap::market_data(&tickers, &window);
    let catalog = bootstrap::model_catalog();
    let model = catalog
        .find(&cli.model)
        .or_else(|| catalog.default_model())
        .cloned()
        .ok_or("model catalog is empty")?;

    let registry = bootstrap::registry(
        Arc::clone(&data),
        Arc::clone(&catalog),
        bootstrap::llm_client(),
    );
    let pipeline = Pipeline::new(registry, Arc::clone(&data))?;

    println!(
        "quorum | {} | window {} | model {}",
        tickers
            .iter()
            .map(Ticker::to_string)
            .collect::<Vec<_>>()
            .join(", "),
        window,
        model.display_name
    );

    if cli.backtest {
        let config = BacktestConfig::new(tickers, window)
            .with_initial_cash(cli.initial_cash)
            .with_margin_requirement(cli.margin_requirement);
        let config = match cli.analysts {
            Some(keys) => config.with_analysts(keys),
            None => config,
        };
        let driver = BacktestDriver::new(pipeline, Arc::clone(&data), config);
        print_backtest(&driver.run().await, cli.initial_cash);
    } else {
        let mut portfolio = Portfolio::with_cash(cli.initial_cash);
        portfolio.margin_requirement = cli.margin_requirement;
        let report = pipeline
            .run(&PipelineRequest {
                tickers,
                window,
                portfolio,
                selected_analysts: cli.analysts,
                show_reasoning: cli.show_reasoning,
                model_name: model.model_name.clone(),
                model_provider: model.provider.to_string(),
            })
            .await;
        print_report(&report, cli.show_reasoning);
    }

    Ok(())
}

fn print_report(report: &RunReport, show_reasoning: bool) {
    print_signals(&report.analyst_signals);
    if let Some(error) = &report.error {
        print_error(error);
    }
    match &report.decisions {
        Some(decisions) => print_decisions(decisions, show_reasoning),
        None => println!("\nNo decisions produced."),
    }
}

fn print_signals(signals: &AnalystSignals) {
    if signals.is_empty() {
        println!("\nNo analyst signals.");
        return;
    }
    println!("\nAnalyst signals");
    for (analyst, tickers) in signals {
        for (ticker, payload) in tickers {
            let record = payload.record();
            match &record.error {
                Some(error) => {
                    println!("  {analyst:<22} {:<6} ERROR: {error}", ticker.as_str())
                }
                None => {
                    let confidence = record
                        .confidence
                        .map(|c| format!("{c}%"))
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "  {analyst:<22} {:<6} {:<8} {confidence}",
                        ticker.as_str(),
                        format!("{:?}", record.direction).to_lowercase()
                    );
                }
            }
        }
    }
}

fn print_decisions(decisions: &DecisionSet, show_reasoning: bool) {
    println!("\nDecisions");
    for (ticker, decision) in decisions {
        println!(
            "  {:<6} {:<6} qty {:<6} confidence {}%",
            ticker.as_str(),
            format!("{:?}", decision.action).to_lowercase(),
            decision.quantity,
            decision.confidence
        );
        if show_reasoning && !decision.reasoning.is_empty() {
            println!("         {}", decision.reasoning);
        }
    }
}

fn print_error(error: &RunError) {
    println!("\nRun error: {} ({})", error.error, error.details);
    if let Some(response) = &error.response {
        println!("  raw response: {response}");
    }
}

fn print_backtest(report: &BacktestReport, initial_cash: Decimal) {
    println!("\nBacktest: {} trading days", report.days_run);
    if !report.errors.is_empty() {
        println!("  {} failed day(s)", report.errors.len());
        for day in &report.errors {
            println!("    {} {} ({})", day.date, day.error.error, day.error.details);
        }
    }
    for point in &report.equity_curve {
        println!(
            "  {}  equity {:>12}  cash {:>12}",
            point.date, point.equity, point.cash
        );
    }
    if !report.final_portfolio.positions.is_empty() {
        println!("\nFinal positions");
        for (ticker, position) in &report.final_portfolio.positions {
            if !position.is_flat() {
                println!(
                    "  {:<6} long {} @ {}  short {} @ {}",
                    ticker.as_str(),
                    position.long,
                    position.long_cost_basis.round_dp(2),
                    position.short,
                    position.short_cost_basis.round_dp(2)
                );
            }
        }
    }
    if let Some(last) = report.equity_curve.last() {
        let pnl = last.equity - initial_cash;
        let pct = if initial_cash > Decimal::ZERO {
            (pnl / initial_cash * dec!(100)).round_dp(2)
        } else {
            Decimal::ZERO
        };
        println!("\nFinal equity {} (return {}%)", last.equity, pct);
    }
}
