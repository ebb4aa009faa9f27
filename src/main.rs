use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use stockcast::application::analyzer::{AnalysisReport, AnalysisRequest, StockAnalyzer};
use stockcast::config::{Config, ModelKind};
use stockcast::domain::ports::PriceHistorySource;
use stockcast::infrastructure::{CsvPriceSource, LogAlertNotifier};
use tracing::{Level, error, info};
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about = "Predict short-term price direction from daily history", long_about = None)]
struct Cli {
    /// Directory holding <TICKER>.csv files (overrides PRICE_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Analysis date, YYYY-MM-DD (defaults to today)
    #[arg(long, global = true)]
    as_of: Option<NaiveDate>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze one ticker and print the verdict
    Analyze {
        ticker: String,

        /// Sell target; reports whether the latest price reached it
        #[arg(long)]
        target: Option<f64>,

        /// Minimum probability of increase required for BUY
        #[arg(long)]
        threshold: Option<f64>,

        /// Calendar days of history
        #[arg(long)]
        lookback: Option<u32>,

        /// Label horizon in trading days
        #[arg(long)]
        horizon: Option<usize>,

        /// logistic | smartcore
        #[arg(long)]
        model: Option<ModelKind>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check every ALERT_TARGETS ticker once: target alerts plus verdicts
    CheckAll,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so `--json` output stays clean on stdout
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stderr_layer)
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(dir) = cli.data_dir {
        config.analysis.price_data_dir = dir;
    }
    let as_of = cli
        .as_of
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    info!(
        "stockcast {} (data: {})",
        env!("CARGO_PKG_VERSION"),
        config.analysis.price_data_dir.display()
    );
    let source: Arc<dyn PriceHistorySource> =
        Arc::new(CsvPriceSource::new(config.analysis.price_data_dir.clone()));

    match cli.command {
        Command::Analyze {
            ticker,
            target,
            threshold,
            lookback,
            horizon,
            model,
            json,
        } => {
            let analysis = &mut config.analysis;
            if let Some(t) = threshold {
                analysis.min_probability_to_buy = t;
            }
            if let Some(l) = lookback {
                analysis.lookback_days = l;
            }
            if let Some(h) = horizon {
                analysis.future_days = h;
            }
            if let Some(m) = model {
                analysis.model = m;
            }
            analysis.validate()?;

            let analyzer = StockAnalyzer::new(source, analysis.model.build())
                .with_notifier(Arc::new(LogAlertNotifier));
            let request =
                AnalysisRequest::new(&ticker, analysis.lookback_days, analysis.future_days, as_of)?;
            let settings = analysis.settings(target)?;

            let report = analyzer
                .analyze(&request, &settings)
                .with_context(|| format!("Analysis of {} failed", request.ticker))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
        Command::CheckAll => check_all(&config, source, as_of)?,
    }

    Ok(())
}

/// One pass over the configured alert targets. Per-ticker failures are
/// logged and the pass continues.
fn check_all(config: &Config, source: Arc<dyn PriceHistorySource>, as_of: NaiveDate) -> Result<()> {
    let analysis = &config.analysis;
    let analyzer = StockAnalyzer::new(source, analysis.model.build())
        .with_notifier(Arc::new(LogAlertNotifier));

    let requests = config
        .alerts
        .targets
        .iter()
        .map(|t| {
            AnalysisRequest::new(&t.ticker, analysis.lookback_days, analysis.future_days, as_of)
                .map(|req| (req, t.target_price))
        })
        .collect::<Result<Vec<_>, _>>()?;
    info!("Checking {} tickers as of {}", requests.len(), as_of);

    for outcome in analyzer.check_targets(&requests) {
        if let Ok(check) = outcome.result {
            println!(
                "{:<6} current ${:.2} target ${:.2} {}",
                outcome.ticker,
                check.current_price,
                check.target_price,
                if check.reached { "REACHED" } else { "-" }
            );
        }
    }

    let settings = analysis.settings(None)?;
    let jobs: Vec<_> = requests
        .into_iter()
        .map(|(req, _)| (req, settings.clone()))
        .collect();
    let mut failures = 0;
    for outcome in analyzer.analyze_batch(&jobs) {
        match outcome.result {
            Ok(report) => println!(
                "{:<6} P(up) {:>6.2}%  accuracy {:>6.2}%  {}",
                report.ticker,
                report.probability_up * 100.0,
                report.holdout_accuracy * 100.0,
                report.verdict
            ),
            Err(_) => failures += 1,
        }
    }
    if failures > 0 {
        error!("{} of {} analyses failed", failures, jobs.len());
    }
    Ok(())
}

fn print_report(report: &AnalysisReport) {
    println!("Stock: {} (as of {})", report.ticker, report.as_of);
    println!("Current Price: ${:.2}", report.current_price);
    println!(
        "Probability of Increase: {:.2}%",
        report.probability_up * 100.0
    );
    println!(
        "Recommendation: {} (threshold {:.0}%)",
        report.verdict,
        report.buy_threshold * 100.0
    );
    println!(
        "Backtested Accuracy: {:.2}% ({} train / {} test rows, {} model)",
        report.holdout_accuracy * 100.0,
        report.train_rows,
        report.test_rows,
        report.model.classifier
    );
    if let Some(check) = &report.target {
        println!(
            "Target ${:.2}: {}",
            check.target_price,
            if check.reached {
                "reached, consider selling"
            } else {
                "not reached"
            }
        );
    }
    if let Some(ind) = &report.indicators {
        println!(
            "Indicators: SMA20 {:.2} | SMA50 {:.2} | MACD {:.3} / {:.3} | BB [{:.2}, {:.2}] | RSI {:.1}",
            ind.sma_20, ind.sma_50, ind.macd, ind.macd_signal, ind.bb_lower, ind.bb_upper, ind.rsi_14
        );
    }

    println!();
    println!(
        "{:<10} {:>10} {:>9} {:>9} {:>9} {:>10} {:>10} {:>8} {:>8}  label",
        "date", "close", "return", "vol", "momentum", "sma20", "sma50", "macd", "signal"
    );
    for row in &report.feature_table_tail {
        let label = match row.label {
            Some(true) => "up",
            Some(false) => "down",
            None => "?",
        };
        println!(
            "{:<10} {:>10.2} {:>9.4} {:>9.4} {:>9.2} {:>10.2} {:>10.2} {:>8.3} {:>8.3}  {}",
            row.date,
            row.adjusted_close,
            row.daily_return,
            row.volatility,
            row.momentum,
            row.sma_short,
            row.sma_long,
            row.macd,
            row.macd_signal,
            label
        );
    }
}
