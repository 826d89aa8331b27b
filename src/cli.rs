//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::fixed_sentiment::FixedSentiment;
use crate::adapters::sim_broker::SimulatedBroker;
use crate::domain::backtest::{run_replay, BacktestConfig, ReplayReport};
use crate::domain::error::SignalbotError;
use crate::domain::params::StrategyKind;
use crate::domain::registry::strategy_from_config;
use crate::domain::strategy::{Decision, TickReport};
use crate::ports::sentiment_port::SentimentPort;

#[derive(Parser, Debug)]
#[command(name = "signalbot", about = "Indicator-driven trading signal engine")]
pub struct Cli {
    /// Log filter, e.g. `info`, `debug` or `signalbot=trace`
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay a CSV price series through a strategy and the simulated broker
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: PathBuf,
        /// Override `[strategy] symbol`
        #[arg(long)]
        symbol: Option<String>,
        /// Override `[strategy] name`
        #[arg(short, long)]
        strategy: Option<String>,
    },
    /// Validate a strategy configuration and print the resolved parameters
    Validate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        strategy: Option<String>,
    },
    /// List the known strategy identifiers
    Strategies,
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            data,
            symbol,
            strategy,
        } => run_backtest(&config, &data, symbol.as_deref(), strategy.as_deref()),
        Command::Validate { config, strategy } => run_validate(&config, strategy.as_deref()),
        Command::Strategies => {
            run_strategies();
            Ok(())
        }
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, SignalbotError> {
    FileConfigAdapter::from_file(path).map_err(|e| SignalbotError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn load_with_overrides(
    path: &PathBuf,
    symbol: Option<&str>,
    strategy: Option<&str>,
) -> Result<FileConfigAdapter, SignalbotError> {
    eprintln!("Loading config from {}", path.display());
    let mut adapter = load_config(path)?;
    if let Some(symbol) = symbol {
        adapter.set("strategy", "symbol", symbol);
    }
    if let Some(name) = strategy {
        adapter.set("strategy", "name", name);
    }
    Ok(adapter)
}

fn run_backtest(
    config_path: &PathBuf,
    data_path: &PathBuf,
    symbol: Option<&str>,
    strategy_name: Option<&str>,
) -> Result<(), SignalbotError> {
    let adapter = load_with_overrides(config_path, symbol, strategy_name)?;
    let strategy = strategy_from_config(&adapter)?;
    let bt_config = BacktestConfig::from_config(&adapter)?;
    let sentiment = FixedSentiment::from_config(&adapter)?;
    eprintln!(
        "Loading strategy: {} on {}",
        strategy.kind(),
        strategy.symbol()
    );

    eprintln!("Loading prices from {}", data_path.display());
    let prices = CsvAdapter::new(data_path.clone()).load(strategy.symbol())?;
    let mut broker = SimulatedBroker::new(prices, bt_config.initial_cash, bt_config.execution)?;

    let report = run_replay(
        &strategy,
        &mut broker,
        sentiment.as_ref().map(|s| s as &dyn SentimentPort),
    )?;
    print_report(strategy.kind(), strategy.symbol(), &report);
    Ok(())
}

fn run_validate(config_path: &PathBuf, strategy_name: Option<&str>) -> Result<(), SignalbotError> {
    let adapter = load_with_overrides(config_path, None, strategy_name)?;
    let strategy = strategy_from_config(&adapter)?;
    println!("Strategy: {}", strategy.kind());
    println!("Indicator: {}", strategy.indicator().indicator_type());
    println!("Lookback: {} bars", strategy.lookback());
    print!("{}", strategy.params());
    eprintln!("Strategy is valid.");
    Ok(())
}

fn run_strategies() {
    for kind in StrategyKind::ALL {
        println!("{kind}");
    }
}

fn print_report(kind: StrategyKind, symbol: &str, report: &ReplayReport) {
    for tick in &report.ticks {
        if let Some(line) = describe_tick(tick) {
            println!("{line}");
        }
    }
    println!();
    println!("Strategy:       {kind} on {symbol}");
    println!("Ticks:          {}", report.ticks.len());
    println!("Orders:         {}", report.orders());
    println!("Rejected:       {}", report.rejections());
    println!("Liquidations:   {}", report.liquidations());
    println!("Closed trades:  {}", report.closed_trades.len());
    println!("Final cash:     {:.2}", report.final_cash);
    println!("Final equity:   {:.2}", report.final_equity);
    println!("Profit:         {:.2}", report.profit());
}

/// One log line for ticks that acted.
pub fn describe_tick(tick: &TickReport) -> Option<String> {
    let when = tick
        .timestamp
        .map(|t| t.to_string())
        .unwrap_or_else(|| "-".to_string());
    match &tick.decision {
        Decision::Submit { intent, exit_first } => {
            let mut line = format!(
                "{when} {} {} {} x{} @ {:.2}",
                tick.signal, intent.order_kind, intent.side, intent.quantity, intent.reference_price
            );
            if let (Some(tp), Some(sl)) = (intent.take_profit_price, intent.stop_loss_price) {
                line.push_str(&format!(" tp {tp:.2} sl {sl:.2}"));
            }
            if *exit_first {
                line.push_str(" (after exit)");
            }
            if let Some(reason) = &tick.rejection {
                line.push_str(&format!(" rejected: {reason}"));
            }
            Some(line)
        }
        Decision::Liquidate { symbol } => {
            Some(format!("{when} {} liquidate {symbol}", tick.signal))
        }
        Decision::NoAction(_) => None,
    }
}
