//! Bar-by-bar replay of one strategy against a simulated broker.
//!
//! BacktestConfig holds the `[backtest]` settings of the replay account.

use tracing::info;

use crate::domain::error::SignalbotError;
use crate::domain::execution::ExecutionConfig;
use crate::domain::position::ClosedTrade;
use crate::domain::strategy::{evaluate_tick, Decision, Strategy, StrategyMemory, TickReport};
use crate::ports::broker_port::ReplayBroker;
use crate::ports::config_port::ConfigPort;
use crate::ports::sentiment_port::SentimentPort;

const SECTION: &str = "backtest";

pub const DEFAULT_INITIAL_CASH: f64 = 100_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_cash: f64,
    pub execution: ExecutionConfig,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_cash: DEFAULT_INITIAL_CASH,
            execution: ExecutionConfig::default(),
        }
    }
}

impl BacktestConfig {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, SignalbotError> {
        let initial_cash = config.get_double(SECTION, "initial_cash", DEFAULT_INITIAL_CASH);
        if !initial_cash.is_finite() || initial_cash <= 0.0 {
            return Err(invalid("initial_cash", "initial_cash must be positive"));
        }
        let commission_pct = read_pct(config, "commission_pct")?;
        let slippage_pct = read_pct(config, "slippage_pct")?;
        Ok(BacktestConfig {
            initial_cash,
            execution: ExecutionConfig {
                commission_pct,
                slippage_pct,
            },
        })
    }
}

fn read_pct(config: &dyn ConfigPort, key: &str) -> Result<f64, SignalbotError> {
    let value = config.get_double(SECTION, key, 0.0);
    if !value.is_finite() || !(0.0..100.0).contains(&value) {
        return Err(invalid(key, format!("{key} must be a percentage in [0, 100)")));
    }
    Ok(value)
}

fn invalid(key: &str, reason: impl Into<String>) -> SignalbotError {
    SignalbotError::ConfigInvalid {
        section: SECTION.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayReport {
    pub ticks: Vec<TickReport>,
    pub starting_equity: f64,
    pub final_cash: f64,
    pub final_equity: f64,
    pub closed_trades: Vec<ClosedTrade>,
}

impl ReplayReport {
    pub fn profit(&self) -> f64 {
        self.final_equity - self.starting_equity
    }

    /// Orders the broker accepted.
    pub fn orders(&self) -> usize {
        self.ticks.iter().filter(|t| t.ack.is_some()).count()
    }

    pub fn rejections(&self) -> usize {
        self.ticks.iter().filter(|t| t.rejection.is_some()).count()
    }

    pub fn liquidations(&self) -> usize {
        self.ticks
            .iter()
            .filter(|t| matches!(t.decision, Decision::Liquidate { .. }))
            .count()
    }
}

/// Replay every bar the broker holds through `strategy`.
///
/// Bars before the strategy's lookback is filled only warm the window; each
/// later bar is one tick. Memory is threaded from tick to tick.
pub fn run_replay<B: ReplayBroker>(
    strategy: &Strategy,
    broker: &mut B,
    sentiment: Option<&dyn SentimentPort>,
) -> Result<ReplayReport, SignalbotError> {
    let starting_equity = broker.equity();
    let mut memory = StrategyMemory::default();
    let mut ticks = Vec::new();

    let mut more = true;
    while more && broker.bars_seen() < strategy.lookback() {
        more = broker.advance()?;
    }

    while more {
        let report = evaluate_tick(strategy, memory, broker, sentiment)?;
        memory = report.memory;
        ticks.push(report);
        more = broker.advance()?;
    }

    let report = ReplayReport {
        ticks,
        starting_equity,
        final_cash: broker.get_cash()?,
        final_equity: broker.equity(),
        closed_trades: broker.closed_trades().to_vec(),
    };
    info!(
        "{} {}: {} ticks, {} orders, {} liquidations, profit {:.2}",
        strategy.kind(),
        strategy.symbol(),
        report.ticks.len(),
        report.orders(),
        report.liquidations(),
        report.profit()
    );
    Ok(report)
}
