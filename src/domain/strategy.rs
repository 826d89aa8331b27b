//! Generic per-tick strategy evaluation.
//!
//! A [`Strategy`] owns its parameters and one indicator bound at construction.
//! [`Strategy::evaluate`] is pure: it maps (window, account, sentiment, memory) to
//! a signal, a decision and the next memory. [`evaluate_tick`] gathers those
//! inputs from the ports and applies the decision through the broker.

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::domain::error::{SignalbotError, SizingIssue};
use crate::domain::indicator::{Indicator, IndicatorInput, IndicatorSeries};
use crate::domain::order::{AccountSnapshot, OrderAck, OrderIntent, OrderKind, Side};
use crate::domain::params::{StrategyKind, StrategyParameters};
use crate::domain::signal::{SentimentReading, Signal};
use crate::domain::sizing::{bracket_prices, size_position};
use crate::ports::broker_port::BrokerPort;
use crate::ports::sentiment_port::SentimentPort;

/// Cross-tick state threaded by the caller.
///
/// Only strategies that trade both sides read or advance it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StrategyMemory {
    pub last_side: Option<Side>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NoActionReason {
    Hold,
    InsufficientHistory { have: usize, need: usize },
    /// SELL with nothing to liquidate.
    NoPosition,
    Sizing(SizingIssue),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    NoAction(NoActionReason),
    /// Submit `intent`; when `exit_first` the open position is closed beforehand.
    Submit { intent: OrderIntent, exit_first: bool },
    Liquidate { symbol: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub signal: Signal,
    pub decision: Decision,
    pub memory: StrategyMemory,
    pub series: IndicatorSeries,
}

/// What one tick did.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub timestamp: Option<NaiveDateTime>,
    pub signal: Signal,
    pub decision: Decision,
    pub memory: StrategyMemory,
    pub ack: Option<OrderAck>,
    /// Why the broker declined the submitted order, if it did.
    pub rejection: Option<String>,
}

#[derive(Debug)]
pub struct Strategy {
    kind: StrategyKind,
    params: StrategyParameters,
    indicator: Box<dyn Indicator>,
}

impl Strategy {
    /// Callers go through `registry::new_strategy`, which validates first.
    pub(crate) fn new(
        kind: StrategyKind,
        params: StrategyParameters,
        indicator: Box<dyn Indicator>,
    ) -> Self {
        Self {
            kind,
            params,
            indicator,
        }
    }

    pub fn kind(&self) -> StrategyKind {
        self.kind
    }

    pub fn params(&self) -> &StrategyParameters {
        &self.params
    }

    pub fn indicator(&self) -> &dyn Indicator {
        self.indicator.as_ref()
    }

    pub fn symbol(&self) -> &str {
        &self.params.symbol
    }

    /// Bars to request each tick.
    pub fn lookback(&self) -> usize {
        self.params.window.max(self.indicator.min_lookback())
    }

    pub fn evaluate(
        &self,
        input: &IndicatorInput<'_>,
        account: &AccountSnapshot,
        memory: StrategyMemory,
    ) -> Evaluation {
        let series = self.indicator.compute(input);
        let need = self.indicator.min_lookback();
        let have = input.window.len();

        let last_price = match input.window.last_close() {
            Some(price) if have >= need => price,
            _ => {
                return Evaluation {
                    signal: Signal::Hold,
                    decision: Decision::NoAction(NoActionReason::InsufficientHistory {
                        have,
                        need,
                    }),
                    memory,
                    series,
                };
            }
        };

        let signal = series.signal();
        let (decision, memory) = match signal {
            Signal::Hold => (Decision::NoAction(NoActionReason::Hold), memory),
            Signal::Buy => self.open(Side::Buy, last_price, account, memory),
            Signal::Sell if self.kind.trades_both_sides() => {
                self.open(Side::Sell, last_price, account, memory)
            }
            Signal::Sell if account.holds_long() => (
                Decision::Liquidate {
                    symbol: self.params.symbol.clone(),
                },
                memory,
            ),
            Signal::Sell => (Decision::NoAction(NoActionReason::NoPosition), memory),
        };

        Evaluation {
            signal,
            decision,
            memory,
            series,
        }
    }

    fn open(
        &self,
        side: Side,
        last_price: f64,
        account: &AccountSnapshot,
        memory: StrategyMemory,
    ) -> (Decision, StrategyMemory) {
        match self.build_intent(side, last_price, account.cash) {
            Ok(intent) => {
                let both_sides = self.kind.trades_both_sides();
                let exit_first = both_sides && memory.last_side == Some(side.opposite());
                let next = if both_sides {
                    StrategyMemory {
                        last_side: Some(side),
                    }
                } else {
                    memory
                };
                (Decision::Submit { intent, exit_first }, next)
            }
            Err(issue) => (Decision::NoAction(NoActionReason::Sizing(issue)), memory),
        }
    }

    fn build_intent(
        &self,
        side: Side,
        last_price: f64,
        cash: f64,
    ) -> Result<OrderIntent, SizingIssue> {
        let quantity = size_position(cash, last_price, self.params.cash_at_risk)?;
        let (take_profit_price, stop_loss_price) = match self.params.order_kind {
            OrderKind::Bracket => {
                let bracket = bracket_prices(last_price, self.params.risk_tolerance, side)?;
                (Some(bracket.take_profit), Some(bracket.stop_loss))
            }
            OrderKind::Market => (None, None),
        };
        Ok(OrderIntent {
            symbol: self.params.symbol.clone(),
            side,
            quantity,
            order_kind: self.params.order_kind,
            reference_price: last_price,
            take_profit_price,
            stop_loss_price,
        })
    }
}

/// Run one tick: fetch, evaluate, act.
///
/// Collaborator failures propagate; sizing problems, HOLDs and orders the
/// broker declines do not. A declined order leaves the memory unchanged.
pub fn evaluate_tick(
    strategy: &Strategy,
    memory: StrategyMemory,
    broker: &mut dyn BrokerPort,
    sentiment: Option<&dyn SentimentPort>,
) -> Result<TickReport, SignalbotError> {
    let symbol = strategy.symbol();
    let window = broker.get_historical_prices(
        symbol,
        strategy.lookback(),
        strategy.params().granularity,
    )?;
    let timestamp = window.last().map(|bar| bar.timestamp);
    let account = AccountSnapshot {
        cash: broker.get_cash()?,
        position: broker.get_position(symbol)?,
    };

    let reading = read_sentiment(strategy, sentiment, timestamp)?;
    let evaluation = strategy.evaluate(
        &IndicatorInput {
            window: &window,
            sentiment: reading,
        },
        &account,
        memory,
    );
    debug!(
        "{} {}: {} signal over {} bars",
        strategy.kind(),
        symbol,
        evaluation.signal,
        window.len()
    );

    let mut ack = None;
    let mut rejection = None;
    match &evaluation.decision {
        Decision::Submit { intent, exit_first } => {
            if *exit_first {
                info!("{symbol}: closing open position before {} entry", intent.side);
                broker.liquidate_position(symbol)?;
            }
            match broker.submit_order(intent) {
                Ok(placed) => {
                    info!(
                        "{symbol}: submitted {} {} x{} @ {:.4} (order {})",
                        intent.order_kind,
                        intent.side,
                        intent.quantity,
                        placed.fill_price,
                        placed.order_id
                    );
                    ack = Some(placed);
                }
                Err(SignalbotError::OrderRejected { reason }) => {
                    warn!("{symbol}: {} x{} rejected: {reason}", intent.side, intent.quantity);
                    rejection = Some(reason);
                }
                Err(e) => return Err(e),
            }
        }
        Decision::Liquidate { symbol } => {
            broker.liquidate_position(symbol)?;
            info!("{symbol}: position liquidated on SELL signal");
        }
        Decision::NoAction(NoActionReason::Sizing(issue)) => {
            warn!("{symbol}: {} signal skipped: {issue}", evaluation.signal);
        }
        Decision::NoAction(NoActionReason::InsufficientHistory { have, need }) => {
            warn!("{symbol}: tick skipped, {have} of {need} bars available");
        }
        Decision::NoAction(reason) => {
            debug!("{symbol}: no action ({reason:?})");
        }
    }

    Ok(TickReport {
        timestamp,
        signal: evaluation.signal,
        decision: evaluation.decision,
        memory: if rejection.is_some() {
            memory
        } else {
            evaluation.memory
        },
        ack,
        rejection,
    })
}

fn read_sentiment(
    strategy: &Strategy,
    sentiment: Option<&dyn SentimentPort>,
    at: Option<NaiveDateTime>,
) -> Result<Option<SentimentReading>, SignalbotError> {
    if !strategy.indicator().needs_sentiment() {
        return Ok(None);
    }
    match (sentiment, at) {
        (Some(port), Some(at)) => Ok(Some(port.estimate(strategy.symbol(), at)?)),
        (None, _) => {
            warn!(
                "{}: {} needs a sentiment source, none configured",
                strategy.symbol(),
                strategy.kind()
            );
            Ok(None)
        }
        (Some(_), None) => Ok(None),
    }
}
