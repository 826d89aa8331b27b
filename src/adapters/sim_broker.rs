//! Simulated broker over a recorded bar series.
//!
//! The clock starts on the first bar and only moves through [`ReplayBroker::advance`].
//! Orders fill at the current close adjusted for slippage; bracket exits are
//! checked against each new bar's close as the clock moves.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::domain::error::SignalbotError;
use crate::domain::execution::{check_triggers, close_position, open_position, ExecutionConfig};
use crate::domain::ohlcv::{PriceBar, PriceWindow};
use crate::domain::order::{OrderAck, OrderIntent};
use crate::domain::params::Granularity;
use crate::domain::portfolio::Portfolio;
use crate::domain::position::{ClosedTrade, ExitReason, PositionRecord};
use crate::ports::broker_port::{BrokerPort, ReplayBroker};

#[derive(Debug)]
pub struct SimulatedBroker {
    symbol: String,
    bars: Vec<PriceBar>,
    cursor: usize,
    portfolio: Portfolio,
    config: ExecutionConfig,
    next_order_id: u64,
}

impl SimulatedBroker {
    /// All bars must belong to one symbol; at least one bar is required.
    pub fn new(
        prices: PriceWindow,
        initial_cash: f64,
        config: ExecutionConfig,
    ) -> Result<Self, SignalbotError> {
        let bars = prices.bars().to_vec();
        let symbol = bars
            .first()
            .map(|b| b.symbol.clone())
            .ok_or_else(|| SignalbotError::Data {
                reason: "no price bars to replay".to_string(),
            })?;
        if let Some(other) = bars.iter().find(|b| b.symbol != symbol) {
            return Err(SignalbotError::Data {
                reason: format!("mixed symbols in replay data: {} and {}", symbol, other.symbol),
            });
        }
        Ok(Self {
            symbol,
            bars,
            cursor: 0,
            portfolio: Portfolio::new(initial_cash),
            config,
            next_order_id: 1,
        })
    }

    /// Start with an existing position, as if opened before the replay.
    pub fn with_position(mut self, position: PositionRecord) -> Self {
        self.portfolio.add_position(position);
        self
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn current_bar(&self) -> &PriceBar {
        &self.bars[self.cursor]
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    fn check_symbol(&self, symbol: &str) -> Result<(), SignalbotError> {
        if symbol != self.symbol {
            return Err(SignalbotError::Broker {
                reason: format!("no market for {symbol}; replaying {}", self.symbol),
            });
        }
        Ok(())
    }
}

impl BrokerPort for SimulatedBroker {
    /// Recorded bars are served as-is whatever the requested granularity.
    fn get_historical_prices(
        &self,
        symbol: &str,
        lookback: usize,
        _granularity: Granularity,
    ) -> Result<PriceWindow, SignalbotError> {
        if symbol != self.symbol {
            return Err(SignalbotError::Data {
                reason: format!("no prices for {symbol}"),
            });
        }
        let end = self.cursor + 1;
        let start = end.saturating_sub(lookback);
        PriceWindow::new(self.bars[start..end].to_vec())
    }

    fn get_cash(&self) -> Result<f64, SignalbotError> {
        Ok(self.portfolio.cash)
    }

    fn get_position(&self, symbol: &str) -> Result<Option<PositionRecord>, SignalbotError> {
        Ok(self.portfolio.get_position(symbol).cloned())
    }

    fn submit_order(&mut self, intent: &OrderIntent) -> Result<OrderAck, SignalbotError> {
        self.check_symbol(&intent.symbol)?;
        let close = self.current_bar().close;
        let fill = open_position(&mut self.portfolio, intent, close, &self.config)?;
        let order_id = self.next_order_id;
        self.next_order_id += 1;
        Ok(OrderAck {
            order_id,
            fill_price: fill.execution_price,
        })
    }

    fn liquidate_position(&mut self, symbol: &str) -> Result<(), SignalbotError> {
        self.check_symbol(symbol)?;
        if !self.portfolio.has_position(symbol) {
            debug!("{symbol}: nothing to liquidate");
            return Ok(());
        }
        let bar = self.current_bar();
        let (close, time) = (bar.close, bar.timestamp);
        close_position(
            &mut self.portfolio,
            symbol,
            close,
            time,
            ExitReason::Liquidated,
            &self.config,
        );
        Ok(())
    }
}

impl ReplayBroker for SimulatedBroker {
    fn advance(&mut self) -> Result<bool, SignalbotError> {
        if self.cursor + 1 >= self.bars.len() {
            return Ok(false);
        }
        self.cursor += 1;
        let bar = self.current_bar();
        let (close, time) = (bar.close, bar.timestamp);
        let symbol = self.symbol.clone();
        if let Some(trade) =
            check_triggers(&mut self.portfolio, &symbol, close, time, &self.config)
        {
            info!(
                "{symbol}: {:?} exit of {} @ {:.4}, pnl {:.2}",
                trade.reason, trade.quantity, trade.exit_price, trade.pnl
            );
        }
        Ok(true)
    }

    fn bars_seen(&self) -> usize {
        self.cursor + 1
    }

    fn equity(&self) -> f64 {
        let prices = HashMap::from([(self.symbol.clone(), self.current_bar().close)]);
        self.portfolio.total_equity(&prices)
    }

    fn closed_trades(&self) -> &[ClosedTrade] {
        &self.portfolio.closed_trades
    }
}
