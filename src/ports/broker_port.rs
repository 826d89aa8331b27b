//! Market data and order routing port trait.

use crate::domain::error::SignalbotError;
use crate::domain::ohlcv::PriceWindow;
use crate::domain::order::{OrderAck, OrderIntent};
use crate::domain::params::Granularity;
use crate::domain::position::{ClosedTrade, PositionRecord};

pub trait BrokerPort {
    /// The most recent `lookback` bars for `symbol`, oldest first.
    fn get_historical_prices(
        &self,
        symbol: &str,
        lookback: usize,
        granularity: Granularity,
    ) -> Result<PriceWindow, SignalbotError>;

    fn get_cash(&self) -> Result<f64, SignalbotError>;

    fn get_position(&self, symbol: &str) -> Result<Option<PositionRecord>, SignalbotError>;

    fn submit_order(&mut self, intent: &OrderIntent) -> Result<OrderAck, SignalbotError>;

    /// Close the whole position in `symbol`; a no-op when flat.
    fn liquidate_position(&mut self, symbol: &str) -> Result<(), SignalbotError>;
}

/// A broker over recorded bars whose clock the replay driver moves.
pub trait ReplayBroker: BrokerPort {
    /// Step to the next bar; `false` once the series is exhausted.
    fn advance(&mut self) -> Result<bool, SignalbotError>;

    /// Bars visible so far, including the current one.
    fn bars_seen(&self) -> usize;

    /// Cash plus open positions marked at the current close.
    fn equity(&self) -> f64;

    fn closed_trades(&self) -> &[ClosedTrade];
}
