//! Position records as reported by the broker.

use chrono::NaiveDateTime;

#[derive(Debug, Clone, PartialEq)]
pub struct PositionRecord {
    pub symbol: String,
    /// Positive for long, negative for short.
    pub quantity: i64,
    pub entry_price: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
}

impl PositionRecord {
    pub fn new(symbol: &str, quantity: i64, entry_price: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            quantity,
            entry_price,
            stop_loss: None,
            take_profit: None,
        }
    }

    pub fn is_long(&self) -> bool {
        self.quantity > 0
    }

    pub fn is_short(&self) -> bool {
        self.quantity < 0
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity as f64 * price
    }

    pub fn should_stop_loss(&self, price: f64) -> bool {
        match self.stop_loss {
            None => false,
            Some(stop) if self.is_long() => price <= stop,
            Some(stop) => price >= stop,
        }
    }

    pub fn should_take_profit(&self, price: f64) -> bool {
        match self.take_profit {
            None => false,
            Some(target) if self.is_long() => price >= target,
            Some(target) => price <= target,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExitReason {
    Liquidated,
    StopLoss,
    TakeProfit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub symbol: String,
    pub quantity: i64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub exit_time: NaiveDateTime,
    pub reason: ExitReason,
    pub pnl: f64,
}
