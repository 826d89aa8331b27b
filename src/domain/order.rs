//! Order intents and the account snapshot they are decided against.

use std::fmt;
use std::str::FromStr;

use super::position::PositionRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderKind {
    Market,
    #[default]
    Bracket,
}

impl FromStr for OrderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "market" => Ok(OrderKind::Market),
            "bracket" => Ok(OrderKind::Bracket),
            other => Err(format!("unknown order kind '{other}'")),
        }
    }
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderKind::Market => write!(f, "market"),
            OrderKind::Bracket => write!(f, "bracket"),
        }
    }
}

/// A single order produced for one tick and handed to the broker.
///
/// For a bracket buy `stop_loss_price < reference_price < take_profit_price`;
/// a bracket sell mirrors it.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderIntent {
    pub symbol: String,
    pub side: Side,
    pub quantity: u64,
    pub order_kind: OrderKind,
    pub reference_price: f64,
    pub take_profit_price: Option<f64>,
    pub stop_loss_price: Option<f64>,
}

/// Broker acknowledgement for a submitted order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderAck {
    pub order_id: u64,
    pub fill_price: f64,
}

/// Read-only account state at decision time.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountSnapshot {
    pub cash: f64,
    pub position: Option<PositionRecord>,
}

impl AccountSnapshot {
    pub fn flat(cash: f64) -> Self {
        Self {
            cash,
            position: None,
        }
    }

    pub fn holds_long(&self) -> bool {
        self.position.as_ref().is_some_and(|p| p.is_long())
    }
}
