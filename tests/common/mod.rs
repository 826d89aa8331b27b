#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use signalbot::domain::error::SignalbotError;
pub use signalbot::domain::ohlcv::{PriceBar, PriceWindow};
use signalbot::domain::order::{OrderAck, OrderIntent};
use signalbot::domain::params::Granularity;
use signalbot::domain::position::PositionRecord;
use signalbot::domain::signal::{Polarity, SentimentReading};
use signalbot::ports::broker_port::BrokerPort;
use signalbot::ports::sentiment_port::SentimentPort;
use std::cell::RefCell;
use std::collections::HashMap;

/// What the engine asked the broker to do, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum BrokerCall {
    Submit(OrderIntent),
    Liquidate(String),
}

pub struct MockBroker {
    pub bars: HashMap<String, Vec<PriceBar>>,
    pub cash: f64,
    pub positions: HashMap<String, PositionRecord>,
    pub calls: Vec<BrokerCall>,
    pub fetch_error: Option<String>,
    pub reject_orders: Option<String>,
    pub decline_orders: Option<String>,
    pub requested_lookbacks: RefCell<Vec<usize>>,
}

impl MockBroker {
    pub fn new() -> Self {
        Self {
            bars: HashMap::new(),
            cash: 0.0,
            positions: HashMap::new(),
            calls: Vec::new(),
            fetch_error: None,
            reject_orders: None,
            decline_orders: None,
            requested_lookbacks: RefCell::new(Vec::new()),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.bars.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_cash(mut self, cash: f64) -> Self {
        self.cash = cash;
        self
    }

    pub fn with_position(mut self, position: PositionRecord) -> Self {
        self.positions.insert(position.symbol.clone(), position);
        self
    }

    pub fn with_fetch_error(mut self, reason: &str) -> Self {
        self.fetch_error = Some(reason.to_string());
        self
    }

    pub fn rejecting_orders(mut self, reason: &str) -> Self {
        self.reject_orders = Some(reason.to_string());
        self
    }

    /// Orders come back as `OrderRejected` instead of a transport failure.
    pub fn declining_orders(mut self, reason: &str) -> Self {
        self.decline_orders = Some(reason.to_string());
        self
    }

    pub fn submitted(&self) -> Vec<&OrderIntent> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                BrokerCall::Submit(intent) => Some(intent),
                BrokerCall::Liquidate(_) => None,
            })
            .collect()
    }

    pub fn liquidations(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, BrokerCall::Liquidate(_)))
            .count()
    }
}

impl BrokerPort for MockBroker {
    fn get_historical_prices(
        &self,
        symbol: &str,
        lookback: usize,
        _granularity: Granularity,
    ) -> Result<PriceWindow, SignalbotError> {
        if let Some(reason) = &self.fetch_error {
            return Err(SignalbotError::Data {
                reason: reason.clone(),
            });
        }
        self.requested_lookbacks.borrow_mut().push(lookback);
        let bars = self.bars.get(symbol).cloned().unwrap_or_default();
        let start = bars.len().saturating_sub(lookback);
        PriceWindow::new(bars[start..].to_vec())
    }

    fn get_cash(&self) -> Result<f64, SignalbotError> {
        Ok(self.cash)
    }

    fn get_position(&self, symbol: &str) -> Result<Option<PositionRecord>, SignalbotError> {
        Ok(self.positions.get(symbol).cloned())
    }

    fn submit_order(&mut self, intent: &OrderIntent) -> Result<OrderAck, SignalbotError> {
        if let Some(reason) = &self.reject_orders {
            return Err(SignalbotError::Broker {
                reason: reason.clone(),
            });
        }
        if let Some(reason) = &self.decline_orders {
            return Err(SignalbotError::OrderRejected {
                reason: reason.clone(),
            });
        }
        self.calls.push(BrokerCall::Submit(intent.clone()));
        Ok(OrderAck {
            order_id: self.calls.len() as u64,
            fill_price: intent.reference_price,
        })
    }

    fn liquidate_position(&mut self, symbol: &str) -> Result<(), SignalbotError> {
        self.calls.push(BrokerCall::Liquidate(symbol.to_string()));
        self.positions.remove(symbol);
        Ok(())
    }
}

pub struct StaticSentiment(pub SentimentReading);

impl StaticSentiment {
    pub fn new(probability: f64, polarity: Polarity) -> Self {
        Self(SentimentReading {
            probability,
            polarity,
        })
    }
}

impl SentimentPort for StaticSentiment {
    fn estimate(&self, _symbol: &str, _at: NaiveDateTime) -> Result<SentimentReading, SignalbotError> {
        Ok(self.0)
    }
}

pub struct FailingSentiment;

impl SentimentPort for FailingSentiment {
    fn estimate(&self, _symbol: &str, _at: NaiveDateTime) -> Result<SentimentReading, SignalbotError> {
        Err(SignalbotError::Sentiment {
            reason: "model offline".to_string(),
        })
    }
}

pub fn make_bar(symbol: &str, date: &str, close: f64) -> PriceBar {
    PriceBar {
        symbol: symbol.to_string(),
        timestamp: NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
        open: close,
        high: close * 1.01,
        low: close * 0.99,
        close,
        volume: Some(1000),
    }
}

/// Daily bars from 2024-01-01, one per close.
pub fn bars_from_closes(symbol: &str, closes: &[f64]) -> Vec<PriceBar> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let date = start + chrono::Duration::days(i as i64);
            make_bar(symbol, &date.format("%Y-%m-%d").to_string(), close)
        })
        .collect()
}

pub fn window_from_closes(symbol: &str, closes: &[f64]) -> PriceWindow {
    PriceWindow::new(bars_from_closes(symbol, closes)).unwrap()
}

/// The bar series used by the end-to-end crossover scenario.
pub const SCENARIO: [f64; 10] = [10.0, 11.0, 12.0, 11.0, 10.0, 9.0, 8.0, 9.0, 10.0, 11.0];
