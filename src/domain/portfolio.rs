//! Cash, open positions and closed trades of the simulated account.

use std::collections::HashMap;

use super::position::{ClosedTrade, PositionRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub positions: HashMap<String, PositionRecord>,
    pub closed_trades: Vec<ClosedTrade>,
    entry_commissions: HashMap<String, f64>,
}

impl Portfolio {
    pub fn new(cash: f64) -> Self {
        Portfolio {
            cash,
            positions: HashMap::new(),
            closed_trades: Vec::new(),
            entry_commissions: HashMap::new(),
        }
    }

    pub fn add_position(&mut self, position: PositionRecord) {
        self.positions.insert(position.symbol.clone(), position);
    }

    pub fn get_position(&self, symbol: &str) -> Option<&PositionRecord> {
        self.positions.get(symbol)
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        self.positions.contains_key(symbol)
    }

    pub fn remove_position(&mut self, symbol: &str) -> Option<PositionRecord> {
        self.positions.remove(symbol)
    }

    pub fn record_trade(&mut self, trade: ClosedTrade) {
        self.closed_trades.push(trade);
    }

    pub(crate) fn add_entry_commission(&mut self, symbol: &str, commission: f64) {
        *self
            .entry_commissions
            .entry(symbol.to_string())
            .or_insert(0.0) += commission;
    }

    pub(crate) fn take_entry_commission(&mut self, symbol: &str) -> f64 {
        self.entry_commissions.remove(symbol).unwrap_or(0.0)
    }

    /// Cash plus the signed market value of every position with a known price.
    pub fn total_equity(&self, price_map: &HashMap<String, f64>) -> f64 {
        let position_value: f64 = self
            .positions
            .values()
            .filter_map(|pos| {
                price_map
                    .get(&pos.symbol)
                    .map(|&price| pos.market_value(price))
            })
            .sum();
        self.cash + position_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_portfolio_is_flat() {
        let p = Portfolio::new(1_000.0);
        assert_eq!(p.cash, 1_000.0);
        assert!(p.positions.is_empty());
        assert!(p.closed_trades.is_empty());
    }

    #[test]
    fn add_and_remove_position() {
        let mut p = Portfolio::new(1_000.0);
        p.add_position(PositionRecord::new("AAPL", 5, 10.0));
        assert!(p.has_position("AAPL"));
        assert_eq!(p.get_position("AAPL").unwrap().quantity, 5);
        assert!(p.remove_position("AAPL").is_some());
        assert!(!p.has_position("AAPL"));
    }

    #[test]
    fn equity_counts_shorts_negatively() {
        let mut p = Portfolio::new(1_000.0);
        p.add_position(PositionRecord::new("AAPL", 10, 10.0));
        p.add_position(PositionRecord::new("MSFT", -2, 50.0));
        let prices = HashMap::from([("AAPL".to_string(), 12.0), ("MSFT".to_string(), 40.0)]);
        assert_eq!(p.total_equity(&prices), 1_000.0 + 120.0 - 80.0);
    }

    #[test]
    fn equity_skips_unpriced_positions() {
        let mut p = Portfolio::new(1_000.0);
        p.add_position(PositionRecord::new("AAPL", 10, 10.0));
        assert_eq!(p.total_equity(&HashMap::new()), 1_000.0);
    }

    #[test]
    fn entry_commission_accumulates_until_taken() {
        let mut p = Portfolio::new(1_000.0);
        p.add_entry_commission("AAPL", 1.5);
        p.add_entry_commission("AAPL", 2.0);
        assert_eq!(p.take_entry_commission("AAPL"), 3.5);
        assert_eq!(p.take_entry_commission("AAPL"), 0.0);
    }
}
