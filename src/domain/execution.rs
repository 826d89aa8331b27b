//! Fill simulation for the replay broker.
//!
//! Prices move against the trader by `slippage_pct`; every fill pays
//! `commission_pct` of its notional. Both are percentages (0.1 = 0.1%).

use chrono::NaiveDateTime;

use super::error::SignalbotError;
use super::order::{OrderIntent, Side};
use super::portfolio::Portfolio;
use super::position::{ClosedTrade, ExitReason, PositionRecord};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExecutionConfig {
    pub commission_pct: f64,
    pub slippage_pct: f64,
}

/// Commission on a trade: trade_value * pct / 100.
pub fn calculate_commission(trade_value: f64, config: &ExecutionConfig) -> f64 {
    trade_value * config.commission_pct / 100.0
}

/// Buys fill above the market, sells below.
pub fn apply_slippage(market_price: f64, side: Side, slippage_pct: f64) -> f64 {
    match side {
        Side::Buy => market_price * (1.0 + slippage_pct / 100.0),
        Side::Sell => market_price * (1.0 - slippage_pct / 100.0),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    /// Signed: positive bought, negative sold.
    pub quantity: i64,
    pub execution_price: f64,
    pub commission: f64,
}

/// Open (or add to) a position for `intent` at `market_price`.
///
/// Buys debit cost plus commission and fail when cash cannot cover it; sells
/// open a short and credit the proceeds. Bracket levels on the intent replace
/// any held on the position.
pub fn open_position(
    portfolio: &mut Portfolio,
    intent: &OrderIntent,
    market_price: f64,
    config: &ExecutionConfig,
) -> Result<Fill, SignalbotError> {
    if intent.quantity == 0 {
        return Err(SignalbotError::OrderRejected {
            reason: "order quantity must be positive".to_string(),
        });
    }
    let quantity = i64::try_from(intent.quantity).map_err(|_| SignalbotError::OrderRejected {
        reason: format!("order quantity {} is too large", intent.quantity),
    })?;
    if let Some(held) = portfolio.get_position(&intent.symbol) {
        let opposing = match intent.side {
            Side::Buy => held.is_short(),
            Side::Sell => held.is_long(),
        };
        if opposing {
            return Err(SignalbotError::OrderRejected {
                reason: format!(
                    "{}: close the open position of {} before reversing",
                    intent.symbol, held.quantity
                ),
            });
        }
    }

    let execution_price = apply_slippage(market_price, intent.side, config.slippage_pct);
    let notional = quantity as f64 * execution_price;
    let commission = calculate_commission(notional, config);

    let signed = match intent.side {
        Side::Buy => {
            let total_cost = notional + commission;
            if total_cost > portfolio.cash {
                return Err(SignalbotError::OrderRejected {
                    reason: format!(
                        "insufficient buying power: need {total_cost:.2}, have {:.2}",
                        portfolio.cash
                    ),
                });
            }
            portfolio.cash -= total_cost;
            quantity
        }
        Side::Sell => {
            portfolio.cash += notional - commission;
            -quantity
        }
    };

    let position = match portfolio.remove_position(&intent.symbol) {
        Some(held) => {
            let combined = held.quantity + signed;
            let entry_price = (held.quantity as f64 * held.entry_price
                + signed as f64 * execution_price)
                / combined as f64;
            PositionRecord {
                quantity: combined,
                entry_price,
                stop_loss: intent.stop_loss_price.or(held.stop_loss),
                take_profit: intent.take_profit_price.or(held.take_profit),
                ..held
            }
        }
        None => PositionRecord {
            stop_loss: intent.stop_loss_price,
            take_profit: intent.take_profit_price,
            ..PositionRecord::new(&intent.symbol, signed, execution_price)
        },
    };
    portfolio.add_position(position);
    portfolio.add_entry_commission(&intent.symbol, commission);

    Ok(Fill {
        quantity: signed,
        execution_price,
        commission,
    })
}

/// Close the whole position in `symbol` at `market_price`.
///
/// PnL includes both the entry and exit commissions. `None` when flat.
pub fn close_position(
    portfolio: &mut Portfolio,
    symbol: &str,
    market_price: f64,
    exit_time: NaiveDateTime,
    reason: ExitReason,
    config: &ExecutionConfig,
) -> Option<ClosedTrade> {
    let position = portfolio.remove_position(symbol)?;
    let entry_commission = portfolio.take_entry_commission(symbol);

    let exit_side = if position.is_long() {
        Side::Sell
    } else {
        Side::Buy
    };
    let exit_price = apply_slippage(market_price, exit_side, config.slippage_pct);
    let exit_value = position.quantity.unsigned_abs() as f64 * exit_price;
    let exit_commission = calculate_commission(exit_value, config);

    match exit_side {
        Side::Sell => portfolio.cash += exit_value - exit_commission,
        Side::Buy => portfolio.cash -= exit_value + exit_commission,
    }

    let pnl = position.quantity as f64 * (exit_price - position.entry_price)
        - entry_commission
        - exit_commission;

    let trade = ClosedTrade {
        symbol: position.symbol,
        quantity: position.quantity,
        entry_price: position.entry_price,
        exit_price,
        exit_time,
        reason,
        pnl,
    };
    portfolio.record_trade(trade.clone());
    Some(trade)
}

/// Exit `symbol` if `price` crosses its stop-loss or take-profit.
///
/// Stop-loss wins when both would fire.
pub fn check_triggers(
    portfolio: &mut Portfolio,
    symbol: &str,
    price: f64,
    time: NaiveDateTime,
    config: &ExecutionConfig,
) -> Option<ClosedTrade> {
    let position = portfolio.get_position(symbol)?;
    let reason = if position.should_stop_loss(price) {
        ExitReason::StopLoss
    } else if position.should_take_profit(price) {
        ExitReason::TakeProfit
    } else {
        return None;
    };
    close_position(portfolio, symbol, price, time, reason, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderKind;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn intent(side: Side, quantity: u64) -> OrderIntent {
        OrderIntent {
            symbol: "AAPL".to_string(),
            side,
            quantity,
            order_kind: OrderKind::Bracket,
            reference_price: 100.0,
            take_profit_price: Some(match side {
                Side::Buy => 110.0,
                Side::Sell => 90.0,
            }),
            stop_loss_price: Some(match side {
                Side::Buy => 95.0,
                Side::Sell => 105.0,
            }),
        }
    }

    fn costly() -> ExecutionConfig {
        ExecutionConfig {
            commission_pct: 0.1,
            slippage_pct: 0.05,
        }
    }

    #[test]
    fn commission_is_percent_of_value() {
        assert_relative_eq!(calculate_commission(10_000.0, &costly()), 10.0);
        assert_eq!(calculate_commission(10_000.0, &ExecutionConfig::default()), 0.0);
    }

    #[test]
    fn slippage_moves_against_trader() {
        assert_relative_eq!(apply_slippage(100.0, Side::Buy, 0.05), 100.05, epsilon = 1e-9);
        assert_relative_eq!(apply_slippage(100.0, Side::Sell, 0.05), 99.95, epsilon = 1e-9);
    }

    #[test]
    fn buy_debits_cost_and_commission() {
        let mut portfolio = Portfolio::new(10_000.0);
        let fill = open_position(
            &mut portfolio,
            &intent(Side::Buy, 10),
            100.0,
            &ExecutionConfig {
                commission_pct: 1.0,
                slippage_pct: 0.0,
            },
        )
        .unwrap();
        assert_eq!(fill.quantity, 10);
        assert_relative_eq!(fill.commission, 10.0);
        assert_relative_eq!(portfolio.cash, 8_990.0);

        let position = portfolio.get_position("AAPL").unwrap();
        assert_eq!(position.stop_loss, Some(95.0));
        assert_eq!(position.take_profit, Some(110.0));
    }

    #[test]
    fn buy_beyond_cash_rejected() {
        let mut portfolio = Portfolio::new(500.0);
        let err = open_position(&mut portfolio, &intent(Side::Buy, 10), 100.0, &costly());
        assert!(matches!(err, Err(SignalbotError::OrderRejected { .. })));
        assert_eq!(portfolio.cash, 500.0);
        assert!(!portfolio.has_position("AAPL"));
    }

    #[test]
    fn zero_quantity_rejected() {
        let mut portfolio = Portfolio::new(500.0);
        assert!(open_position(&mut portfolio, &intent(Side::Buy, 0), 100.0, &costly()).is_err());
    }

    #[test]
    fn reversing_without_exit_rejected() {
        let mut portfolio = Portfolio::new(10_000.0);
        let config = ExecutionConfig::default();
        open_position(&mut portfolio, &intent(Side::Buy, 10), 100.0, &config).unwrap();
        let cash = portfolio.cash;
        assert!(open_position(&mut portfolio, &intent(Side::Sell, 10), 100.0, &config).is_err());
        assert_eq!(portfolio.cash, cash);
        assert_eq!(portfolio.get_position("AAPL").unwrap().quantity, 10);
    }

    #[test]
    fn adding_to_long_averages_entry() {
        let mut portfolio = Portfolio::new(10_000.0);
        let config = ExecutionConfig::default();
        open_position(&mut portfolio, &intent(Side::Buy, 10), 100.0, &config).unwrap();
        open_position(&mut portfolio, &intent(Side::Buy, 10), 110.0, &config).unwrap();
        let position = portfolio.get_position("AAPL").unwrap();
        assert_eq!(position.quantity, 20);
        assert_relative_eq!(position.entry_price, 105.0);
    }

    #[test]
    fn long_round_trip_pnl_includes_commissions() {
        let mut portfolio = Portfolio::new(10_000.0);
        let config = ExecutionConfig {
            commission_pct: 1.0,
            slippage_pct: 0.0,
        };
        open_position(&mut portfolio, &intent(Side::Buy, 10), 100.0, &config).unwrap();
        let trade = close_position(
            &mut portfolio,
            "AAPL",
            110.0,
            time(),
            ExitReason::Liquidated,
            &config,
        )
        .unwrap();
        // 10 * 10 gain - 10 entry - 11 exit
        assert_relative_eq!(trade.pnl, 79.0);
        assert_relative_eq!(portfolio.cash, 10_079.0);
        assert_eq!(portfolio.closed_trades.len(), 1);
    }

    #[test]
    fn short_round_trip_settles_cash() {
        let mut portfolio = Portfolio::new(10_000.0);
        let config = ExecutionConfig::default();
        open_position(&mut portfolio, &intent(Side::Sell, 10), 100.0, &config).unwrap();
        assert_relative_eq!(portfolio.cash, 11_000.0);
        assert_eq!(portfolio.get_position("AAPL").unwrap().quantity, -10);

        let trade = close_position(
            &mut portfolio,
            "AAPL",
            90.0,
            time(),
            ExitReason::Liquidated,
            &config,
        )
        .unwrap();
        assert_relative_eq!(trade.pnl, 100.0);
        assert_relative_eq!(portfolio.cash, 10_100.0);
    }

    #[test]
    fn close_when_flat_is_none() {
        let mut portfolio = Portfolio::new(1_000.0);
        assert!(
            close_position(
                &mut portfolio,
                "AAPL",
                10.0,
                time(),
                ExitReason::Liquidated,
                &ExecutionConfig::default()
            )
            .is_none()
        );
    }

    #[test]
    fn stop_loss_trigger() {
        let mut portfolio = Portfolio::new(10_000.0);
        let config = ExecutionConfig::default();
        open_position(&mut portfolio, &intent(Side::Buy, 10), 100.0, &config).unwrap();

        assert!(check_triggers(&mut portfolio, "AAPL", 100.0, time(), &config).is_none());
        let trade = check_triggers(&mut portfolio, "AAPL", 94.0, time(), &config).unwrap();
        assert_eq!(trade.reason, ExitReason::StopLoss);
        assert!(!portfolio.has_position("AAPL"));
    }

    #[test]
    fn short_take_profit_trigger() {
        let mut portfolio = Portfolio::new(10_000.0);
        let config = ExecutionConfig::default();
        open_position(&mut portfolio, &intent(Side::Sell, 10), 100.0, &config).unwrap();
        let trade = check_triggers(&mut portfolio, "AAPL", 89.0, time(), &config).unwrap();
        assert_eq!(trade.reason, ExitReason::TakeProfit);
        assert!(trade.pnl > 0.0);
    }
}
