//! Position sizing and bracket price arithmetic.
//!
//! Shared by every strategy kind: quantity comes from the cash-at-risk fraction,
//! exit prices from the risk tolerance.

use super::error::SizingIssue;
use super::order::Side;

/// Whole units to trade: round(cash × cash_at_risk / last_price), ties to even.
///
/// An `Err` means the quantity is zero for the stated reason; the caller reports
/// it and skips the order.
pub fn size_position(cash: f64, last_price: f64, cash_at_risk: f64) -> Result<u64, SizingIssue> {
    if !last_price.is_finite() || last_price <= 0.0 {
        return Err(SizingIssue::InvalidPrice { price: last_price });
    }
    if cash.is_nan() || cash <= 0.0 {
        return Err(SizingIssue::InsufficientCash { cash });
    }

    let raw = cash * cash_at_risk / last_price;
    let quantity = raw.round_ties_even();
    if quantity <= 0.0 {
        return Err(SizingIssue::NonPositiveQuantity {
            cash,
            cash_at_risk,
            price: last_price,
            raw,
        });
    }
    Ok(quantity as u64)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub take_profit: f64,
    pub stop_loss: f64,
}

/// Take-profit and stop-loss around `reference_price`.
///
/// Buy: tp = p·(1+r), sl = p·(1−r). Sell: tp = p·(1−r), sl = p·(1+r).
/// `risk_tolerance` must lie strictly inside (0, 1).
pub fn bracket_prices(
    reference_price: f64,
    risk_tolerance: f64,
    side: Side,
) -> Result<Bracket, SizingIssue> {
    let degenerate = !reference_price.is_finite()
        || reference_price <= 0.0
        || !(risk_tolerance > 0.0 && risk_tolerance < 1.0);
    if degenerate {
        return Err(SizingIssue::DegenerateBracket {
            reference_price,
            risk_tolerance,
        });
    }

    let above = reference_price * (1.0 + risk_tolerance);
    let below = reference_price * (1.0 - risk_tolerance);
    Ok(match side {
        Side::Buy => Bracket {
            take_profit: above,
            stop_loss: below,
        },
        Side::Sell => Bracket {
            take_profit: below,
            stop_loss: above,
        },
    })
}
