//! ATR volatility breakout.
//!
//! True range per bar is max(high - low, |high - prev_close|, |low - prev_close|),
//! or high - low on the first bar. ATR is the rolling mean of true range over n
//! bars and the breakout threshold is ATR × multiplier.
//!
//! BUY when the close rose by more than the threshold since the prior bar, SELL when
//! it fell by more. The first bar has no prior close and is always HOLD.

use crate::domain::indicator::{
    point, rolling_mean, Indicator, IndicatorInput, IndicatorSeries, IndicatorType,
    IndicatorValue,
};
use crate::domain::ohlcv::PriceBar;
use crate::domain::signal::Signal;

pub fn true_ranges(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect()
}

pub fn calculate_atr_breakout(
    bars: &[PriceBar],
    period: usize,
    multiplier: f64,
) -> IndicatorSeries {
    let atr = rolling_mean(&true_ranges(bars), period);

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| match atr[i] {
            Some(atr) => {
                let signal = if i == 0 {
                    Signal::Hold
                } else {
                    let threshold = atr * multiplier;
                    let prev_close = bars[i - 1].close;
                    if bar.close > prev_close + threshold {
                        Signal::Buy
                    } else if bar.close < prev_close - threshold {
                        Signal::Sell
                    } else {
                        Signal::Hold
                    }
                };
                point(bar, true, IndicatorValue::Simple(atr), signal)
            }
            None => point(bar, false, IndicatorValue::Simple(0.0), Signal::Hold),
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::AtrBreakout { period, multiplier },
        values,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AtrBreakoutIndicator {
    pub period: usize,
    pub multiplier: f64,
}

impl Indicator for AtrBreakoutIndicator {
    fn indicator_type(&self) -> IndicatorType {
        IndicatorType::AtrBreakout {
            period: self.period,
            multiplier: self.multiplier,
        }
    }

    fn min_lookback(&self) -> usize {
        self.period.max(2)
    }

    fn compute(&self, input: &IndicatorInput<'_>) -> IndicatorSeries {
        calculate_atr_breakout(input.window.bars(), self.period, self.multiplier)
    }
}
