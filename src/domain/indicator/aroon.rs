//! Aroon crossover.
//!
//! Over the last n closes, find how many bars back the highest and lowest close
//! sit (the earliest bar wins a tie):
//! - aroon_up = (n - bars_since_high) * 100 / n
//! - aroon_down = (n - bars_since_low) * 100 / n
//!
//! BUY when up > down, SELL when up < down.
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{
    point, Indicator, IndicatorInput, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::PriceBar;
use crate::domain::signal::Signal;

/// Bars back from the end of `window` to its first maximum and first minimum.
fn extreme_offsets(window: &[f64]) -> (usize, usize) {
    let mut max_idx = 0;
    let mut min_idx = 0;
    for (i, &v) in window.iter().enumerate() {
        if v > window[max_idx] {
            max_idx = i;
        }
        if v < window[min_idx] {
            min_idx = i;
        }
    }
    let last = window.len() - 1;
    (last - max_idx, last - min_idx)
}

pub fn calculate_aroon(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let n = period as f64;

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if period == 0 || i + 1 < period {
                return point(
                    bar,
                    false,
                    IndicatorValue::Aroon { up: 0.0, down: 0.0 },
                    Signal::Hold,
                );
            }
            let (since_high, since_low) = extreme_offsets(&closes[i + 1 - period..=i]);
            let up = (n - since_high as f64) * 100.0 / n;
            let down = (n - since_low as f64) * 100.0 / n;
            let signal = if up > down {
                Signal::Buy
            } else if up < down {
                Signal::Sell
            } else {
                Signal::Hold
            };
            point(bar, true, IndicatorValue::Aroon { up, down }, signal)
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Aroon(period),
        values,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AroonIndicator {
    pub period: usize,
}

impl Indicator for AroonIndicator {
    fn indicator_type(&self) -> IndicatorType {
        IndicatorType::Aroon(self.period)
    }

    fn min_lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, input: &IndicatorInput<'_>) -> IndicatorSeries {
        calculate_aroon(input.window.bars(), self.period)
    }
}
