//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: rolling mean of the close over n periods
//! - Upper: Middle + (num_std_dev × StdDev)
//! - Lower: Middle - (num_std_dev × StdDev)
//!
//! Where StdDev is the sample standard deviation (divides by N-1).
//!
//! Signal: SELL above the upper band, BUY below the lower band. Zero-width
//! bands (a flat window) are HOLD.
//! Warmup: first (period-1) bars are invalid and HOLD.

use crate::domain::indicator::{
    point, rolling_mean, rolling_sample_std, Indicator, IndicatorInput, IndicatorSeries,
    IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::PriceBar;
use crate::domain::signal::Signal;

pub fn calculate_bollinger(
    bars: &[PriceBar],
    period: usize,
    num_std_dev: f64,
) -> IndicatorSeries {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let means = rolling_mean(&closes, period);
    let stds = rolling_sample_std(&closes, period);

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| match (means[i], stds[i]) {
            (Some(middle), Some(std)) => {
                let upper = middle + num_std_dev * std;
                let lower = middle - num_std_dev * std;
                let signal = if std == 0.0 {
                    Signal::Hold
                } else if bar.close > upper {
                    Signal::Sell
                } else if bar.close < lower {
                    Signal::Buy
                } else {
                    Signal::Hold
                };
                point(
                    bar,
                    true,
                    IndicatorValue::Bands {
                        upper,
                        middle,
                        lower,
                    },
                    signal,
                )
            }
            _ => point(
                bar,
                false,
                IndicatorValue::Bands {
                    upper: 0.0,
                    middle: 0.0,
                    lower: 0.0,
                },
                Signal::Hold,
            ),
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Bollinger {
            period,
            num_std_dev,
        },
        values,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerIndicator {
    pub period: usize,
    pub num_std_dev: f64,
}

impl Indicator for BollingerIndicator {
    fn indicator_type(&self) -> IndicatorType {
        IndicatorType::Bollinger {
            period: self.period,
            num_std_dev: self.num_std_dev,
        }
    }

    fn min_lookback(&self) -> usize {
        self.period.max(2)
    }

    fn compute(&self, input: &IndicatorInput<'_>) -> IndicatorSeries {
        calculate_bollinger(input.window.bars(), self.period, self.num_std_dev)
    }
}
