//! Mean reversion z-score.
//!
//! z = (close - rolling mean) / rolling sample std over n bars.
//! BUY if z < -threshold, SELL if z > threshold. A zero std leaves z undefined
//! and the bar is HOLD.

use crate::domain::indicator::{
    point, rolling_mean, rolling_sample_std, Indicator, IndicatorInput, IndicatorSeries,
    IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::PriceBar;
use crate::domain::signal::Signal;

pub fn classify_z(z: f64, z_threshold: f64) -> Signal {
    if z < -z_threshold {
        Signal::Buy
    } else if z > z_threshold {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

pub fn calculate_zscore(bars: &[PriceBar], period: usize, z_threshold: f64) -> IndicatorSeries {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let means = rolling_mean(&closes, period);
    let stds = rolling_sample_std(&closes, period);

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| match (means[i], stds[i]) {
            (Some(mean), Some(std)) if std > 0.0 => {
                let z = (bar.close - mean) / std;
                point(bar, true, IndicatorValue::Simple(z), classify_z(z, z_threshold))
            }
            _ => point(bar, false, IndicatorValue::Simple(0.0), Signal::Hold),
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::ZScore {
            period,
            z_threshold,
        },
        values,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZScoreIndicator {
    pub period: usize,
    pub z_threshold: f64,
}

impl Indicator for ZScoreIndicator {
    fn indicator_type(&self) -> IndicatorType {
        IndicatorType::ZScore {
            period: self.period,
            z_threshold: self.z_threshold,
        }
    }

    fn min_lookback(&self) -> usize {
        self.period.max(2)
    }

    fn compute(&self, input: &IndicatorInput<'_>) -> IndicatorSeries {
        calculate_zscore(input.window.bars(), self.period, self.z_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::window_from_closes;

    fn z_at(series: &IndicatorSeries, i: usize) -> f64 {
        match series.values[i].value {
            IndicatorValue::Simple(z) => z,
            _ => panic!("Expected Simple value"),
        }
    }

    #[test]
    fn zscore_known_value() {
        let window = window_from_closes(&[10.0, 20.0, 30.0]);
        let series = calculate_zscore(window.bars(), 3, 1.5);
        // mean 20, sample std 10 → z = 1
        assert!((z_at(&series, 2) - 1.0).abs() < 1e-12);
        assert_eq!(series.signal(), Signal::Hold);
    }

    #[test]
    fn deep_drop_is_buy() {
        let window = window_from_closes(&[50.0, 50.5, 49.5, 50.0, 50.2, 49.8, 40.0]);
        let series = calculate_zscore(window.bars(), 7, 1.5);
        assert!(z_at(&series, 6) < -1.5);
        assert_eq!(series.signal(), Signal::Buy);
    }

    #[test]
    fn spike_is_sell() {
        let window = window_from_closes(&[50.0, 50.5, 49.5, 50.0, 50.2, 49.8, 60.0]);
        let series = calculate_zscore(window.bars(), 7, 1.5);
        assert_eq!(series.signal(), Signal::Sell);
    }

    #[test]
    fn zero_std_is_hold_not_nan() {
        let window = window_from_closes(&[42.0; 6]);
        let series = calculate_zscore(window.bars(), 3, 0.0);
        assert!(series.values.iter().all(|p| p.signal == Signal::Hold));
        assert!(series.values.iter().all(|p| !p.valid));
        assert_eq!(z_at(&series, 5), 0.0);
    }

    #[test]
    fn flat_inexact_prices_hold() {
        for price in [10.1, 7.7, 0.1, 33.3] {
            for n in 2..25 {
                let window = window_from_closes(&vec![price; 30]);
                let series = calculate_zscore(window.bars(), n, 0.5);
                assert!(
                    series.values.iter().all(|p| p.signal == Signal::Hold),
                    "price {price} period {n}"
                );
            }
        }
    }

    #[test]
    fn classify_boundaries_are_exclusive() {
        assert_eq!(classify_z(-1.5, 1.5), Signal::Hold);
        assert_eq!(classify_z(1.5, 1.5), Signal::Hold);
        assert_eq!(classify_z(-1.51, 1.5), Signal::Buy);
        assert_eq!(classify_z(1.51, 1.5), Signal::Sell);
    }
}
