//! RSI (Relative Strength Index) indicator.
//!
//! Average gain/loss over n price changes, smoothed either as a plain rolling
//! mean of the last n changes or with Wilder's smoothing:
//! - First average: simple mean of gains/losses over first n changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100 when there were gains, 50 on a flat window.
//!
//! Warmup: first n bars are invalid (need n price changes).

use std::fmt;
use std::str::FromStr;

use crate::domain::indicator::{
    point, Indicator, IndicatorInput, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::PriceBar;
use crate::domain::signal::Signal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RsiSmoothing {
    #[default]
    Simple,
    Wilder,
}

impl FromStr for RsiSmoothing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "simple" => Ok(RsiSmoothing::Simple),
            "wilder" | "exponential" => Ok(RsiSmoothing::Wilder),
            other => Err(format!("unknown RSI smoothing '{other}'")),
        }
    }
}

impl fmt::Display for RsiSmoothing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RsiSmoothing::Simple => write!(f, "simple"),
            RsiSmoothing::Wilder => write!(f, "wilder"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RsiThresholds {
    pub upper: f64,
    pub lower: f64,
}

impl RsiThresholds {
    pub fn classify(&self, rsi: f64) -> Signal {
        if rsi > self.upper {
            Signal::Sell
        } else if rsi < self.lower {
            Signal::Buy
        } else {
            Signal::Hold
        }
    }
}

/// RSI from average gain and loss, saturating instead of dividing by zero.
pub fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain > 0.0 { 100.0 } else { 50.0 }
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}

fn average_changes(
    gains: &[f64],
    losses: &[f64],
    period: usize,
    smoothing: RsiSmoothing,
) -> Vec<Option<(f64, f64)>> {
    let mut out = Vec::with_capacity(gains.len());
    let mut wilder: Option<(f64, f64)> = None;

    for idx in 0..gains.len() {
        if idx + 1 < period {
            out.push(None);
            continue;
        }
        let start = idx + 1 - period;
        let simple = (
            gains[start..=idx].iter().sum::<f64>() / period as f64,
            losses[start..=idx].iter().sum::<f64>() / period as f64,
        );
        let averages = match (smoothing, wilder) {
            (RsiSmoothing::Simple, _) | (RsiSmoothing::Wilder, None) => simple,
            (RsiSmoothing::Wilder, Some((prev_gain, prev_loss))) => (
                (prev_gain * (period - 1) as f64 + gains[idx]) / period as f64,
                (prev_loss * (period - 1) as f64 + losses[idx]) / period as f64,
            ),
        };
        wilder = Some(averages);
        out.push(Some(averages));
    }
    out
}

pub fn calculate_rsi(
    bars: &[PriceBar],
    period: usize,
    smoothing: RsiSmoothing,
    thresholds: RsiThresholds,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Rsi { period };

    if period == 0 || bars.len() < 2 {
        let values = bars
            .iter()
            .map(|b| point(b, false, IndicatorValue::Simple(0.0), Signal::Hold))
            .collect();
        return IndicatorSeries {
            indicator_type,
            values,
        };
    }

    let mut gains: Vec<f64> = Vec::with_capacity(bars.len() - 1);
    let mut losses: Vec<f64> = Vec::with_capacity(bars.len() - 1);
    for i in 1..bars.len() {
        let change = bars[i].close - bars[i - 1].close;
        gains.push(if change > 0.0 { change } else { 0.0 });
        losses.push(if change < 0.0 { -change } else { 0.0 });
    }

    let averages = average_changes(&gains, &losses, period, smoothing);

    let mut values = Vec::with_capacity(bars.len());
    values.push(point(&bars[0], false, IndicatorValue::Simple(0.0), Signal::Hold));
    for (bar, avg) in bars.iter().skip(1).zip(averages) {
        match avg {
            Some((avg_gain, avg_loss)) => {
                let rsi = rsi_from_averages(avg_gain, avg_loss);
                values.push(point(
                    bar,
                    true,
                    IndicatorValue::Simple(rsi),
                    thresholds.classify(rsi),
                ));
            }
            None => values.push(point(bar, false, IndicatorValue::Simple(0.0), Signal::Hold)),
        }
    }

    IndicatorSeries {
        indicator_type,
        values,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RsiIndicator {
    pub period: usize,
    pub smoothing: RsiSmoothing,
    pub thresholds: RsiThresholds,
}

impl Indicator for RsiIndicator {
    fn indicator_type(&self) -> IndicatorType {
        IndicatorType::Rsi {
            period: self.period,
        }
    }

    fn min_lookback(&self) -> usize {
        self.period + 1
    }

    fn compute(&self, input: &IndicatorInput<'_>) -> IndicatorSeries {
        calculate_rsi(
            input.window.bars(),
            self.period,
            self.smoothing,
            self.thresholds,
        )
    }
}
