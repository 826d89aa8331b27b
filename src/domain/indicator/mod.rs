//! Technical indicator implementations.
//!
//! Every indicator maps a [`PriceWindow`] to an [`IndicatorSeries`]: one point per
//! bar carrying the derived value, a validity flag for the warm-up period, and the
//! per-bar [`Signal`]. Strategies act on the last point only.
//!
//! Invalid points always carry `0.0` values and `Signal::Hold`, so a series never
//! holds NaN and two runs over the same window compare equal.

pub mod aroon;
pub mod atr;
pub mod bollinger;
pub mod crossover;
pub mod rsi;
pub mod sentiment;
pub mod zscore;

use chrono::NaiveDateTime;
use std::fmt;

use crate::domain::ohlcv::{PriceBar, PriceWindow};
use crate::domain::signal::{SentimentReading, Signal};

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub timestamp: NaiveDateTime,
    pub valid: bool,
    pub value: IndicatorValue,
    pub signal: Signal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Crossover { short: f64, long: f64 },
    Bands { upper: f64, middle: f64, lower: f64 },
    Aroon { up: f64, down: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorType {
    Sma { short: usize, long: usize },
    Ema { short: usize, long: usize },
    Bollinger { period: usize, num_std_dev: f64 },
    ZScore { period: usize, z_threshold: f64 },
    Rsi { period: usize },
    Aroon(usize),
    AtrBreakout { period: usize, multiplier: f64 },
    Sentiment,
    SentimentComposite { period: usize },
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma { short, long } => write!(f, "SMA_CROSS({},{})", short, long),
            IndicatorType::Ema { short, long } => write!(f, "EMA_CROSS({},{})", short, long),
            IndicatorType::Bollinger {
                period,
                num_std_dev,
            } => write!(f, "BOLLINGER({},{})", period, num_std_dev),
            IndicatorType::ZScore {
                period,
                z_threshold,
            } => write!(f, "ZSCORE({},{})", period, z_threshold),
            IndicatorType::Rsi { period } => write!(f, "RSI({})", period),
            IndicatorType::Aroon(period) => write!(f, "AROON({})", period),
            IndicatorType::AtrBreakout { period, multiplier } => {
                write!(f, "ATR_BREAKOUT({},{})", period, multiplier)
            }
            IndicatorType::Sentiment => write!(f, "SENTIMENT"),
            IndicatorType::SentimentComposite { period } => {
                write!(f, "SENTIMENT_COMPOSITE({})", period)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Signal of the most recent bar; `Hold` for an empty series.
    pub fn signal(&self) -> Signal {
        self.values.last().map(|p| p.signal).unwrap_or_default()
    }
}

/// Everything an indicator may look at for one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct IndicatorInput<'a> {
    pub window: &'a PriceWindow,
    pub sentiment: Option<SentimentReading>,
}

impl<'a> IndicatorInput<'a> {
    pub fn prices(window: &'a PriceWindow) -> Self {
        Self {
            window,
            sentiment: None,
        }
    }
}

/// A signal generator the strategy evaluator can be bound to.
pub trait Indicator: fmt::Debug + Send + Sync {
    fn indicator_type(&self) -> IndicatorType;

    /// Bars required before the last point can carry a non-HOLD signal.
    fn min_lookback(&self) -> usize;

    fn needs_sentiment(&self) -> bool {
        false
    }

    fn compute(&self, input: &IndicatorInput<'_>) -> IndicatorSeries;
}

/// Build one point, forcing HOLD and zeroed values when invalid.
pub(crate) fn point(
    bar: &PriceBar,
    valid: bool,
    value: IndicatorValue,
    signal: Signal,
) -> IndicatorPoint {
    if valid {
        IndicatorPoint {
            timestamp: bar.timestamp,
            valid,
            value,
            signal,
        }
    } else {
        invalid_point(bar, value)
    }
}

fn invalid_point(bar: &PriceBar, shape: IndicatorValue) -> IndicatorPoint {
    let value = match shape {
        IndicatorValue::Simple(_) => IndicatorValue::Simple(0.0),
        IndicatorValue::Crossover { .. } => IndicatorValue::Crossover {
            short: 0.0,
            long: 0.0,
        },
        IndicatorValue::Bands { .. } => IndicatorValue::Bands {
            upper: 0.0,
            middle: 0.0,
            lower: 0.0,
        },
        IndicatorValue::Aroon { .. } => IndicatorValue::Aroon { up: 0.0, down: 0.0 },
    };
    IndicatorPoint {
        timestamp: bar.timestamp,
        valid: false,
        value,
        signal: Signal::Hold,
    }
}

/// Rolling arithmetic mean; `None` until `period` values are available.
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if period == 0 || i + 1 < period {
                return None;
            }
            let window = &values[i + 1 - period..=i];
            Some(window.iter().sum::<f64>() / period as f64)
        })
        .collect()
}

/// Rolling sample standard deviation (divides by n - 1).
///
/// `None` during warm-up and for periods below 2, where it is undefined.
/// A flat window is exactly `0.0`; the rounded mean would otherwise leave a
/// residue of a few ULPs.
pub fn rolling_sample_std(values: &[f64], period: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if period < 2 || i + 1 < period {
                return None;
            }
            let window = &values[i + 1 - period..=i];
            if window.iter().all(|v| *v == window[0]) {
                return Some(0.0);
            }
            let mean = window.iter().sum::<f64>() / period as f64;
            let variance = window
                .iter()
                .map(|v| {
                    let diff = v - mean;
                    diff * diff
                })
                .sum::<f64>()
                / (period - 1) as f64;
            Some(variance.sqrt())
        })
        .collect()
}

/// Exponentially weighted mean with alpha = 2 / (span + 1), seeded with the first value.
pub fn ewm_mean(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;
    for &v in values {
        let next = match prev {
            None => v,
            Some(p) => alpha * v + (1.0 - alpha) * p,
        };
        out.push(next);
        prev = Some(next);
    }
    out
}
