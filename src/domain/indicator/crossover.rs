//! Moving average crossover (simple or exponential).
//!
//! BUY on the bar where the short average moves from at-or-below the long average
//! to strictly above it; SELL on the mirror crossing; HOLD otherwise.
//!
//! Exponential averages use alpha = 2 / (span + 1) seeded with the first close and
//! are treated as warmed up once `span` bars have been seen.
//! Warmup: a crossing needs both averages on the current and the previous bar, so
//! the first max(short, long) bars never signal.

use std::fmt;
use std::str::FromStr;

use crate::domain::indicator::{
    ewm_mean, point, rolling_mean, Indicator, IndicatorInput, IndicatorSeries, IndicatorType,
    IndicatorValue,
};
use crate::domain::ohlcv::PriceBar;
use crate::domain::signal::Signal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MovingAverage {
    #[default]
    Simple,
    Exponential,
}

impl FromStr for MovingAverage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "simple" | "sma" => Ok(MovingAverage::Simple),
            "exponential" | "ema" => Ok(MovingAverage::Exponential),
            other => Err(format!("unknown moving average '{other}'")),
        }
    }
}

impl fmt::Display for MovingAverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovingAverage::Simple => write!(f, "simple"),
            MovingAverage::Exponential => write!(f, "exponential"),
        }
    }
}

fn averages(closes: &[f64], span: usize, average: MovingAverage) -> Vec<Option<f64>> {
    match average {
        MovingAverage::Simple => rolling_mean(closes, span),
        MovingAverage::Exponential => ewm_mean(closes, span)
            .into_iter()
            .enumerate()
            .map(|(i, v)| (span > 0 && i + 1 >= span).then_some(v))
            .collect(),
    }
}

/// Classify the transition between two consecutive (short, long) pairs.
pub fn crossing_signal(prev: (f64, f64), current: (f64, f64)) -> Signal {
    let (prev_short, prev_long) = prev;
    let (short, long) = current;
    if prev_short <= prev_long && short > long {
        Signal::Buy
    } else if prev_short >= prev_long && short < long {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

pub fn calculate_crossover(
    bars: &[PriceBar],
    short_window: usize,
    long_window: usize,
    average: MovingAverage,
) -> IndicatorSeries {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let short = averages(&closes, short_window, average);
    let long = averages(&closes, long_window, average);

    let pairs: Vec<Option<(f64, f64)>> = short
        .iter()
        .zip(&long)
        .map(|(s, l)| Some(((*s)?, (*l)?)))
        .collect();

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let current = pairs[i];
            let prev = if i == 0 { None } else { pairs[i - 1] };
            let (short, long) = current.unwrap_or((0.0, 0.0));
            let value = IndicatorValue::Crossover { short, long };
            match (prev, current) {
                (Some(p), Some(c)) => point(bar, true, value, crossing_signal(p, c)),
                (None, Some(_)) => point(bar, true, value, Signal::Hold),
                _ => point(bar, false, value, Signal::Hold),
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: indicator_type(short_window, long_window, average),
        values,
    }
}

fn indicator_type(short: usize, long: usize, average: MovingAverage) -> IndicatorType {
    match average {
        MovingAverage::Simple => IndicatorType::Sma { short, long },
        MovingAverage::Exponential => IndicatorType::Ema { short, long },
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrossoverIndicator {
    pub short_window: usize,
    pub long_window: usize,
    pub average: MovingAverage,
}

impl Indicator for CrossoverIndicator {
    fn indicator_type(&self) -> IndicatorType {
        indicator_type(self.short_window, self.long_window, self.average)
    }

    fn min_lookback(&self) -> usize {
        self.short_window.max(self.long_window) + 1
    }

    fn compute(&self, input: &IndicatorInput<'_>) -> IndicatorSeries {
        calculate_crossover(
            input.window.bars(),
            self.short_window,
            self.long_window,
            self.average,
        )
    }
}
