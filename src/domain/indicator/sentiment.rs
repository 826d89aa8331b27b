//! Sentiment-driven signals.
//!
//! The reading itself comes from an external model; these indicators only turn it
//! (and, for the composite, a mean-reversion signal) into a BUY/SELL/HOLD on the
//! latest bar. Earlier bars are never scored.

use crate::domain::indicator::zscore::calculate_zscore;
use crate::domain::indicator::{
    point, Indicator, IndicatorInput, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::PriceBar;
use crate::domain::signal::{Polarity, SentimentReading, Signal};

/// Series where only the last bar may carry a score.
fn score_last(
    bars: &[PriceBar],
    indicator_type: IndicatorType,
    last: Option<(f64, Signal)>,
) -> IndicatorSeries {
    let last_idx = bars.len().saturating_sub(1);
    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| match last {
            Some((score, signal)) if i == last_idx => {
                point(bar, true, IndicatorValue::Simple(score), signal)
            }
            _ => point(bar, false, IndicatorValue::Simple(0.0), Signal::Hold),
        })
        .collect();
    IndicatorSeries {
        indicator_type,
        values,
    }
}

/// BUY on a confident positive reading, SELL on a confident negative one.
pub fn classify_sentiment(reading: &SentimentReading, probability_threshold: f64) -> Signal {
    if reading.probability <= probability_threshold {
        return Signal::Hold;
    }
    match reading.polarity {
        Polarity::Positive => Signal::Buy,
        Polarity::Negative => Signal::Sell,
        Polarity::Neutral => Signal::Hold,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentimentIndicator {
    pub probability_threshold: f64,
}

impl Indicator for SentimentIndicator {
    fn indicator_type(&self) -> IndicatorType {
        IndicatorType::Sentiment
    }

    fn min_lookback(&self) -> usize {
        1
    }

    fn needs_sentiment(&self) -> bool {
        true
    }

    fn compute(&self, input: &IndicatorInput<'_>) -> IndicatorSeries {
        let last = input.sentiment.map(|reading| {
            (
                reading.score(),
                classify_sentiment(&reading, self.probability_threshold),
            )
        });
        score_last(input.window.bars(), IndicatorType::Sentiment, last)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeWeights {
    pub sentiment: f64,
    pub mean_reversion: f64,
}

impl Default for CompositeWeights {
    fn default() -> Self {
        CompositeWeights {
            sentiment: 0.4,
            mean_reversion: 0.6,
        }
    }
}

/// Weighted blend of the sentiment score and a mean-reversion BUY vote.
///
/// score = w_sentiment · probability · polarity + w_mean_reversion · [z-score says BUY]
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeIndicator {
    pub period: usize,
    pub z_threshold: f64,
    pub weights: CompositeWeights,
    pub buy_threshold: f64,
    pub sell_threshold: f64,
}

impl CompositeIndicator {
    pub fn score(&self, reading: &SentimentReading, mean_reversion: Signal) -> f64 {
        let vote = if mean_reversion == Signal::Buy { 1.0 } else { 0.0 };
        self.weights.sentiment * reading.score() + self.weights.mean_reversion * vote
    }

    pub fn classify(&self, score: f64) -> Signal {
        if score > self.buy_threshold {
            Signal::Buy
        } else if score < self.sell_threshold {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }
}

impl Indicator for CompositeIndicator {
    fn indicator_type(&self) -> IndicatorType {
        IndicatorType::SentimentComposite {
            period: self.period,
        }
    }

    fn min_lookback(&self) -> usize {
        self.period.max(2)
    }

    fn needs_sentiment(&self) -> bool {
        true
    }

    fn compute(&self, input: &IndicatorInput<'_>) -> IndicatorSeries {
        let bars = input.window.bars();
        let last = match input.sentiment {
            Some(reading) if bars.len() >= self.min_lookback() => {
                let mean_reversion =
                    calculate_zscore(bars, self.period, self.z_threshold).signal();
                let score = self.score(&reading, mean_reversion);
                Some((score, self.classify(score)))
            }
            _ => None,
        };
        score_last(bars, self.indicator_type(), last)
    }
}
