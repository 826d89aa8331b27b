//! Constant sentiment source for replays and tests.

use chrono::NaiveDateTime;

use crate::domain::error::SignalbotError;
use crate::domain::signal::{Polarity, SentimentReading};
use crate::ports::config_port::ConfigPort;
use crate::ports::sentiment_port::SentimentPort;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedSentiment {
    reading: SentimentReading,
}

impl FixedSentiment {
    pub fn new(probability: f64, polarity: Polarity) -> Result<Self, SignalbotError> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(SignalbotError::Sentiment {
                reason: format!("probability {probability} is outside [0, 1]"),
            });
        }
        Ok(Self {
            reading: SentimentReading {
                probability,
                polarity,
            },
        })
    }

    /// `[backtest] sentiment` / `sentiment_probability`, if a polarity is configured.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Option<Self>, SignalbotError> {
        let Some(raw) = config.get_string("backtest", "sentiment") else {
            return Ok(None);
        };
        let polarity = raw.parse::<Polarity>().map_err(|reason| SignalbotError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "sentiment".to_string(),
            reason,
        })?;
        let probability = config.get_double("backtest", "sentiment_probability", 1.0);
        Self::new(probability, polarity)
            .map(Some)
            .map_err(|e| SignalbotError::ConfigInvalid {
                section: "backtest".to_string(),
                key: "sentiment_probability".to_string(),
                reason: e.to_string(),
            })
    }
}

impl SentimentPort for FixedSentiment {
    fn estimate(&self, _symbol: &str, _at: NaiveDateTime) -> Result<SentimentReading, SignalbotError> {
        Ok(self.reading)
    }
}
