//! Trading signals and the sentiment reading some strategies consume.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Signal {
    Buy,
    Sell,
    #[default]
    Hold,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => write!(f, "BUY"),
            Signal::Sell => write!(f, "SELL"),
            Signal::Hold => write!(f, "HOLD"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Positive,
    Negative,
    Neutral,
}

impl Polarity {
    /// +1 / -1 / 0, used to weight the model probability.
    pub fn sign(self) -> f64 {
        match self {
            Polarity::Positive => 1.0,
            Polarity::Negative => -1.0,
            Polarity::Neutral => 0.0,
        }
    }
}

impl FromStr for Polarity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Ok(Polarity::Positive),
            "negative" => Ok(Polarity::Negative),
            "neutral" => Ok(Polarity::Neutral),
            other => Err(format!("unknown sentiment polarity '{other}'")),
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Polarity::Positive => write!(f, "positive"),
            Polarity::Negative => write!(f, "negative"),
            Polarity::Neutral => write!(f, "neutral"),
        }
    }
}

/// Output of the external sentiment model: a polarity and its probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentimentReading {
    pub probability: f64,
    pub polarity: Polarity,
}

impl SentimentReading {
    /// probability * polarity sign, in [-1, 1].
    pub fn score(&self) -> f64 {
        self.probability * self.polarity.sign()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_display() {
        assert_eq!(Signal::Buy.to_string(), "BUY");
        assert_eq!(Signal::Sell.to_string(), "SELL");
        assert_eq!(Signal::default(), Signal::Hold);
    }

    #[test]
    fn polarity_parses_case_insensitively() {
        assert_eq!("Positive".parse::<Polarity>(), Ok(Polarity::Positive));
        assert_eq!(" negative ".parse::<Polarity>(), Ok(Polarity::Negative));
        assert!("bullish".parse::<Polarity>().is_err());
    }

    #[test]
    fn reading_score_is_signed_probability() {
        let reading = SentimentReading {
            probability: 0.8,
            polarity: Polarity::Negative,
        };
        assert!((reading.score() + 0.8).abs() < f64::EPSILON);

        let neutral = SentimentReading {
            probability: 0.99,
            polarity: Polarity::Neutral,
        };
        assert_eq!(neutral.score(), 0.0);
    }
}
