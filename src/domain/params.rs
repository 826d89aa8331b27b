//! Strategy kinds and their typed parameter records.

use std::fmt;
use std::str::FromStr;

use super::error::SignalbotError;
use super::indicator::crossover::MovingAverage;
use super::indicator::rsi::RsiSmoothing;
use super::indicator::sentiment::CompositeWeights;
use super::order::OrderKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    SimpleMaCrossover,
    EmaCrossover,
    BollingerBands,
    MeanReversion,
    RsiCrossover,
    AroonCrossover,
    VolatilityAtr,
    Sentiment,
    SentimentComposite,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 9] = [
        StrategyKind::SimpleMaCrossover,
        StrategyKind::EmaCrossover,
        StrategyKind::BollingerBands,
        StrategyKind::MeanReversion,
        StrategyKind::RsiCrossover,
        StrategyKind::AroonCrossover,
        StrategyKind::VolatilityAtr,
        StrategyKind::Sentiment,
        StrategyKind::SentimentComposite,
    ];

    pub fn identifier(self) -> &'static str {
        match self {
            StrategyKind::SimpleMaCrossover => "simple-mac-crossover",
            StrategyKind::EmaCrossover => "ema-crossover",
            StrategyKind::BollingerBands => "bollinger-bands",
            StrategyKind::MeanReversion => "mean-reversion",
            StrategyKind::RsiCrossover => "rsi-crossover",
            StrategyKind::AroonCrossover => "aroon-crossover",
            StrategyKind::VolatilityAtr => "volatility-atr",
            StrategyKind::Sentiment => "sentiment",
            StrategyKind::SentimentComposite => "sentiment-composite",
        }
    }

    /// Kinds that open short-style sell brackets and remember their last side.
    pub fn trades_both_sides(self) -> bool {
        matches!(self, StrategyKind::Sentiment)
    }

    pub fn known_identifiers() -> String {
        StrategyKind::ALL
            .iter()
            .map(|k| k.identifier())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for StrategyKind {
    type Err = SignalbotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        if name == "mean-revision" {
            return Ok(StrategyKind::MeanReversion);
        }
        StrategyKind::ALL
            .into_iter()
            .find(|k| k.identifier() == name)
            .ok_or_else(|| SignalbotError::UnknownStrategy {
                name: s.trim().to_string(),
                known: StrategyKind::known_identifiers(),
            })
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Granularity {
    Minute,
    Hour,
    #[default]
    Day,
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "minute" => Ok(Granularity::Minute),
            "hour" => Ok(Granularity::Hour),
            "day" => Ok(Granularity::Day),
            other => Err(format!("unknown granularity '{other}'")),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Minute => write!(f, "minute"),
            Granularity::Hour => write!(f, "hour"),
            Granularity::Day => write!(f, "day"),
        }
    }
}

/// Fields that only some strategy kinds use.
#[derive(Debug, Clone, PartialEq)]
pub enum KindParams {
    Crossover {
        short_window: usize,
        long_window: usize,
        average: MovingAverage,
    },
    Bollinger {
        num_std_dev: f64,
    },
    MeanReversion {
        z_threshold: f64,
    },
    Rsi {
        rsi_period: usize,
        upper_threshold: f64,
        lower_threshold: f64,
        smoothing: RsiSmoothing,
    },
    Aroon,
    VolatilityAtr {
        atr_multiplier: f64,
    },
    Sentiment {
        probability_threshold: f64,
    },
    SentimentComposite {
        z_threshold: f64,
        weights: CompositeWeights,
        buy_threshold: f64,
        sell_threshold: f64,
    },
}

impl KindParams {
    /// Whether this parameter shape belongs to `kind`.
    pub fn fits(&self, kind: StrategyKind) -> bool {
        matches!(
            (kind, self),
            (
                StrategyKind::SimpleMaCrossover,
                KindParams::Crossover {
                    average: MovingAverage::Simple,
                    ..
                }
            ) | (
                StrategyKind::EmaCrossover,
                KindParams::Crossover {
                    average: MovingAverage::Exponential,
                    ..
                }
            ) | (StrategyKind::BollingerBands, KindParams::Bollinger { .. })
                | (StrategyKind::MeanReversion, KindParams::MeanReversion { .. })
                | (StrategyKind::RsiCrossover, KindParams::Rsi { .. })
                | (StrategyKind::AroonCrossover, KindParams::Aroon)
                | (StrategyKind::VolatilityAtr, KindParams::VolatilityAtr { .. })
                | (StrategyKind::Sentiment, KindParams::Sentiment { .. })
                | (
                    StrategyKind::SentimentComposite,
                    KindParams::SentimentComposite { .. }
                )
        )
    }
}

/// Validated configuration for one strategy instance.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyParameters {
    pub symbol: String,
    /// Bars requested from the data source each tick, and the indicator period
    /// for window-based indicators.
    pub window: usize,
    pub risk_tolerance: f64,
    pub cash_at_risk: f64,
    pub order_kind: OrderKind,
    pub granularity: Granularity,
    pub kind_params: KindParams,
}

impl fmt::Display for StrategyParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "symbol: {}", self.symbol)?;
        writeln!(f, "window: {}", self.window)?;
        writeln!(f, "risk_tolerance: {}", self.risk_tolerance)?;
        writeln!(f, "cash_at_risk: {}", self.cash_at_risk)?;
        writeln!(f, "order_kind: {}", self.order_kind)?;
        writeln!(f, "granularity: {}", self.granularity)?;
        match &self.kind_params {
            KindParams::Crossover {
                short_window,
                long_window,
                average,
            } => {
                writeln!(f, "short_window: {short_window}")?;
                writeln!(f, "long_window: {long_window}")?;
                writeln!(f, "average: {average}")
            }
            KindParams::Bollinger { num_std_dev } => writeln!(f, "num_std_dev: {num_std_dev}"),
            KindParams::MeanReversion { z_threshold } => writeln!(f, "z_threshold: {z_threshold}"),
            KindParams::Rsi {
                rsi_period,
                upper_threshold,
                lower_threshold,
                smoothing,
            } => {
                writeln!(f, "rsi_period: {rsi_period}")?;
                writeln!(f, "upper_threshold: {upper_threshold}")?;
                writeln!(f, "lower_threshold: {lower_threshold}")?;
                writeln!(f, "rsi_smoothing: {smoothing}")
            }
            KindParams::Aroon => Ok(()),
            KindParams::VolatilityAtr { atr_multiplier } => {
                writeln!(f, "atr_multiplier: {atr_multiplier}")
            }
            KindParams::Sentiment {
                probability_threshold,
            } => writeln!(f, "probability_threshold: {probability_threshold}"),
            KindParams::SentimentComposite {
                z_threshold,
                weights,
                buy_threshold,
                sell_threshold,
            } => {
                writeln!(f, "z_threshold: {z_threshold}")?;
                writeln!(f, "sentiment_weight: {}", weights.sentiment)?;
                writeln!(f, "mean_reversion_weight: {}", weights.mean_reversion)?;
                writeln!(f, "buy_threshold: {buy_threshold}")?;
                writeln!(f, "sell_threshold: {sell_threshold}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_round_trip() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.identifier().parse::<StrategyKind>().unwrap(), kind);
        }
    }

    #[test]
    fn mean_revision_alias() {
        assert_eq!(
            "mean-revision".parse::<StrategyKind>().unwrap(),
            StrategyKind::MeanReversion
        );
    }

    #[test]
    fn unknown_identifier_lists_known_ones() {
        let err = "turtle".parse::<StrategyKind>().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("turtle"));
        assert!(message.contains("bollinger-bands"));
    }

    #[test]
    fn only_sentiment_trades_both_sides() {
        let both: Vec<_> = StrategyKind::ALL
            .into_iter()
            .filter(|k| k.trades_both_sides())
            .collect();
        assert_eq!(both, vec![StrategyKind::Sentiment]);
    }

    #[test]
    fn crossover_params_fit_by_average() {
        let simple = KindParams::Crossover {
            short_window: 9,
            long_window: 21,
            average: MovingAverage::Simple,
        };
        assert!(simple.fits(StrategyKind::SimpleMaCrossover));
        assert!(!simple.fits(StrategyKind::EmaCrossover));
        assert!(!KindParams::Aroon.fits(StrategyKind::BollingerBands));
    }

    #[test]
    fn granularity_parses() {
        assert_eq!("Hour".parse::<Granularity>(), Ok(Granularity::Hour));
        assert!("week".parse::<Granularity>().is_err());
    }
}
