//! Strategy registry: identifier + raw `[strategy]` record → validated parameters
//! and a strategy bound to its indicator.
//!
//! Unknown identifiers and out-of-range fields are fatal here, before any tick runs.

use crate::domain::error::SignalbotError;
use crate::domain::indicator::aroon::AroonIndicator;
use crate::domain::indicator::atr::AtrBreakoutIndicator;
use crate::domain::indicator::bollinger::BollingerIndicator;
use crate::domain::indicator::crossover::{CrossoverIndicator, MovingAverage};
use crate::domain::indicator::rsi::{RsiIndicator, RsiThresholds};
use crate::domain::indicator::sentiment::{
    CompositeIndicator, CompositeWeights, SentimentIndicator,
};
use crate::domain::indicator::zscore::ZScoreIndicator;
use crate::domain::indicator::Indicator;
use crate::domain::order::OrderKind;
use crate::domain::params::{KindParams, StrategyKind, StrategyParameters};
use crate::domain::strategy::Strategy;
use crate::ports::config_port::ConfigPort;

const SECTION: &str = "strategy";

pub const DEFAULT_SYMBOL: &str = "AAPL";
pub const DEFAULT_WINDOW: usize = 22;
pub const DEFAULT_SHORT_WINDOW: usize = 9;
pub const DEFAULT_LONG_WINDOW: usize = 21;
pub const DEFAULT_RISK_TOLERANCE: f64 = 0.02;
pub const DEFAULT_CASH_AT_RISK: f64 = 0.1;
pub const DEFAULT_NUM_STD_DEV: f64 = 2.0;
pub const DEFAULT_Z_THRESHOLD: f64 = 1.5;
pub const DEFAULT_RSI_PERIOD: usize = 14;
pub const DEFAULT_RSI_UPPER: f64 = 70.0;
pub const DEFAULT_RSI_LOWER: f64 = 30.0;
pub const DEFAULT_ATR_MULTIPLIER: f64 = 1.1;
pub const DEFAULT_PROBABILITY_THRESHOLD: f64 = 0.9;
pub const DEFAULT_BUY_THRESHOLD: f64 = 0.6;
pub const DEFAULT_SELL_THRESHOLD: f64 = 0.4;

/// Strategy identifier from `[strategy] name`.
pub fn resolve_kind(config: &dyn ConfigPort) -> Result<StrategyKind, SignalbotError> {
    config
        .get_string(SECTION, "name")
        .ok_or_else(|| SignalbotError::ConfigMissing {
            section: SECTION.to_string(),
            key: "name".to_string(),
        })?
        .parse()
}

/// Assemble and validate parameters for `kind` from the `[strategy]` section.
///
/// Missing keys take the bot's defaults; present keys must parse and be in range.
pub fn build_parameters(
    kind: StrategyKind,
    config: &dyn ConfigPort,
) -> Result<StrategyParameters, SignalbotError> {
    let symbol = config
        .get_string(SECTION, "symbol")
        .unwrap_or_else(|| DEFAULT_SYMBOL.to_string())
        .trim()
        .to_uppercase();

    let kind_params = match kind {
        StrategyKind::SimpleMaCrossover | StrategyKind::EmaCrossover => KindParams::Crossover {
            short_window: read_period(config, "short_window", DEFAULT_SHORT_WINDOW)?,
            long_window: read_period(config, "long_window", DEFAULT_LONG_WINDOW)?,
            average: if kind == StrategyKind::EmaCrossover {
                MovingAverage::Exponential
            } else {
                MovingAverage::Simple
            },
        },
        StrategyKind::BollingerBands => KindParams::Bollinger {
            num_std_dev: read_number(config, "num_std_dev", DEFAULT_NUM_STD_DEV)?,
        },
        StrategyKind::MeanReversion => KindParams::MeanReversion {
            z_threshold: read_number(config, "z_threshold", DEFAULT_Z_THRESHOLD)?,
        },
        StrategyKind::RsiCrossover => KindParams::Rsi {
            rsi_period: read_period(config, "rsi_period", DEFAULT_RSI_PERIOD)?,
            upper_threshold: read_number(config, "upper_threshold", DEFAULT_RSI_UPPER)?,
            lower_threshold: read_number(config, "lower_threshold", DEFAULT_RSI_LOWER)?,
            smoothing: read_parsed(config, "rsi_smoothing", Default::default())?,
        },
        StrategyKind::AroonCrossover => KindParams::Aroon,
        StrategyKind::VolatilityAtr => KindParams::VolatilityAtr {
            atr_multiplier: read_number(config, "atr_multiplier", DEFAULT_ATR_MULTIPLIER)?,
        },
        StrategyKind::Sentiment => KindParams::Sentiment {
            probability_threshold: read_number(
                config,
                "probability_threshold",
                DEFAULT_PROBABILITY_THRESHOLD,
            )?,
        },
        StrategyKind::SentimentComposite => {
            let defaults = CompositeWeights::default();
            KindParams::SentimentComposite {
                z_threshold: read_number(config, "z_threshold", DEFAULT_Z_THRESHOLD)?,
                weights: CompositeWeights {
                    sentiment: read_number(config, "sentiment_weight", defaults.sentiment)?,
                    mean_reversion: read_number(
                        config,
                        "mean_reversion_weight",
                        defaults.mean_reversion,
                    )?,
                },
                buy_threshold: read_number(config, "buy_threshold", DEFAULT_BUY_THRESHOLD)?,
                sell_threshold: read_number(config, "sell_threshold", DEFAULT_SELL_THRESHOLD)?,
            }
        }
    };

    let params = StrategyParameters {
        symbol,
        window: read_period(config, "window", DEFAULT_WINDOW)?,
        risk_tolerance: read_number(config, "risk_tolerance", DEFAULT_RISK_TOLERANCE)?,
        cash_at_risk: read_number(config, "cash_at_risk", DEFAULT_CASH_AT_RISK)?,
        order_kind: read_parsed(config, "order_kind", OrderKind::default())?,
        granularity: read_parsed(config, "granularity", Default::default())?,
        kind_params,
    };

    validate_parameters(kind, &params)?;
    Ok(params)
}

/// Construct a strategy instance; the indicator binding is fixed for its lifetime.
pub fn new_strategy(
    kind: StrategyKind,
    params: StrategyParameters,
) -> Result<Strategy, SignalbotError> {
    validate_parameters(kind, &params)?;
    let indicator = bind_indicator(&params);
    Ok(Strategy::new(kind, params, indicator))
}

/// Parse the identifier and parameters from config and construct the strategy.
pub fn strategy_from_config(config: &dyn ConfigPort) -> Result<Strategy, SignalbotError> {
    let kind = resolve_kind(config)?;
    let params = build_parameters(kind, config)?;
    new_strategy(kind, params)
}

pub fn bind_indicator(params: &StrategyParameters) -> Box<dyn Indicator> {
    match &params.kind_params {
        KindParams::Crossover {
            short_window,
            long_window,
            average,
        } => Box::new(CrossoverIndicator {
            short_window: *short_window,
            long_window: *long_window,
            average: *average,
        }),
        KindParams::Bollinger { num_std_dev } => Box::new(BollingerIndicator {
            period: params.window,
            num_std_dev: *num_std_dev,
        }),
        KindParams::MeanReversion { z_threshold } => Box::new(ZScoreIndicator {
            period: params.window,
            z_threshold: *z_threshold,
        }),
        KindParams::Rsi {
            rsi_period,
            upper_threshold,
            lower_threshold,
            smoothing,
        } => Box::new(RsiIndicator {
            period: *rsi_period,
            smoothing: *smoothing,
            thresholds: RsiThresholds {
                upper: *upper_threshold,
                lower: *lower_threshold,
            },
        }),
        KindParams::Aroon => Box::new(AroonIndicator {
            period: params.window,
        }),
        KindParams::VolatilityAtr { atr_multiplier } => Box::new(AtrBreakoutIndicator {
            period: params.window,
            multiplier: *atr_multiplier,
        }),
        KindParams::Sentiment {
            probability_threshold,
        } => Box::new(SentimentIndicator {
            probability_threshold: *probability_threshold,
        }),
        KindParams::SentimentComposite {
            z_threshold,
            weights,
            buy_threshold,
            sell_threshold,
        } => Box::new(CompositeIndicator {
            period: params.window,
            z_threshold: *z_threshold,
            weights: *weights,
            buy_threshold: *buy_threshold,
            sell_threshold: *sell_threshold,
        }),
    }
}

pub fn validate_parameters(
    kind: StrategyKind,
    params: &StrategyParameters,
) -> Result<(), SignalbotError> {
    validate_symbol(&params.symbol)?;
    validate_positive_period("window", params.window)?;
    validate_fraction("cash_at_risk", params.cash_at_risk)?;
    validate_risk_tolerance(params.risk_tolerance, params.order_kind)?;

    if !params.kind_params.fits(kind) {
        return Err(SignalbotError::invalid_param(
            "name",
            format!("parameters do not describe a {kind} strategy"),
        ));
    }

    match &params.kind_params {
        KindParams::Crossover {
            short_window,
            long_window,
            ..
        } => {
            validate_positive_period("short_window", *short_window)?;
            validate_positive_period("long_window", *long_window)?;
        }
        KindParams::Bollinger { num_std_dev } => {
            validate_deviation_window(params.window)?;
            validate_non_negative("num_std_dev", *num_std_dev)?;
        }
        KindParams::MeanReversion { z_threshold } => {
            validate_deviation_window(params.window)?;
            validate_non_negative("z_threshold", *z_threshold)?;
        }
        KindParams::Rsi {
            rsi_period,
            upper_threshold,
            lower_threshold,
            ..
        } => {
            validate_positive_period("rsi_period", *rsi_period)?;
            validate_rsi_thresholds(*upper_threshold, *lower_threshold)?;
        }
        KindParams::Aroon => {}
        KindParams::VolatilityAtr { atr_multiplier } => {
            validate_non_negative("atr_multiplier", *atr_multiplier)?;
        }
        KindParams::Sentiment {
            probability_threshold,
        } => {
            validate_probability("probability_threshold", *probability_threshold)?;
        }
        KindParams::SentimentComposite {
            z_threshold,
            weights,
            buy_threshold,
            sell_threshold,
        } => {
            validate_deviation_window(params.window)?;
            validate_non_negative("z_threshold", *z_threshold)?;
            validate_finite("sentiment_weight", weights.sentiment)?;
            validate_finite("mean_reversion_weight", weights.mean_reversion)?;
            validate_finite("buy_threshold", *buy_threshold)?;
            validate_finite("sell_threshold", *sell_threshold)?;
            if sell_threshold > buy_threshold {
                return Err(SignalbotError::invalid_param(
                    "sell_threshold",
                    "sell_threshold must not exceed buy_threshold",
                ));
            }
        }
    }
    Ok(())
}

fn validate_symbol(symbol: &str) -> Result<(), SignalbotError> {
    if symbol.is_empty() {
        return Err(SignalbotError::invalid_param("symbol", "symbol must not be empty"));
    }
    if symbol.chars().any(|c| c.is_ascii_digit()) {
        return Err(SignalbotError::invalid_param(
            "symbol",
            "symbol must not contain any digits",
        ));
    }
    if !symbol.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(SignalbotError::invalid_param(
            "symbol",
            "symbol must be alphabetic",
        ));
    }
    Ok(())
}

fn validate_positive_period(key: &str, value: usize) -> Result<(), SignalbotError> {
    if value == 0 {
        return Err(SignalbotError::invalid_param(
            key,
            format!("{key} must be positive"),
        ));
    }
    Ok(())
}

/// A sample standard deviation needs at least two bars.
fn validate_deviation_window(window: usize) -> Result<(), SignalbotError> {
    if window < 2 {
        return Err(SignalbotError::invalid_param(
            "window",
            "window must be at least 2 for a standard deviation",
        ));
    }
    Ok(())
}

fn validate_finite(key: &str, value: f64) -> Result<(), SignalbotError> {
    if !value.is_finite() {
        return Err(SignalbotError::invalid_param(
            key,
            format!("{key} must be a finite number"),
        ));
    }
    Ok(())
}

fn validate_non_negative(key: &str, value: f64) -> Result<(), SignalbotError> {
    validate_finite(key, value)?;
    if value < 0.0 {
        return Err(SignalbotError::invalid_param(
            key,
            format!("{key} must be non-negative"),
        ));
    }
    Ok(())
}

fn validate_fraction(key: &str, value: f64) -> Result<(), SignalbotError> {
    validate_finite(key, value)?;
    if value <= 0.0 || value > 1.0 {
        return Err(SignalbotError::invalid_param(
            key,
            format!("{key} must be in (0, 1]"),
        ));
    }
    Ok(())
}

fn validate_probability(key: &str, value: f64) -> Result<(), SignalbotError> {
    validate_finite(key, value)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(SignalbotError::invalid_param(
            key,
            format!("{key} must be between 0 and 1"),
        ));
    }
    Ok(())
}

fn validate_risk_tolerance(value: f64, order_kind: OrderKind) -> Result<(), SignalbotError> {
    validate_fraction("risk_tolerance", value)?;
    if order_kind == OrderKind::Bracket && value >= 1.0 {
        return Err(SignalbotError::invalid_param(
            "risk_tolerance",
            "risk_tolerance must be below 1 for bracket orders",
        ));
    }
    Ok(())
}

fn validate_rsi_thresholds(upper: f64, lower: f64) -> Result<(), SignalbotError> {
    for (key, value) in [("upper_threshold", upper), ("lower_threshold", lower)] {
        validate_finite(key, value)?;
        if !(0.0..=100.0).contains(&value) {
            return Err(SignalbotError::invalid_param(
                key,
                format!("{key} must be between 0 and 100"),
            ));
        }
    }
    if lower > upper {
        return Err(SignalbotError::invalid_param(
            "lower_threshold",
            "lower_threshold must not exceed upper_threshold",
        ));
    }
    Ok(())
}

fn read_period(config: &dyn ConfigPort, key: &str, default: usize) -> Result<usize, SignalbotError> {
    let Some(raw) = config.get_string(SECTION, key) else {
        return Ok(default);
    };
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| SignalbotError::invalid_param(key, format!("{key} must be an integer")))?;
    if value <= 0 {
        return Err(SignalbotError::invalid_param(
            key,
            format!("{key} must be positive"),
        ));
    }
    usize::try_from(value)
        .map_err(|_| SignalbotError::invalid_param(key, format!("{key} is too large")))
}

fn read_number(config: &dyn ConfigPort, key: &str, default: f64) -> Result<f64, SignalbotError> {
    let Some(raw) = config.get_string(SECTION, key) else {
        return Ok(default);
    };
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| SignalbotError::invalid_param(key, format!("{key} must be a number")))?;
    validate_finite(key, value)?;
    Ok(value)
}

fn read_parsed<T>(config: &dyn ConfigPort, key: &str, default: T) -> Result<T, SignalbotError>
where
    T: std::str::FromStr<Err = String>,
{
    match config.get_string(SECTION, key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|reason: String| SignalbotError::invalid_param(key, reason)),
    }
}
