//! Domain error types.

/// Top-level error type for signalbot.
#[derive(Debug, thiserror::Error)]
pub enum SignalbotError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("unknown strategy '{name}' (known: {known})")]
    UnknownStrategy { name: String, known: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("broker error: {reason}")]
    Broker { reason: String },

    /// The broker declined one order; the account is unchanged.
    #[error("order rejected: {reason}")]
    OrderRejected { reason: String },

    #[error("sentiment error: {reason}")]
    Sentiment { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SignalbotError {
    /// Shorthand for a `[strategy]` section validation failure.
    pub fn invalid_param(key: &str, reason: impl Into<String>) -> Self {
        SignalbotError::ConfigInvalid {
            section: "strategy".to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&SignalbotError> for std::process::ExitCode {
    fn from(err: &SignalbotError) -> Self {
        let code: u8 = match err {
            SignalbotError::Io(_) => 1,
            SignalbotError::ConfigParse { .. }
            | SignalbotError::ConfigMissing { .. }
            | SignalbotError::ConfigInvalid { .. }
            | SignalbotError::UnknownStrategy { .. } => 2,
            SignalbotError::Data { .. } => 3,
            SignalbotError::Broker { .. }
            | SignalbotError::OrderRejected { .. }
            | SignalbotError::Sentiment { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}

/// Recoverable conditions raised while sizing an order.
///
/// These are reported and turn the tick into a no-op; they never abort a strategy.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SizingIssue {
    #[error("last price is not usable: {price}")]
    InvalidPrice { price: f64 },

    #[error("insufficient cash available for trading: {cash}")]
    InsufficientCash { cash: f64 },

    #[error("calculated quantity {cash} * {cash_at_risk} / {price} = {raw:.2} rounds to zero")]
    NonPositiveQuantity {
        cash: f64,
        cash_at_risk: f64,
        price: f64,
        raw: f64,
    },

    #[error("degenerate bracket: reference price {reference_price}, risk tolerance {risk_tolerance}")]
    DegenerateBracket {
        reference_price: f64,
        risk_tolerance: f64,
    },
}
