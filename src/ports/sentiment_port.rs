//! News sentiment port trait.

use chrono::NaiveDateTime;

use crate::domain::error::SignalbotError;
use crate::domain::signal::SentimentReading;

pub trait SentimentPort {
    fn estimate(&self, symbol: &str, at: NaiveDateTime) -> Result<SentimentReading, SignalbotError>;
}
