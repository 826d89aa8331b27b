//! Price bar and price window representation.

use chrono::NaiveDateTime;

use super::error::SignalbotError;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub symbol: String,
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<i64>,
}

impl PriceBar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// An ordered, read-only run of bars handed to one evaluation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceWindow {
    bars: Vec<PriceBar>,
}

impl PriceWindow {
    /// Timestamps must be strictly ascending.
    pub fn new(bars: Vec<PriceBar>) -> Result<Self, SignalbotError> {
        if let Some(pair) = bars
            .windows(2)
            .find(|pair| pair[1].timestamp <= pair[0].timestamp)
        {
            return Err(SignalbotError::Data {
                reason: format!(
                    "bars out of order or duplicated at {} (after {})",
                    pair[1].timestamp, pair[0].timestamp
                ),
            });
        }
        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }
}
