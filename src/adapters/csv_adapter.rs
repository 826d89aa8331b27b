//! CSV price file adapter.
//!
//! Columns: `timestamp,open,high,low,close[,volume]`, with a header row. The
//! timestamp is either a date (`2024-01-15`) or a datetime
//! (`2024-01-15 09:30:00`, `2024-01-15T09:30:00`).

use crate::domain::error::SignalbotError;
use crate::domain::ohlcv::{PriceBar, PriceWindow};
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Read every row as a bar of `symbol`, oldest first.
    pub fn load(&self, symbol: &str) -> Result<PriceWindow, SignalbotError> {
        let content = fs::read_to_string(&self.path).map_err(|e| SignalbotError::Data {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for (row, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| SignalbotError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;
            let line = row + 2;

            let timestamp = parse_timestamp(field(&record, 0, "timestamp", line)?).ok_or_else(
                || SignalbotError::Data {
                    reason: format!("line {line}: invalid timestamp"),
                },
            )?;

            let volume = match record.get(5).filter(|v| !v.is_empty()) {
                None => None,
                Some(raw) => Some(raw.parse::<i64>().map_err(|e| SignalbotError::Data {
                    reason: format!("line {line}: invalid volume value: {e}"),
                })?),
            };

            bars.push(PriceBar {
                symbol: symbol.to_string(),
                timestamp,
                open: price(&record, 1, "open", line)?,
                high: price(&record, 2, "high", line)?,
                low: price(&record, 3, "low", line)?,
                close: price(&record, 4, "close", line)?,
                volume,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        PriceWindow::new(bars)
    }
}

fn field<'r>(
    record: &'r csv::StringRecord,
    index: usize,
    name: &str,
    line: usize,
) -> Result<&'r str, SignalbotError> {
    record.get(index).ok_or_else(|| SignalbotError::Data {
        reason: format!("line {line}: missing {name} column"),
    })
}

fn price(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
    line: usize,
) -> Result<f64, SignalbotError> {
    let value: f64 = field(record, index, name, line)?
        .parse()
        .map_err(|e| SignalbotError::Data {
            reason: format!("line {line}: invalid {name} value: {e}"),
        })?;
    if !value.is_finite() || value <= 0.0 {
        return Err(SignalbotError::Data {
            reason: format!("line {line}: {name} must be a positive price"),
        });
    }
    Ok(value)
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_csv(content: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prices.csv");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn load_returns_correct_data() {
        let (_dir, path) = write_csv(
            "date,open,high,low,close,volume\n\
             2024-01-15,100.0,110.0,90.0,105.0,50000\n\
             2024-01-16,105.0,115.0,100.0,110.0,60000\n\
             2024-01-17,110.0,120.0,105.0,115.0,55000\n",
        );
        let window = CsvAdapter::new(path).load("BHP").unwrap();

        assert_eq!(window.len(), 3);
        let first = &window.bars()[0];
        assert_eq!(first.symbol, "BHP");
        assert_eq!(
            first.timestamp,
            NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
        assert_eq!(first.open, 100.0);
        assert_eq!(first.high, 110.0);
        assert_eq!(first.low, 90.0);
        assert_eq!(first.close, 105.0);
        assert_eq!(first.volume, Some(50000));
    }

    #[test]
    fn rows_are_sorted_and_volume_optional() {
        let (_dir, path) = write_csv(
            "timestamp,open,high,low,close\n\
             2024-01-16 10:00:00,2,2,2,2\n\
             2024-01-16T09:00:00,1,1,1,1\n",
        );
        let window = CsvAdapter::new(path).load("SPY").unwrap();
        let closes: Vec<f64> = window.bars().iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![1.0, 2.0]);
        assert_eq!(window.bars()[0].volume, None);
    }

    #[test]
    fn duplicate_timestamps_rejected() {
        let (_dir, path) = write_csv(
            "date,open,high,low,close\n\
             2024-01-15,1,1,1,1\n\
             2024-01-15,2,2,2,2\n",
        );
        assert!(matches!(
            CsvAdapter::new(path).load("SPY"),
            Err(SignalbotError::Data { .. })
        ));
    }

    #[test]
    fn invalid_values_rejected() {
        for row in [
            "15/01/2024,1,1,1,1",
            "2024-01-15,abc,1,1,1",
            "2024-01-15,1,1,1,0",
            "2024-01-15,1,1,1",
        ] {
            let (_dir, path) = write_csv(&format!("date,open,high,low,close\n{row}\n"));
            assert!(CsvAdapter::new(path).load("SPY").is_err(), "{row}");
        }
    }

    #[test]
    fn missing_file_is_data_error() {
        let result = CsvAdapter::new(PathBuf::from("/nonexistent/prices.csv")).load("SPY");
        assert!(matches!(result, Err(SignalbotError::Data { .. })));
    }

    #[test]
    fn header_only_file_is_empty() {
        let (_dir, path) = write_csv("date,open,high,low,close,volume\n");
        assert!(CsvAdapter::new(path).load("SPY").unwrap().is_empty());
    }
}
