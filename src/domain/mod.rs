//! Core domain types and logic.

pub mod ohlcv;
pub mod signal;
pub mod order;
pub mod position;
pub mod portfolio;
pub mod execution;
pub mod indicator;
pub mod sizing;
pub mod params;
pub mod registry;
pub mod strategy;
pub mod backtest;
pub mod error;
