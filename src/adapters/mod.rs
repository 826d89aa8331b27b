//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod file_config_adapter;
pub mod fixed_sentiment;
pub mod key_value_config;
pub mod sim_broker;
