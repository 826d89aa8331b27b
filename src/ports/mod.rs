//! Port traits the domain talks to its collaborators through.

pub mod broker_port;
pub mod config_port;
pub mod sentiment_port;
