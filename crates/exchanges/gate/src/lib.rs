//! Gate.io exchange adapter.
//!
//! Thin APIv4 REST client: builds and signs requests, then hands the raw
//! JSON to the payload parsers in `gatebridge-core`.

pub mod client;
pub mod config;
pub mod signing;

pub use client::{GateExchange, GateSession};
pub use config::GateConfig;
