pub mod config;
pub mod discounts;
pub mod error;
pub mod telemetry;
