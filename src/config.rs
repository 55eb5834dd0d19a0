//! Configuration module for the ereb collector.
//!
//! Provides YAML-based configuration loading and validation for:
//! - Polled servers (with `${VAR}` expansion) and the collection schedule
//! - HTTP timeouts
//! - Metric output (format, channel capacity, batching)

mod app;
mod validation;

pub use app::{AppConfig, OutputConfig};
pub use validation::{ConfigError, expand_servers, parse_duration};
