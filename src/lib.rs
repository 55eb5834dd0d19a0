//! ereb-collector - Metrics for ereb job schedulers
//!
//! Polls one or more ereb scheduler instances over HTTP and turns their
//! status and per-task statistics into metric records. The crate can be
//! embedded as a library or run as the standalone `ereb-collector` binary.
//!
//! # Architecture
//!
//! - **Collector**: concurrent fan-out over every (endpoint, extractor) pair
//!   per cycle, with per-unit error isolation
//! - **Sink**: single writer thread that batches records and encodes them as
//!   line protocol or JSON lines
//! - **Config**: YAML configuration with environment expansion
//!
//! # Example
//!
//! ```rust,no_run
//! use ereb_collector::{Collector, ErebCollector, ErebConfig, OutputFormat, SinkBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let output = OutputFormat::Line.into_output(std::io::stdout());
//!     let handles = SinkBuilder::new(output).build()?;
//!
//!     let collector = ErebCollector::new(
//!         ErebConfig::new(["http://ereb:8888"]),
//!         handles.writer.clone(),
//!     );
//!     collector.collect().await?;
//!
//!     handles.shutdown()?;
//!     Ok(())
//! }
//! ```

pub mod collector;
pub mod config;
pub mod sink;

pub use collector::{
    Collector, CollectorError, CollectorRegistry, CycleSummary, ErebCollector, ErebConfig,
    Schedule,
};
pub use collector::http::{FetchError, Fetcher, FetcherConfig};
pub use config::{AppConfig, ConfigError};
pub use sink::{
    MemoryOutput, MetricOutput, MetricRecord, OutputFormat, ReportedError, SinkBuilder,
    SinkError, SinkHandles, SinkWriter,
};
