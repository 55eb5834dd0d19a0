//! Collector Layer
//!
//! Scheduled collectors that hand metrics to the sink. Each cycle of a
//! collector runs as a Tokio task.
//!
//! # Architecture
//!
//! - [`Collector`]: Core trait for implementing data collectors
//! - [`Schedule`]: Execution schedule (interval or cron)
//! - [`CollectorRegistry`]: Manages collector lifecycle and graceful shutdown
//! - [`ErebCollector`]: Polls ereb schedulers for status and task statistics
//!
//! # Example
//!
//! ```rust,no_run
//! use ereb_collector::{Collector, ErebCollector, ErebConfig, MemoryOutput, SinkBuilder};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let handles = SinkBuilder::new(MemoryOutput::new()).build()?;
//! let config = ErebConfig::new(["http://ereb-1:8888", "http://ereb-2:8888"]);
//! let collector = ErebCollector::new(config, handles.writer.clone());
//! let summary = collector.collect().await?;
//! println!("{} records, {} failed units", summary.records, summary.errors);
//! # Ok(())
//! # }
//! ```

pub mod ereb;
pub mod http;
mod registry;
mod traits;

pub use ereb::{ErebCollector, ErebConfig};
pub use registry::{CollectorRegistry, DEFAULT_SHUTDOWN_TIMEOUT, JobInfo, run_collection};
pub use traits::{Collector, CollectorError, CycleSummary, MIN_INTERVAL, Schedule};
