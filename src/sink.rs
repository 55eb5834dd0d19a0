//! Sink Layer
//!
//! Serializes metric emission from concurrent collection units through a
//! single writer thread:
//! - **Writer**: cloneable facade that enqueues records and errors via a bounded MPSC channel
//! - **Actor**: dedicated thread that batches records and drives a [`MetricOutput`]
//!
//! # Components
//!
//! - [`SinkWriter`]: Non-blocking write facade for records and reported errors
//! - [`SinkBuilder`] / [`SinkHandles`]: Initialization and lifecycle management
//! - [`LineProtocolOutput`] / [`JsonLinesOutput`] / [`MemoryOutput`]: Output encoders

mod actor;
mod builder;
mod error;
mod output;
mod types;
mod writer;

pub use actor::{DEFAULT_BATCH_FLUSH_INTERVAL, DEFAULT_BATCH_SIZE};
pub use builder::{DEFAULT_CHANNEL_CAPACITY, SinkBuilder, SinkHandles};
pub use error::SinkError;
pub use output::{
    JsonLinesOutput, LineProtocolOutput, MemoryOutput, MetricOutput, OutputFormat, encode_line,
};
pub use types::{FieldValue, Fields, MetricRecord, ReportedError, Tags};
pub use writer::SinkWriter;
