//! Sink builder and handles.
//!
//! Provides a builder pattern for constructing the sink layer
//! and a handles struct for writing and graceful shutdown.

use std::thread::JoinHandle;
use std::time::Duration;

use crate::sink::actor::{DEFAULT_BATCH_FLUSH_INTERVAL, DEFAULT_BATCH_SIZE, SinkActor};
use crate::sink::output::MetricOutput;
use crate::sink::{SinkError, SinkWriter};

/// Default channel capacity for writer commands.
///
/// Sized for several thousand tasks per cycle across a handful of servers.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 10_000;

/// Builder for constructing the sink layer.
pub struct SinkBuilder {
    output: Box<dyn MetricOutput>,
    channel_capacity: usize,
    batch_size: usize,
    batch_flush_interval: Duration,
}

impl SinkBuilder {
    /// Create a new sink builder writing to `output`.
    pub fn new(output: impl MetricOutput + 'static) -> Self {
        Self {
            output: Box::new(output),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_flush_interval: DEFAULT_BATCH_FLUSH_INTERVAL,
        }
    }

    /// Set the channel capacity for writer commands.
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Set the batch size for record buffering.
    ///
    /// The actor writes buffered records when this threshold is reached.
    /// Default: 500 records.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Set the batch flush interval for record buffering.
    ///
    /// The actor writes buffered records after this duration, even if the
    /// batch size threshold hasn't been reached. Default: 1 second.
    pub fn batch_flush_interval(mut self, interval: Duration) -> Self {
        self.batch_flush_interval = interval;
        self
    }

    /// Build the sink layer and return handles.
    pub fn build(self) -> Result<SinkHandles, SinkError> {
        if self.channel_capacity == 0 {
            return Err(SinkError::Internal(
                "channel capacity must be positive".to_string(),
            ));
        }

        let (actor_handle, tx) = SinkActor::spawn(
            self.output,
            self.channel_capacity,
            self.batch_size,
            self.batch_flush_interval,
        )?;

        Ok(SinkHandles {
            writer: SinkWriter::new(tx),
            actor_handle: Some(actor_handle),
        })
    }
}

/// Handles to the sink layer.
pub struct SinkHandles {
    /// Writer facade for records and reported errors.
    pub writer: SinkWriter,
    /// Internal actor handle for graceful shutdown.
    actor_handle: Option<JoinHandle<()>>,
}

impl SinkHandles {
    /// Gracefully shutdown the sink.
    ///
    /// Sends shutdown command to the writer actor and waits for it to flush
    /// and finish.
    pub fn shutdown(mut self) -> Result<(), SinkError> {
        self.writer.shutdown()?;

        if let Some(handle) = self.actor_handle.take() {
            handle
                .join()
                .map_err(|_| SinkError::Internal("Failed to join sink thread".to_string()))?;
        }

        Ok(())
    }
}

impl Drop for SinkHandles {
    fn drop(&mut self) {
        // Try graceful shutdown if not already done
        if self.actor_handle.is_some() {
            let _ = self.writer.shutdown();
            if let Some(handle) = self.actor_handle.take() {
                let _ = handle.join();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::output::{MemoryOutput, OutputFormat};
    use crate::sink::types::{MetricRecord, ReportedError};
    use chrono::Utc;

    #[test]
    fn test_sink_roundtrip() {
        let capture = MemoryOutput::new();
        let handles = SinkBuilder::new(capture.clone())
            .channel_capacity(100)
            .batch_size(10)
            .build()
            .unwrap();

        for i in 0..5i64 {
            let record = MetricRecord::new("ereb_tasks", Utc::now()).with_field("timeout", i);
            handles.writer.add_record(record).unwrap();
        }
        handles
            .writer
            .add_error(ReportedError::new("ereb.tasks", "h:1", "http 500"))
            .unwrap();
        handles.shutdown().unwrap();

        assert_eq!(capture.records().len(), 5);
        assert_eq!(capture.errors().len(), 1);
    }

    #[test]
    fn test_drop_flushes() {
        let capture = MemoryOutput::new();
        {
            let handles = SinkBuilder::new(capture.clone()).build().unwrap();
            handles
                .writer
                .add_record(MetricRecord::new("ereb_status", Utc::now()).with_field("running", 1i64))
                .unwrap();
        }
        assert_eq!(capture.records().len(), 1);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let result = SinkBuilder::new(MemoryOutput::new())
            .channel_capacity(0)
            .build();
        assert!(matches!(result, Err(SinkError::Internal(_))));
    }

    #[test]
    fn test_boxed_stream_output() {
        let output = OutputFormat::Json.into_output(std::io::sink());
        let handles = SinkBuilder::new(output).build().unwrap();
        handles
            .writer
            .add_record(MetricRecord::new("ereb_status", Utc::now()).with_field("running", 0i64))
            .unwrap();
        handles.shutdown().unwrap();
    }
}
