//! Non-blocking write facade over the sink actor channel.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::SyncSender;

use chrono::{DateTime, Utc};

use crate::sink::SinkError;
use crate::sink::actor::Command;
use crate::sink::types::{Fields, MetricRecord, ReportedError, Tags};

/// Non-blocking sink writer.
///
/// Uses `try_send`: data is dropped if the channel is full. Clones share the
/// same channel and dropped-write counter, so any number of collection units
/// may write concurrently.
#[derive(Clone)]
pub struct SinkWriter {
    tx: SyncSender<Command>,
    dropped: Arc<AtomicU64>,
}

impl std::fmt::Debug for SinkWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkWriter")
            .field("dropped", &self.dropped())
            .finish_non_exhaustive()
    }
}

impl SinkWriter {
    pub(crate) fn new(tx: SyncSender<Command>) -> Self {
        Self {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Total count of writes dropped because the channel was full or closed.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Queue a metric record.
    pub fn add_record(&self, record: MetricRecord) -> Result<(), SinkError> {
        if self.tx.try_send(Command::Record(record)).is_err() {
            tracing::warn!("Channel full, dropping metric record");
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return Err(SinkError::ChannelSend);
        }
        Ok(())
    }

    /// Queue a measurement given as its parts.
    pub fn add_fields(
        &self,
        name: impl Into<String>,
        tags: Tags,
        fields: Fields,
        timestamp: DateTime<Utc>,
    ) -> Result<(), SinkError> {
        self.add_record(MetricRecord {
            name: name.into(),
            tags,
            fields,
            timestamp,
        })
    }

    /// Report a non-fatal collection error.
    pub fn add_error(&self, error: ReportedError) -> Result<(), SinkError> {
        if self.tx.try_send(Command::Error(error)).is_err() {
            tracing::warn!("Channel full, dropping reported error");
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return Err(SinkError::ChannelSend);
        }
        Ok(())
    }

    /// Force flush of buffered records.
    pub fn flush(&self) -> Result<(), SinkError> {
        self.tx
            .try_send(Command::Flush)
            .map_err(|_| SinkError::ChannelSend)
    }

    /// Request actor shutdown. Blocks while the channel is full.
    pub(crate) fn shutdown(&self) -> Result<(), SinkError> {
        self.tx
            .send(Command::Shutdown)
            .map_err(|_| SinkError::ChannelSend)
    }
}
