//! Writer actor with a dedicated thread and MPSC channel.
//!
//! Single-writer pattern: one thread owns the output, processes commands via MPSC.
//! Records are batch buffered: flushed when the buffer reaches the batch size or
//! the flush interval elapses. Reported errors are delivered immediately.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::sink::SinkError;
use crate::sink::output::MetricOutput;
use crate::sink::types::{MetricRecord, ReportedError};

// =============================================================================
// Constants
// =============================================================================

/// Default maximum records in buffer before flush.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Default maximum time before buffer flush.
pub const DEFAULT_BATCH_FLUSH_INTERVAL: Duration = Duration::from_secs(1);

/// Idle wake-up when nothing is buffered.
const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

// =============================================================================
// Commands
// =============================================================================

/// Commands sent to the writer actor.
#[derive(Debug)]
pub enum Command {
    /// Append a metric record (batched).
    Record(MetricRecord),
    /// Deliver a reported error (immediate).
    Error(ReportedError),
    /// Force flush of buffered records.
    Flush,
    /// Graceful shutdown.
    Shutdown,
}

// =============================================================================
// Buffer
// =============================================================================

/// Buffer for batch writes with time-based and size-based flushing.
struct BatchBuffer<T> {
    items: Vec<T>,
    last_flush: Instant,
    batch_size: usize,
    flush_interval: Duration,
}

impl<T> BatchBuffer<T> {
    fn new(batch_size: usize, flush_interval: Duration) -> Self {
        Self {
            items: Vec::with_capacity(batch_size),
            last_flush: Instant::now(),
            batch_size,
            flush_interval,
        }
    }

    fn push(&mut self, item: T) {
        // Reset flush timer on first item to avoid treating long-idle buffers as overdue
        if self.items.is_empty() {
            self.last_flush = Instant::now();
        }
        self.items.push(item);
    }

    fn should_flush(&self) -> bool {
        self.items.len() >= self.batch_size
            || (!self.items.is_empty() && self.last_flush.elapsed() >= self.flush_interval)
    }

    fn deadline(&self) -> Option<Instant> {
        (!self.items.is_empty()).then(|| self.last_flush + self.flush_interval)
    }

    fn take(&mut self) -> Vec<T> {
        self.last_flush = Instant::now();
        std::mem::take(&mut self.items)
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// Actor
// =============================================================================

/// Sink writer actor.
pub struct SinkActor {
    output: Box<dyn MetricOutput>,
    rx: Receiver<Command>,
    buffer: BatchBuffer<MetricRecord>,
}

impl SinkActor {
    /// Spawn the writer actor thread.
    ///
    /// Returns the thread handle and the channel sender for commands.
    pub fn spawn(
        output: Box<dyn MetricOutput>,
        channel_capacity: usize,
        batch_size: usize,
        batch_flush_interval: Duration,
    ) -> Result<(JoinHandle<()>, SyncSender<Command>), SinkError> {
        let (tx, rx) = mpsc::sync_channel(channel_capacity);

        let mut actor = SinkActor {
            output,
            rx,
            buffer: BatchBuffer::new(batch_size.max(1), batch_flush_interval),
        };
        let handle = thread::Builder::new()
            .name("ereb-sink".to_string())
            .spawn(move || actor.run())
            .map_err(|e| SinkError::Internal(format!("failed to spawn sink thread: {e}")))?;

        Ok((handle, tx))
    }

    fn run(&mut self) {
        tracing::debug!("SinkActor started");

        loop {
            let now = Instant::now();
            let deadline = self.buffer.deadline().unwrap_or(now + IDLE_TIMEOUT);
            let timeout = deadline.saturating_duration_since(now);

            match self.rx.recv_timeout(timeout) {
                Ok(cmd) => {
                    if self.handle_command(cmd) {
                        break; // Shutdown requested
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    // Timeout: flush overdue
                }
                Err(RecvTimeoutError::Disconnected) => {
                    tracing::debug!("Channel disconnected, shutting down");
                    self.flush_all();
                    break;
                }
            }

            if self.buffer.should_flush() {
                self.flush_all();
            }
        }

        tracing::debug!("SinkActor stopped");
    }

    fn handle_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Record(record) => {
                self.buffer.push(record);
            }
            Command::Error(error) => {
                if let Err(e) = self.output.write_error(&error) {
                    tracing::error!(error = %e, "Reported error delivery failed");
                }
            }
            Command::Flush => {
                self.flush_all();
            }
            Command::Shutdown => {
                tracing::debug!("SinkActor shutting down");
                self.flush_all();
                return true;
            }
        }
        false
    }

    fn flush_all(&mut self) {
        if !self.buffer.is_empty() {
            let records = self.buffer.take();
            if let Err(e) = self.output.write_records(&records) {
                tracing::error!(error = %e, count = records.len(), "Record batch write failed");
            }
        }
        if let Err(e) = self.output.flush() {
            tracing::error!(error = %e, "Output flush failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::output::MemoryOutput;
    use chrono::Utc;

    fn record(name: &str) -> MetricRecord {
        MetricRecord::new(name, Utc::now()).with_field("value", 1i64)
    }

    #[test]
    fn test_actor_lifecycle() {
        let (handle, tx) =
            SinkActor::spawn(Box::new(MemoryOutput::new()), 10, 10, Duration::from_secs(1))
                .unwrap();
        tx.send(Command::Shutdown).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_records_flushed_on_shutdown() {
        let capture = MemoryOutput::new();
        let (handle, tx) =
            SinkActor::spawn(Box::new(capture.clone()), 100, 100, Duration::from_secs(60))
                .unwrap();

        tx.send(Command::Record(record("a"))).unwrap();
        tx.send(Command::Record(record("b"))).unwrap();
        tx.send(Command::Shutdown).unwrap();
        handle.join().unwrap();

        let names: Vec<String> = capture.records().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_batch_size_triggers_flush() {
        let capture = MemoryOutput::new();
        let (handle, tx) =
            SinkActor::spawn(Box::new(capture.clone()), 100, 2, Duration::from_secs(60)).unwrap();

        tx.send(Command::Record(record("a"))).unwrap();
        tx.send(Command::Record(record("b"))).unwrap();

        // Size threshold reached: the batch is written without an explicit flush
        let deadline = Instant::now() + Duration::from_secs(5);
        while capture.records().len() < 2 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(capture.records().len(), 2);

        tx.send(Command::Shutdown).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_errors_delivered_immediately() {
        let capture = MemoryOutput::new();
        let (handle, tx) =
            SinkActor::spawn(Box::new(capture.clone()), 100, 100, Duration::from_secs(60))
                .unwrap();

        tx.send(Command::Error(ReportedError::new("ereb.status", "h:1", "down")))
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while capture.errors().is_empty() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(capture.errors().len(), 1);

        tx.send(Command::Shutdown).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_disconnect_flushes_buffer() {
        let capture = MemoryOutput::new();
        let (handle, tx) =
            SinkActor::spawn(Box::new(capture.clone()), 100, 100, Duration::from_secs(60))
                .unwrap();

        tx.send(Command::Record(record("orphan"))).unwrap();
        drop(tx);
        handle.join().unwrap();

        assert_eq!(capture.records().len(), 1);
    }
}
