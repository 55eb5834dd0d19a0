//! Output encoders driven by the sink actor.
//!
//! - [`LineProtocolOutput`]: InfluxDB line protocol, one line per record
//! - [`JsonLinesOutput`]: one JSON object per record
//! - [`MemoryOutput`]: shared in-memory capture for embedding and tests

use std::fmt::Write as _;
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::sink::SinkError;
use crate::sink::types::{FieldValue, MetricRecord, ReportedError};

/// Output encoding selected by configuration.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum OutputFormat {
    /// InfluxDB line protocol.
    #[default]
    Line,
    /// Newline-delimited JSON.
    Json,
}

impl OutputFormat {
    /// Build a boxed output of this format over a byte stream.
    pub fn into_output<W: Write + Send + 'static>(self, writer: W) -> Box<dyn MetricOutput> {
        match self {
            Self::Line => Box::new(LineProtocolOutput::new(writer)),
            Self::Json => Box::new(JsonLinesOutput::new(writer)),
        }
    }
}

/// Destination for records and reported errors.
///
/// Implementations are owned by the single writer thread and never shared,
/// so they need `Send` but not `Sync`. The sink itself requires `'static`.
pub trait MetricOutput: Send {
    /// Write a batch of records.
    fn write_records(&mut self, records: &[MetricRecord]) -> Result<(), SinkError>;

    /// Deliver a reported error.
    fn write_error(&mut self, error: &ReportedError) -> Result<(), SinkError>;

    /// Flush any buffered bytes.
    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl MetricOutput for Box<dyn MetricOutput> {
    fn write_records(&mut self, records: &[MetricRecord]) -> Result<(), SinkError> {
        (**self).write_records(records)
    }

    fn write_error(&mut self, error: &ReportedError) -> Result<(), SinkError> {
        (**self).write_error(error)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        (**self).flush()
    }
}

fn log_reported_error(error: &ReportedError) {
    tracing::error!(
        source = %error.source,
        endpoint = %error.endpoint,
        "{}",
        error.message
    );
}

// =============================================================================
// Line protocol
// =============================================================================

/// InfluxDB line protocol writer.
///
/// Reported errors are not part of the metric stream; they go to the log.
pub struct LineProtocolOutput<W> {
    writer: W,
}

impl<W: Write + Send> LineProtocolOutput<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write + Send> MetricOutput for LineProtocolOutput<W> {
    fn write_records(&mut self, records: &[MetricRecord]) -> Result<(), SinkError> {
        for record in records {
            match encode_line(record) {
                Some(line) => writeln!(self.writer, "{line}")?,
                None => tracing::debug!(name = %record.name, "Record has no encodable fields"),
            }
        }
        Ok(())
    }

    fn write_error(&mut self, error: &ReportedError) -> Result<(), SinkError> {
        log_reported_error(error);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Encode one record as a line-protocol line.
///
/// Tags with empty values and non-finite floats cannot be represented and are
/// omitted. Returns `None` when no field survives.
pub fn encode_line(record: &MetricRecord) -> Option<String> {
    let mut line = escape(&record.name, &[',', ' ']);

    for (key, value) in &record.tags {
        if key.is_empty() || value.is_empty() {
            continue;
        }
        let _ = write!(
            line,
            ",{}={}",
            escape(key, &[',', '=', ' ']),
            escape(value, &[',', '=', ' '])
        );
    }

    let mut fields = Vec::with_capacity(record.fields.len());
    for (key, value) in &record.fields {
        let encoded = match value {
            FieldValue::Int(v) => format!("{v}i"),
            FieldValue::Float(v) if v.is_finite() => format!("{v}"),
            FieldValue::Float(_) => continue,
            FieldValue::Bool(v) => v.to_string(),
            FieldValue::Str(v) => format!("\"{}\"", escape(v, &['\\', '"'])),
        };
        fields.push(format!("{}={}", escape(key, &[',', '=', ' ']), encoded));
    }
    if fields.is_empty() {
        return None;
    }

    let ts = record.timestamp.timestamp_nanos_opt().unwrap_or_default();
    let _ = write!(line, " {} {}", fields.join(","), ts);
    Some(line)
}

/// Backslash-escape `special`; line breaks are always written as `\n`/`\r`
/// so a value can never end the record early.
fn escape(input: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c if special.contains(&c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

// =============================================================================
// JSON lines
// =============================================================================

/// Newline-delimited JSON writer.
pub struct JsonLinesOutput<W> {
    writer: W,
}

impl<W: Write + Send> JsonLinesOutput<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write + Send> MetricOutput for JsonLinesOutput<W> {
    fn write_records(&mut self, records: &[MetricRecord]) -> Result<(), SinkError> {
        for record in records {
            serde_json::to_writer(&mut self.writer, record)?;
            self.writer.write_all(b"\n")?;
        }
        Ok(())
    }

    fn write_error(&mut self, error: &ReportedError) -> Result<(), SinkError> {
        log_reported_error(error);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

// =============================================================================
// Memory
// =============================================================================

#[derive(Debug, Default)]
struct MemoryContents {
    records: Vec<MetricRecord>,
    errors: Vec<ReportedError>,
}

/// In-memory capture of everything the sink received.
///
/// Clones share the same buffer, so a clone can be inspected after the
/// original has been moved into the sink.
#[derive(Debug, Clone, Default)]
pub struct MemoryOutput {
    inner: Arc<Mutex<MemoryContents>>,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryContents> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of all records received so far.
    pub fn records(&self) -> Vec<MetricRecord> {
        self.lock().records.clone()
    }

    /// Records of one measurement.
    pub fn records_named(&self, name: &str) -> Vec<MetricRecord> {
        self.lock()
            .records
            .iter()
            .filter(|r| r.name == name)
            .cloned()
            .collect()
    }

    /// Snapshot of all reported errors received so far.
    pub fn errors(&self) -> Vec<ReportedError> {
        self.lock().errors.clone()
    }
}

impl MetricOutput for MemoryOutput {
    fn write_records(&mut self, records: &[MetricRecord]) -> Result<(), SinkError> {
        self.lock().records.extend_from_slice(records);
        Ok(())
    }

    fn write_error(&mut self, error: &ReportedError) -> Result<(), SinkError> {
        self.lock().errors.push(error.clone());
        Ok(())
    }
}
