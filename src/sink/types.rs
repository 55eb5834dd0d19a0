//! Core data types for the sink layer.
//!
//! - [`MetricRecord`]: One timestamped measurement with identity tags and payload fields
//! - [`FieldValue`]: Typed field payload (integer, float, boolean, string)
//! - [`ReportedError`]: Non-fatal failure of one collection unit

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Identity tags (e.g., `hostname`, `task_tag`). Sorted for stable output.
pub type Tags = BTreeMap<String, String>;

/// Payload fields keyed by field name.
pub type Fields = BTreeMap<String, FieldValue>;

/// A typed metric field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl FieldValue {
    /// Integer payload, if this is an integer field.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Float payload, if this is a float field.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Boolean payload, if this is a boolean field.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// String payload, if this is a string field.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

/// A metric record handed to the sink.
///
/// Tags carry identity, fields carry payload. Serializes as
/// `{"name", "tags", "fields", "timestamp"}` with the timestamp in unix seconds.
///
/// # Example
///
/// ```
/// use ereb_collector::MetricRecord;
/// use chrono::Utc;
///
/// let record = MetricRecord::new("ereb_status", Utc::now())
///     .with_tag("hostname", "localhost:8888")
///     .with_field("running", 1i64);
/// assert_eq!(record.tag("hostname"), Some("localhost:8888"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRecord {
    /// Measurement name (e.g., "ereb_tasks").
    pub name: String,
    /// Identity tags.
    pub tags: Tags,
    /// Payload fields.
    pub fields: Fields,
    /// Collection timestamp (UTC).
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
}

impl MetricRecord {
    /// Create an empty record for a measurement.
    pub fn new(name: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            tags: Tags::new(),
            fields: Fields::new(),
            timestamp,
        }
    }

    /// Add a tag.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Add a field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Look up a tag value.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Look up a field value.
    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }
}

/// A non-fatal error raised by one collection unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportedError {
    /// When the failure was observed (UTC).
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
    /// Origin of the failure (e.g., "ereb.tasks").
    pub source: String,
    /// Endpoint the unit was polling, without credentials.
    pub endpoint: String,
    /// Human-readable description.
    pub message: String,
}

impl ReportedError {
    /// Create a new error record stamped with the current time.
    pub fn new(
        source: impl Into<String>,
        endpoint: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            source: source.into(),
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ReportedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.source, self.endpoint, self.message)
    }
}
