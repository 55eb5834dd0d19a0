//! Wire documents served by an ereb scheduler.
//!
//! Decoding is lenient about absent or `null` scalars (they read as zero
//! values) but strict about structure: a wrong JSON type is a decode error.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// State value reported by an active scheduler.
pub const RUNNING_STATE: &str = "running";

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(D::Error::custom(format!(
            "expected string or number, found {other}"
        ))),
    }
}

/// `GET /status` document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SchedulerStatus {
    /// Scheduler state; only `"running"` means active.
    #[serde(deserialize_with = "null_as_default")]
    pub state: String,
    /// Seconds until the next planned run.
    #[serde(deserialize_with = "null_as_default")]
    pub next_run: f64,
    /// Tasks queued for the next run.
    #[serde(deserialize_with = "null_as_default")]
    pub next_tasks: Vec<Value>,
    /// Identifiers of planned task runs.
    #[serde(deserialize_with = "null_as_default")]
    pub planned_task_run_uuids: Vec<String>,
}

impl SchedulerStatus {
    pub fn is_running(&self) -> bool {
        self.state == RUNNING_STATE
    }

    pub fn pending_task_count(&self) -> usize {
        self.next_tasks.len()
    }
}

/// One entry of the `GET /tasks` document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TaskRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub task_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub enabled: bool,
    /// Timeout as served (numeric text).
    #[serde(deserialize_with = "text_or_number")]
    pub timeout: String,
    #[serde(deserialize_with = "null_as_default")]
    pub cron_schedule: String,
    #[serde(deserialize_with = "null_as_default")]
    pub group: String,
    #[serde(deserialize_with = "null_as_default")]
    pub stats: TaskStats,
}

/// Execution statistics of one task.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TaskStats {
    /// Lifetime successful runs.
    #[serde(deserialize_with = "null_as_default")]
    pub success: i64,
    /// Lifetime failed runs.
    #[serde(deserialize_with = "null_as_default")]
    pub error: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub duration_avg: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub duration_max: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub duration_min: i64,
    /// Exit codes oldest first; decimal text or `"None"`.
    #[serde(deserialize_with = "null_as_default")]
    pub exit_codes: Vec<String>,
}
