//! Per-task extraction (`GET /tasks` -> one `ereb_tasks` record per task).
//!
//! Exit-code history is ordered oldest first. `"None"` marks a run without
//! an exit code and is ignored by the consecutive-error scan.

use chrono::{DateTime, Utc};

use crate::collector::ereb::endpoint::Endpoint;
use crate::collector::ereb::extractor::ExtractorKind;
use crate::collector::ereb::model::TaskRecord;
use crate::collector::http::{FetchError, Fetcher};
use crate::sink::MetricRecord;

pub const TASKS_MEASUREMENT: &str = "ereb_tasks";

/// `last_exit_code` reported for a task that never ran.
pub const NO_HISTORY_EXIT_CODE: &str = "-1";

/// History entry of a run that produced no exit code.
pub const NO_EXIT_CODE: &str = "None";

/// Fetch `/tasks` from `endpoint` and build one record per task.
///
/// An empty or `null` document yields no records.
pub async fn extract_tasks(
    fetcher: &Fetcher,
    endpoint: &Endpoint,
) -> Result<Vec<MetricRecord>, FetchError> {
    let tasks: Option<Vec<TaskRecord>> = fetcher
        .get_json(&endpoint.url_for(ExtractorKind::Tasks.path()))
        .await?;
    let tasks = tasks.unwrap_or_default();
    let now = Utc::now();

    tracing::trace!(endpoint = %endpoint, count = tasks.len(), "Decoded task list");

    Ok(tasks
        .iter()
        .map(|task| task_record(endpoint.host(), task, now))
        .collect())
}

/// Map one task to its `ereb_tasks` record.
pub fn task_record(host: &str, task: &TaskRecord, timestamp: DateTime<Utc>) -> MetricRecord {
    let history = &task.stats.exit_codes;

    MetricRecord::new(TASKS_MEASUREMENT, timestamp)
        .with_tag("hostname", host)
        .with_tag("task_tag", task.name.as_str())
        .with_field("task_name", task.name.as_str())
        .with_field("enabled", task.enabled)
        .with_field("success_count", task.stats.success)
        .with_field("errors_count", task.stats.error)
        .with_field("avg_duration", task.stats.duration_avg)
        .with_field("max_duration", task.stats.duration_max)
        .with_field("min_duration", task.stats.duration_min)
        .with_field("timeout", parse_timeout(&task.timeout))
        .with_field("last_exit_code", last_exit_code(history))
        .with_field("last_errors_count", consecutive_errors(history))
}

/// Most recent history entry verbatim, or `"-1"` for an empty history.
pub fn last_exit_code(history: &[String]) -> &str {
    history.last().map_or(NO_HISTORY_EXIT_CODE, String::as_str)
}

/// Count of failed runs since the last success.
///
/// Scans oldest to newest skipping `"None"`: a zero exit code resets the
/// count, any other code increments it. Unparseable codes read as zero.
pub fn consecutive_errors(history: &[String]) -> i64 {
    history
        .iter()
        .filter(|code| code.as_str() != NO_EXIT_CODE)
        .fold(0, |count, code| {
            if parse_integer(code) == 0 {
                0
            } else {
                count + 1
            }
        })
}

/// Task timeout as an integer; non-numeric text reads as zero.
pub fn parse_timeout(raw: &str) -> i64 {
    parse_integer(raw)
}

fn parse_integer(raw: &str) -> i64 {
    raw.parse().unwrap_or(0)
}
