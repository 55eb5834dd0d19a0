//! Scheduler status extraction (`GET /status` -> `ereb_status`).

use chrono::{DateTime, Utc};

use crate::collector::ereb::endpoint::Endpoint;
use crate::collector::ereb::extractor::ExtractorKind;
use crate::collector::ereb::model::SchedulerStatus;
use crate::collector::http::{FetchError, Fetcher};
use crate::sink::MetricRecord;

pub const STATUS_MEASUREMENT: &str = "ereb_status";

/// Fetch `/status` from `endpoint` and build its record.
///
/// A `null` document reads as an idle scheduler with no queue.
pub async fn extract_status(
    fetcher: &Fetcher,
    endpoint: &Endpoint,
) -> Result<MetricRecord, FetchError> {
    let status: Option<SchedulerStatus> = fetcher
        .get_json(&endpoint.url_for(ExtractorKind::Status.path()))
        .await?;
    let status = status.unwrap_or_default();

    tracing::trace!(
        endpoint = %endpoint,
        state = %status.state,
        queued = status.pending_task_count(),
        "Decoded scheduler status"
    );

    Ok(status_record(endpoint.host(), &status, Utc::now()))
}

/// Map a status document to one `ereb_status` record.
pub fn status_record(host: &str, status: &SchedulerStatus, timestamp: DateTime<Utc>) -> MetricRecord {
    let queue_length = i64::try_from(status.pending_task_count()).unwrap_or(i64::MAX);

    MetricRecord::new(STATUS_MEASUREMENT, timestamp)
        .with_tag("hostname", host)
        .with_field("running", i64::from(status.is_running()))
        .with_field("tasks_queue_length", queue_length)
        .with_field("next_run_in", status.next_run)
}
