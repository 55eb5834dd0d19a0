//! ereb scheduler collector.
//!
//! Every cycle polls `GET {server}/status` and `GET {server}/tasks` on each
//! configured server and emits:
//!
//! - `ereb_status`: `running`, `tasks_queue_length`, `next_run_in`
//! - `ereb_tasks`: one record per task, including `last_errors_count`
//!   (failed runs since the last success)
//!
//! Both measurements are tagged with `hostname` (`host[:port]`); task records
//! also carry `task_tag`.

mod collector;
mod endpoint;
mod extractor;
mod model;
mod status;
mod tasks;

pub use collector::{DEFAULT_INTERVAL, ErebCollector, ErebConfig};
pub use endpoint::{DEFAULT_SERVER, Endpoint, has_http_scheme, normalize_endpoints};
pub use extractor::ExtractorKind;
pub use model::{RUNNING_STATE, SchedulerStatus, TaskRecord, TaskStats};
pub use status::{STATUS_MEASUREMENT, extract_status, status_record};
pub use tasks::{
    NO_EXIT_CODE, NO_HISTORY_EXIT_CODE, TASKS_MEASUREMENT, consecutive_errors, extract_tasks,
    last_exit_code, parse_timeout, task_record,
};
