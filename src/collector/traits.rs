//! Core collector traits and types.

use std::time::Duration;

use thiserror::Error;

use crate::sink::SinkError;

/// Minimum allowed interval (1 second).
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Errors that end a collection cycle or prevent it from being scheduled.
///
/// Failures of individual (endpoint, extractor) units are not collector
/// errors; they are reported through the sink and counted in [`CycleSummary`].
#[derive(Debug, Error)]
pub enum CollectorError {
    /// Sink rejected writes.
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Scheduler error.
    #[error("scheduler error: {0}")]
    Scheduler(String),
}

/// Schedule for collector execution.
///
/// Supports both fixed interval and cron-based scheduling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schedule {
    /// Fixed interval between collections.
    ///
    /// Interval is clamped to a minimum of 1 second.
    Interval(Duration),

    /// Cron expression for scheduled execution.
    ///
    /// Uses standard cron syntax: `sec min hour day month weekday` (6-field).
    /// Example: `"0 */5 * * * *"` = every 5 minutes at second 0
    Cron(String),
}

impl Schedule {
    /// Create an interval schedule.
    ///
    /// Interval is clamped to a minimum of 1 second.
    pub fn interval(duration: Duration) -> Self {
        if duration < MIN_INTERVAL {
            tracing::warn!(min_interval = ?MIN_INTERVAL,
                "Interval duration is less than minimum allowed. Using minimum duration."
            );
            Self::Interval(MIN_INTERVAL)
        } else {
            Self::Interval(duration)
        }
    }

    /// Create a cron schedule with immediate validation.
    ///
    /// # Errors
    /// Returns `CollectorError::Config` if the cron expression is invalid.
    pub fn cron(expr: impl AsRef<str>) -> Result<Self, CollectorError> {
        use std::str::FromStr;

        let expr = expr.as_ref().trim();
        cron::Schedule::from_str(expr)
            .map_err(|e| CollectorError::Config(format!("invalid cron expression: {e}")))?;

        Ok(Self::Cron(expr.to_string()))
    }
}

impl std::fmt::Display for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Interval(d) => write!(f, "every {}", humantime::format_duration(*d)),
            Self::Cron(expr) => write!(f, "cron: {}", expr),
        }
    }
}

/// Outcome counters of one collection cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// Effective endpoints after normalization.
    pub endpoints: usize,
    /// Units launched (endpoints × extractors).
    pub units: usize,
    /// Records handed to the sink.
    pub records: usize,
    /// Units that failed and were reported.
    pub errors: usize,
    /// Sink writes dropped during the cycle.
    pub dropped: u64,
    /// Wall time from launch to barrier.
    pub elapsed: Duration,
}

impl CycleSummary {
    /// Units that completed without error.
    pub fn succeeded(&self) -> usize {
        self.units.saturating_sub(self.errors)
    }
}

/// Core collector trait.
///
/// A collector runs one collection cycle per scheduler tick. Implementations
/// hold their sink writer internally.
///
/// # Error Handling Philosophy
///
/// - **Unit failures** (server unreachable, non-200, malformed body): valid
///   observations. They are reported through the sink and `collect()` still
///   returns `Ok`.
/// - **Collector errors** (sink dropping writes): the collector itself cannot
///   deliver data. `collect()` returns `Err(CollectorError)` after every unit
///   has finished.
#[async_trait::async_trait]
pub trait Collector: Send + Sync + 'static {
    /// Unique name for logging and job bookkeeping.
    fn name(&self) -> &str;

    /// Execution schedule (interval or cron).
    fn schedule(&self) -> Schedule;

    /// Perform one collection cycle.
    async fn collect(&self) -> Result<CycleSummary, CollectorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_interval_minimum() {
        let schedule = Schedule::interval(Duration::from_millis(100));
        match schedule {
            Schedule::Interval(d) => assert_eq!(d, MIN_INTERVAL),
            _ => panic!("expected Interval"),
        }
    }

    #[test]
    fn test_schedule_interval_valid() {
        let schedule = Schedule::interval(Duration::from_secs(30));
        assert_eq!(schedule, Schedule::Interval(Duration::from_secs(30)));
        assert_eq!(schedule.to_string(), "every 30s");
    }

    #[test]
    fn test_schedule_cron_valid() {
        let schedule = Schedule::cron(" 0 */5 * * * * ").unwrap();
        assert_eq!(schedule, Schedule::Cron("0 */5 * * * *".to_string()));
        assert_eq!(schedule.to_string(), "cron: 0 */5 * * * *");
    }

    #[test]
    fn test_schedule_cron_invalid() {
        let result = Schedule::cron("not a cron");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("invalid cron"));
    }

    #[test]
    fn test_cycle_summary_succeeded() {
        let summary = CycleSummary {
            units: 6,
            errors: 1,
            ..Default::default()
        };
        assert_eq!(summary.succeeded(), 5);
        assert_eq!(CycleSummary::default().succeeded(), 0);
    }
}
