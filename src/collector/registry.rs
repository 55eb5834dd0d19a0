//! Collector registry for managing collector lifecycle.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::collector::{Collector, CollectorError, Schedule};

/// Default timeout for graceful shutdown (5 seconds).
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Metadata about a registered job.
#[derive(Debug, Clone)]
pub struct JobInfo {
    /// Job UUID.
    pub id: uuid::Uuid,
    /// Collector name.
    pub name: String,
    /// Schedule description.
    pub schedule: String,
}

/// Registry for scheduled collectors.
///
/// Uses `tokio-cron-scheduler` for job scheduling. Supports both
/// fixed-interval and cron-based scheduling.
pub struct CollectorRegistry {
    scheduler: JobScheduler,
    jobs: Arc<RwLock<HashMap<uuid::Uuid, JobInfo>>>,
}

impl CollectorRegistry {
    /// Create a new collector registry.
    pub async fn new() -> Result<Self, CollectorError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| CollectorError::Scheduler(e.to_string()))?;

        Ok(Self {
            scheduler,
            jobs: Arc::new(RwLock::new(HashMap::new())),
        })
    }
}

impl std::fmt::Debug for CollectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectorRegistry")
            .field(
                "job_count",
                &self.jobs.try_read().map(|j| j.len()).unwrap_or(0),
            )
            .finish_non_exhaustive()
    }
}

impl CollectorRegistry {
    /// Register a collector on its schedule.
    pub async fn spawn<C: Collector>(&self, collector: C) -> Result<uuid::Uuid, CollectorError> {
        let name = collector.name().to_string();
        let schedule = collector.schedule();

        let job = create_job(Arc::new(collector), &name, &schedule)
            .inspect_err(|e| tracing::error!(collector = %name, error = %e, "Job creation failed"))?;

        let job_id = self
            .scheduler
            .add(job)
            .await
            .map_err(|e| CollectorError::Scheduler(e.to_string()))
            .inspect_err(|e| {
                tracing::error!(collector = %name, error = %e, "Job registration failed")
            })?;

        self.jobs.write().await.insert(
            job_id,
            JobInfo {
                id: job_id,
                name: name.clone(),
                schedule: schedule.to_string(),
            },
        );

        tracing::info!(collector = %name, job_id = %job_id, schedule = %schedule, "Collector registered");
        Ok(job_id)
    }

    /// Start the scheduler.
    pub async fn start(&self) -> Result<(), CollectorError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| CollectorError::Scheduler(e.to_string()))?;
        tracing::info!("Collector scheduler started");
        Ok(())
    }

    /// List all registered jobs.
    pub async fn list_jobs(&self) -> Vec<JobInfo> {
        self.jobs.read().await.values().cloned().collect()
    }

    /// Get the number of registered jobs.
    pub async fn job_count(&self) -> usize {
        self.jobs.read().await.len()
    }

    /// Gracefully shutdown the scheduler with default timeout.
    pub async fn shutdown(self) -> Result<(), CollectorError> {
        self.shutdown_with_timeout(DEFAULT_SHUTDOWN_TIMEOUT).await
    }

    /// Shutdown with custom timeout.
    ///
    /// A timeout is logged but not treated as an error.
    pub async fn shutdown_with_timeout(mut self, timeout: Duration) -> Result<(), CollectorError> {
        let job_count = self.jobs.read().await.len();
        let result = tokio::time::timeout(timeout, async {
            self.scheduler
                .shutdown()
                .await
                .map_err(|e| CollectorError::Scheduler(e.to_string()))
        })
        .await;

        match result {
            Ok(Ok(())) => {
                tracing::info!(job_count, "Collector scheduler shutdown complete");
                Ok(())
            }
            Ok(Err(e)) => {
                tracing::error!(job_count, error = %e, "Collector scheduler shutdown failed");
                Err(e)
            }
            Err(_) => {
                tracing::warn!(job_count, timeout = ?timeout, "Collector scheduler shutdown timed out");
                Ok(())
            }
        }
    }

    /// Remove a specific collector job by ID.
    pub async fn remove(&self, job_id: &uuid::Uuid) -> Result<(), CollectorError> {
        self.scheduler
            .remove(job_id)
            .await
            .map_err(|e| CollectorError::Scheduler(e.to_string()))
            .inspect_err(|e| tracing::error!(job_id = %job_id, error = %e, "Job removal failed"))?;

        let removed = self.jobs.write().await.remove(job_id);
        tracing::info!(
            job_id = %job_id,
            collector = removed.as_ref().map(|j| j.name.as_str()).unwrap_or("unknown"),
            "Collector removed"
        );
        Ok(())
    }
}

fn create_job<C: Collector>(
    collector: Arc<C>,
    name: &str,
    schedule: &Schedule,
) -> Result<Job, CollectorError> {
    let name = name.to_owned();

    let callback = move |_: uuid::Uuid, _: JobScheduler| {
        let (collector, name) = (Arc::clone(&collector), name.clone());
        Box::pin(async move { run_collection(collector.as_ref(), &name).await })
            as std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>>
    };

    match schedule {
        Schedule::Interval(d) => Job::new_repeated_async(*d, callback),
        Schedule::Cron(expr) => Job::new_cron_job_async(expr.as_str(), callback),
    }
    .map_err(|e| CollectorError::Scheduler(e.to_string()))
}

/// Execute a single collection cycle and log its outcome.
pub async fn run_collection<C: Collector + ?Sized>(collector: &C, name: &str) {
    tracing::debug!(collector = %name, "Running collection");

    match collector.collect().await {
        Ok(summary) if summary.errors > 0 => {
            tracing::warn!(
                collector = %name,
                endpoints = summary.endpoints,
                records = summary.records,
                failed_units = summary.errors,
                duration_ms = summary.elapsed.as_millis() as u64,
                "Collection completed with unit errors"
            );
        }
        Ok(summary) => {
            tracing::debug!(
                collector = %name,
                endpoints = summary.endpoints,
                records = summary.records,
                duration_ms = summary.elapsed.as_millis() as u64,
                "Collection succeeded"
            );
        }
        Err(e) => {
            tracing::error!(collector = %name, error = %e, "Collection failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::CycleSummary;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A mock collector for testing.
    struct MockCollector {
        name: String,
        schedule: Schedule,
        calls: Arc<AtomicUsize>,
    }

    impl MockCollector {
        fn new(name: impl Into<String>, schedule: Schedule) -> Self {
            Self {
                name: name.into(),
                schedule,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait::async_trait]
    impl Collector for MockCollector {
        fn name(&self) -> &str {
            &self.name
        }

        fn schedule(&self) -> Schedule {
            self.schedule.clone()
        }

        async fn collect(&self) -> Result<CycleSummary, CollectorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(CycleSummary::default())
        }
    }

    #[tokio::test]
    async fn test_registry_lifecycle() {
        let registry = CollectorRegistry::new().await.unwrap();
        let collector =
            MockCollector::new("test-collector", Schedule::interval(Duration::from_secs(60)));

        // Spawn collector
        let job_id = registry.spawn(collector).await.unwrap();
        assert_eq!(registry.job_count().await, 1);

        // List jobs
        let jobs = registry.list_jobs().await;
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].name, "test-collector");
        assert!(jobs[0].schedule.contains("1m"));

        // Remove collector
        registry.remove(&job_id).await.unwrap();
        assert_eq!(registry.job_count().await, 0);

        registry.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_registry_cron_job() {
        let registry = CollectorRegistry::new().await.unwrap();
        let schedule = Schedule::cron("0 */5 * * * *").unwrap();
        registry
            .spawn(MockCollector::new("cron-collector", schedule))
            .await
            .unwrap();

        let jobs = registry.list_jobs().await;
        assert_eq!(jobs[0].schedule, "cron: 0 */5 * * * *");
        registry.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_run_collection_invokes_collector() {
        let collector = MockCollector::new("direct", Schedule::interval(Duration::from_secs(60)));
        let calls = Arc::clone(&collector.calls);

        run_collection(&collector, "direct").await;
        run_collection(&collector, "direct").await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
