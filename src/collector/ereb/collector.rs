//! Concurrent collection over all endpoints.
//!
//! Each cycle launches one task per (endpoint, extractor) pair and waits for
//! all of them. A failing unit is reported through the sink and never stops
//! its siblings.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinSet;

use crate::collector::ereb::endpoint::{Endpoint, normalize_endpoints};
use crate::collector::ereb::extractor::ExtractorKind;
use crate::collector::http::{Fetcher, FetcherConfig, redact_userinfo};
use crate::collector::traits::{Collector, CollectorError, CycleSummary, Schedule};
use crate::sink::{ReportedError, SinkError, SinkWriter};

/// Collection interval used when none is configured.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

/// Configuration for [`ErebCollector`].
#[derive(Debug, Clone)]
pub struct ErebConfig {
    /// Collector name used in logs and job bookkeeping.
    pub name: String,
    /// Base URLs; empty means `http://localhost:8888`.
    pub servers: Vec<String>,
    /// Per-unit diagnostics.
    pub verbose: bool,
    pub schedule: Schedule,
    pub fetcher: FetcherConfig,
}

impl Default for ErebConfig {
    fn default() -> Self {
        Self {
            name: "ereb".to_string(),
            servers: Vec::new(),
            verbose: false,
            schedule: Schedule::Interval(DEFAULT_INTERVAL),
            fetcher: FetcherConfig::default(),
        }
    }
}

impl ErebConfig {
    pub fn new(servers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            servers: servers.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn with_fetcher_config(mut self, fetcher: FetcherConfig) -> Self {
        self.fetcher = fetcher;
        self
    }
}

/// Polls every configured ereb server for status and task statistics.
pub struct ErebCollector {
    config: ErebConfig,
    fetcher: Arc<Fetcher>,
    writer: SinkWriter,
}

impl ErebCollector {
    pub fn new(config: ErebConfig, writer: SinkWriter) -> Self {
        let fetcher = Arc::new(Fetcher::new(config.fetcher));
        Self {
            config,
            fetcher,
            writer,
        }
    }

    pub fn config(&self) -> &ErebConfig {
        &self.config
    }

    /// Effective endpoint list for the next cycle.
    pub fn endpoints(&self) -> Vec<String> {
        normalize_endpoints(&self.config.servers)
    }
}

#[derive(Debug, Default)]
struct UnitOutcome {
    records: usize,
    failed: bool,
    dropped: u64,
}

async fn run_unit(
    fetcher: &Fetcher,
    writer: &SinkWriter,
    base: &str,
    kind: ExtractorKind,
    verbose: bool,
) -> UnitOutcome {
    let start = Instant::now();
    let (label, result) = match Endpoint::parse(base) {
        Ok(endpoint) => {
            let result = kind.extract(fetcher, &endpoint).await;
            (endpoint.host().to_string(), result)
        }
        Err(e) => (redact_userinfo(base), Err(e)),
    };

    let mut outcome = UnitOutcome::default();
    match result {
        Ok(records) => {
            for record in records {
                match writer.add_record(record) {
                    Ok(()) => outcome.records += 1,
                    Err(_) => outcome.dropped += 1,
                }
            }
            if verbose {
                tracing::debug!(
                    endpoint = %label,
                    extractor = %kind,
                    records = outcome.records,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Unit completed"
                );
            }
        }
        Err(e) => {
            outcome.failed = true;
            if verbose {
                tracing::debug!(
                    endpoint = %label,
                    extractor = %kind,
                    kind = e.kind(),
                    error = %e,
                    "Unit failed"
                );
            }
            if writer
                .add_error(ReportedError::new(kind.source(), label, e.to_string()))
                .is_err()
            {
                outcome.dropped += 1;
            }
        }
    }
    outcome
}

#[async_trait::async_trait]
impl Collector for ErebCollector {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn schedule(&self) -> Schedule {
        self.config.schedule.clone()
    }

    async fn collect(&self) -> Result<CycleSummary, CollectorError> {
        let start = Instant::now();
        let endpoints = self.endpoints();
        let verbose = self.config.verbose;

        if verbose {
            let shown: Vec<String> = endpoints.iter().map(|e| redact_userinfo(e)).collect();
            tracing::debug!(collector = %self.config.name, endpoints = ?shown, "Starting cycle");
        }

        let mut units = JoinSet::new();
        for base in &endpoints {
            for kind in ExtractorKind::ALL {
                let fetcher = Arc::clone(&self.fetcher);
                let writer = self.writer.clone();
                let base = base.clone();
                units.spawn(async move { run_unit(&fetcher, &writer, &base, kind, verbose).await });
            }
        }

        let mut summary = CycleSummary {
            endpoints: endpoints.len(),
            units: units.len(),
            ..Default::default()
        };

        while let Some(joined) = units.join_next().await {
            match joined {
                Ok(outcome) => {
                    summary.records += outcome.records;
                    summary.dropped += outcome.dropped;
                    if outcome.failed {
                        summary.errors += 1;
                    }
                }
                Err(e) => {
                    tracing::error!(collector = %self.config.name, error = %e, "Collection unit aborted");
                    summary.errors += 1;
                    let report =
                        ReportedError::new("ereb", "", format!("collection unit aborted: {e}"));
                    if self.writer.add_error(report).is_err() {
                        summary.dropped += 1;
                    }
                }
            }
        }

        summary.elapsed = start.elapsed();
        tracing::debug!(
            collector = %self.config.name,
            endpoints = summary.endpoints,
            records = summary.records,
            errors = summary.errors,
            duration_ms = summary.elapsed.as_millis() as u64,
            "Cycle complete"
        );

        if summary.dropped > 0 {
            return Err(SinkError::Dropped(summary.dropped).into());
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{MemoryOutput, SinkBuilder};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn status_body() -> serde_json::Value {
        serde_json::json!({"state": "running", "next_run": 5.0, "next_tasks": [{}], "planned_task_run_uuids": []})
    }

    fn tasks_body() -> serde_json::Value {
        serde_json::json!([
            {"name": "a", "enabled": true, "timeout": "60", "stats": {"exit_codes": ["0", "1"]}},
            {"name": "b", "enabled": false, "timeout": "30", "stats": {"exit_codes": []}}
        ])
    }

    async fn healthy_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(status_body()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/tasks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tasks_body()))
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn test_default_config() {
        let config = ErebConfig::default();
        assert_eq!(config.name, "ereb");
        assert!(config.servers.is_empty());
        assert!(!config.verbose);
        assert_eq!(config.schedule, Schedule::Interval(DEFAULT_INTERVAL));
    }

    #[tokio::test]
    async fn test_collect_single_endpoint() {
        let server = healthy_server().await;
        let output = MemoryOutput::new();
        let handles = SinkBuilder::new(output.clone()).build().unwrap();

        let collector = ErebCollector::new(
            ErebConfig::new([format!("{}/", server.uri())]),
            handles.writer.clone(),
        );
        let summary = collector.collect().await.unwrap();

        assert_eq!(summary.endpoints, 1);
        assert_eq!(summary.units, 2);
        assert_eq!(summary.records, 3);
        assert_eq!(summary.errors, 0);

        handles.shutdown().unwrap();
        assert_eq!(output.records_named("ereb_status").len(), 1);
        assert_eq!(output.records_named("ereb_tasks").len(), 2);
        assert!(output.errors().is_empty());
    }

    #[tokio::test]
    async fn test_collect_reports_unit_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(status_body()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/tasks"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let output = MemoryOutput::new();
        let handles = SinkBuilder::new(output.clone()).build().unwrap();
        let collector = ErebCollector::new(
            ErebConfig::new([server.uri()]).with_verbose(true),
            handles.writer.clone(),
        );
        let summary = collector.collect().await.unwrap();

        assert_eq!(summary.records, 1);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.succeeded(), 1);

        handles.shutdown().unwrap();
        let errors = output.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].source, "ereb.tasks");
        assert!(errors[0].message.contains("503"));
        assert_eq!(output.records_named("ereb_status").len(), 1);
    }

    #[tokio::test]
    async fn test_collect_no_endpoints_after_normalization() {
        let output = MemoryOutput::new();
        let handles = SinkBuilder::new(output.clone()).build().unwrap();
        let collector = ErebCollector::new(ErebConfig::new(["ereb:8888"]), handles.writer.clone());

        let summary = collector.collect().await.unwrap();
        assert_eq!(summary.endpoints, 0);
        assert_eq!(summary.units, 0);

        handles.shutdown().unwrap();
        assert!(output.records().is_empty());
        assert!(output.errors().is_empty());
    }
}
