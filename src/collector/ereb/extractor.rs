//! The extractors run against every endpoint each cycle.

use strum_macros::{AsRefStr, Display, EnumString};

use crate::collector::ereb::endpoint::Endpoint;
use crate::collector::ereb::status::extract_status;
use crate::collector::ereb::tasks::extract_tasks;
use crate::collector::http::{FetchError, Fetcher};
use crate::sink::MetricRecord;

/// One kind of extraction. Each (endpoint, kind) pair is an independent unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ExtractorKind {
    Status,
    Tasks,
}

impl ExtractorKind {
    pub const ALL: [Self; 2] = [Self::Status, Self::Tasks];

    /// Resource path below the endpoint base.
    pub fn path(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Tasks => "tasks",
        }
    }

    /// Origin label attached to reported errors.
    pub fn source(self) -> &'static str {
        match self {
            Self::Status => "ereb.status",
            Self::Tasks => "ereb.tasks",
        }
    }

    /// Run this extraction against one endpoint.
    pub async fn extract(
        self,
        fetcher: &Fetcher,
        endpoint: &Endpoint,
    ) -> Result<Vec<MetricRecord>, FetchError> {
        match self {
            Self::Status => extract_status(fetcher, endpoint).await.map(|r| vec![r]),
            Self::Tasks => extract_tasks(fetcher, endpoint).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::ereb::status::STATUS_MEASUREMENT;
    use crate::collector::ereb::tasks::TASKS_MEASUREMENT;
    use crate::collector::http::FetcherConfig;
    use serde_json::json;
    use std::str::FromStr;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_kind_names() {
        assert_eq!(ExtractorKind::Status.to_string(), "status");
        assert_eq!(ExtractorKind::from_str("TASKS").unwrap(), ExtractorKind::Tasks);
        assert_eq!(ExtractorKind::Tasks.path(), "tasks");
        assert_eq!(ExtractorKind::Tasks.source(), "ereb.tasks");
    }

    #[tokio::test]
    async fn test_extract_requests_kind_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/{}", ExtractorKind::Status.path())))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"state": "running"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/{}", ExtractorKind::Tasks.path())))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"name": "backup"}])))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(FetcherConfig::default());
        let endpoint = Endpoint::parse(&server.uri()).unwrap();

        let status = ExtractorKind::Status.extract(&fetcher, &endpoint).await.unwrap();
        assert_eq!(status.len(), 1);
        assert_eq!(status[0].name, STATUS_MEASUREMENT);

        let tasks = ExtractorKind::Tasks.extract(&fetcher, &endpoint).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name, TASKS_MEASUREMENT);
    }
}
