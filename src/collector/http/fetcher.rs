//! Timed JSON fetcher over a lazily built, shared HTTP client.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::OnceCell;
use tokio::time::timeout;
use url::Url;

/// Default wait for response headers (30 seconds).
pub const DEFAULT_HEADER_TIMEOUT: Duration = Duration::from_secs(30);

/// Default bound on the whole request including body (30 seconds).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn default_header_timeout() -> Duration {
    DEFAULT_HEADER_TIMEOUT
}

fn default_request_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}

/// Failure of a single fetch.
///
/// URLs carried in these errors never include credentials.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The URL could not be parsed.
    #[error("unable to parse server address '{url}': {source}")]
    Parse {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The request could not be sent or no response arrived in time.
    #[error("unable to connect to ereb server '{url}': {message}")]
    Connection { url: String, message: String },

    /// The server answered with a status other than 200.
    #[error("unable to get valid stat result from '{url}', http response code: {status}")]
    HttpStatus { url: String, status: u16 },

    /// The body is not valid JSON for the expected document.
    #[error("unable to decode response from '{url}': {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// Short classification for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "parse",
            Self::Connection { .. } => "connection",
            Self::HttpStatus { .. } => "http_status",
            Self::Decode { .. } => "decode",
        }
    }
}

/// Fetcher timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Maximum wait for the response head (default: 30s).
    #[serde(default = "default_header_timeout", with = "humantime_serde")]
    pub header_timeout: Duration,
    /// Maximum duration of the whole exchange (default: 30s).
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            header_timeout: DEFAULT_HEADER_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl FetcherConfig {
    /// Set the response header timeout.
    pub fn with_header_timeout(mut self, timeout: Duration) -> Self {
        self.header_timeout = timeout;
        self
    }

    /// Set the overall request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// JSON fetcher shared by all collection units.
///
/// The underlying [`Client`] is built on first use and reused for the
/// fetcher's lifetime; its connection pool is safe for concurrent requests.
#[derive(Debug)]
pub struct Fetcher {
    config: FetcherConfig,
    client: OnceCell<Client>,
}

impl Fetcher {
    pub fn new(config: FetcherConfig) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Whether the HTTP client has been built yet.
    pub fn is_initialized(&self) -> bool {
        self.client.initialized()
    }

    async fn client(&self, url: &str) -> Result<&Client, FetchError> {
        self.client
            .get_or_try_init(|| async {
                tracing::debug!(
                    header_timeout = ?self.config.header_timeout,
                    request_timeout = ?self.config.request_timeout,
                    "Building HTTP client"
                );
                Client::builder()
                    .timeout(self.config.request_timeout)
                    .user_agent(concat!("ereb-collector/", env!("CARGO_PKG_VERSION")))
                    .build()
                    .map_err(|e| FetchError::Connection {
                        url: url.to_string(),
                        message: format!("failed to build HTTP client: {e}"),
                    })
            })
            .await
    }

    /// GET `url` and decode the JSON body into `T`.
    ///
    /// User-info embedded in `url` is removed from the request line and sent as
    /// HTTP basic authentication instead.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let mut target = Url::parse(url).map_err(|source| FetchError::Parse {
            url: redact_userinfo(url),
            source,
        })?;
        let credentials = take_credentials(&mut target);
        let display_url = target.to_string();

        let client = self.client(&display_url).await?;
        let mut request = client.get(target);
        if let Some((username, password)) = credentials {
            request = request.basic_auth(username, password);
        }

        let response = match timeout(self.config.header_timeout, request.send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                return Err(FetchError::Connection {
                    url: display_url,
                    message: e.without_url().to_string(),
                });
            }
            Err(_) => {
                return Err(FetchError::Connection {
                    url: display_url,
                    message: format!(
                        "timed out after {:?} waiting for response headers",
                        self.config.header_timeout
                    ),
                });
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::HttpStatus {
                url: display_url,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Connection {
                url: display_url.clone(),
                message: format!("failed to read response body: {}", e.without_url()),
            })?;

        serde_json::from_slice(&body).map_err(|source| FetchError::Decode {
            url: display_url,
            source,
        })
    }
}

/// Remove user-info from `url`, returning the percent-decoded credentials.
fn take_credentials(url: &mut Url) -> Option<(String, Option<String>)> {
    if url.username().is_empty() && url.password().is_none() {
        return None;
    }
    let username = decode_component(url.username());
    let password = url.password().map(decode_component);
    // Only fails for cannot-be-a-base URLs, which carry no user-info.
    let _ = url.set_username("");
    let _ = url.set_password(None);
    Some((username, password))
}

fn decode_component(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

/// Byte range of the authority (`user:pw@host:port`) as written in `raw`.
fn authority_span(raw: &str) -> Option<(usize, usize)> {
    let start = raw.find("://")? + 3;
    let end = raw[start..]
        .find(['/', '?', '#'])
        .map_or(raw.len(), |i| start + i);
    Some((start, end))
}

/// `host[:port]` exactly as written in `raw`, user-info removed.
///
/// Keeps case and explicit default ports (`http://ereb:80` -> `ereb:80`).
pub(crate) fn authority_host(raw: &str) -> Option<&str> {
    let (start, end) = authority_span(raw)?;
    let authority = &raw[start..end];
    Some(authority.rfind('@').map_or(authority, |at| &authority[at + 1..]))
}

/// Mask user-info in a URL that may not parse.
pub(crate) fn redact_userinfo(raw: &str) -> String {
    let Some((start, end)) = authority_span(raw) else {
        return raw.to_string();
    };
    match raw[start..end].rfind('@') {
        Some(at) => format!("{}***{}", &raw[..start], &raw[start + at..]),
        None => raw.to_string(),
    }
}
