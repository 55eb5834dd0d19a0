//! Server endpoints: normalization of the configured list and host tagging.

use url::Url;

use crate::collector::http::{FetchError, authority_host, redact_userinfo};

/// Endpoint polled when no servers are configured.
pub const DEFAULT_SERVER: &str = "http://localhost:8888";

/// Build the effective endpoint list for one cycle.
///
/// An empty list yields [`DEFAULT_SERVER`]. Entries without an `http://` or
/// `https://` scheme are dropped; trailing `/` characters are trimmed.
pub fn normalize_endpoints<S: AsRef<str>>(servers: &[S]) -> Vec<String> {
    if servers.is_empty() {
        return vec![DEFAULT_SERVER.to_string()];
    }

    servers
        .iter()
        .filter_map(|server| {
            let server = server.as_ref().trim();
            if !has_http_scheme(server) {
                tracing::warn!(
                    server = %redact_userinfo(server),
                    "Dropping server without http(s) scheme"
                );
                return None;
            }
            Some(server.trim_end_matches('/').to_string())
        })
        .collect()
}

/// Whether `server` starts with an `http://` or `https://` scheme.
pub fn has_http_scheme(server: &str) -> bool {
    let lower = server.get(..8).unwrap_or(server).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// A parsed scheduler endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base: String,
    host: String,
}

impl Endpoint {
    /// Parse a normalized base URL.
    ///
    /// # Errors
    /// Returns `FetchError::Parse` if `base` is not a valid URL.
    pub fn parse(base: &str) -> Result<Self, FetchError> {
        Url::parse(base).map_err(|source| FetchError::Parse {
            url: redact_userinfo(base),
            source,
        })?;

        // Tag with the authority as written: `Url` lowercases the host and
        // drops a port equal to the scheme default.
        let host = authority_host(base).unwrap_or_default().to_string();

        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
            host,
        })
    }

    /// Base URL, credentials included.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Host tag: `host[:port]` as configured, never credentials.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// URL of a resource below the base.
    pub fn url_for(&self, resource: &str) -> String {
        format!("{}/{}", self.base, resource.trim_start_matches('/'))
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&redact_userinfo(&self.base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_defaults_to_localhost() {
        let servers: Vec<String> = Vec::new();
        assert_eq!(normalize_endpoints(&servers), vec![DEFAULT_SERVER]);
    }

    #[test]
    fn test_normalize_trailing_slash() {
        assert_eq!(
            normalize_endpoints(&["http://host:8888/"]),
            normalize_endpoints(&["http://host:8888"])
        );
        assert_eq!(
            normalize_endpoints(&["https://host//"]),
            vec!["https://host"]
        );
    }

    #[test]
    fn test_normalize_drops_schemeless_entries() {
        let endpoints = normalize_endpoints(&[
            "host:8888",
            "http://a:8888",
            "ftp://b",
            "HTTPS://c:8443/",
            "httpfoo",
        ]);
        assert_eq!(endpoints, vec!["http://a:8888", "HTTPS://c:8443"]);
    }

    #[test]
    fn test_normalize_all_dropped_is_empty() {
        // Only an empty configuration falls back to the default server
        assert!(normalize_endpoints(&["host:8888"]).is_empty());
    }

    #[test]
    fn test_endpoint_host_tag() {
        let endpoint = Endpoint::parse("http://user:pw@ereb.local:8888").unwrap();
        assert_eq!(endpoint.host(), "ereb.local:8888");
        assert_eq!(endpoint.url_for("status"), "http://user:pw@ereb.local:8888/status");
        assert_eq!(endpoint.to_string(), "http://***@ereb.local:8888");

        let endpoint = Endpoint::parse("https://ereb.example.com").unwrap();
        assert_eq!(endpoint.host(), "ereb.example.com");

        let endpoint = Endpoint::parse("http://[::1]:8888").unwrap();
        assert_eq!(endpoint.host(), "[::1]:8888");
    }

    #[test]
    fn test_endpoint_host_keeps_port_and_case() {
        assert_eq!(Endpoint::parse("http://ereb:80").unwrap().host(), "ereb:80");
        assert_eq!(Endpoint::parse("https://ereb:443").unwrap().host(), "ereb:443");
        assert_eq!(Endpoint::parse("http://ereb").unwrap().host(), "ereb");
        assert_eq!(
            Endpoint::parse("http://EREB.Local:8888").unwrap().host(),
            "EREB.Local:8888"
        );
        assert_eq!(
            Endpoint::parse("http://admin:pw@ereb:80/").unwrap().host(),
            "ereb:80"
        );
    }

    #[test]
    fn test_endpoint_parse_error() {
        let err = Endpoint::parse("http://").unwrap_err();
        assert!(matches!(err, FetchError::Parse { .. }));
    }
}
