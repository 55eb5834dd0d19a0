//! Configuration errors and value helpers: duration parsing and
//! environment expansion of server URLs.

use std::sync::OnceLock;
use std::time::Duration;

use regex::{Captures, Regex};
use thiserror::Error;

use crate::collector::http::redact_userinfo;

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse YAML configuration.
    #[error("failed to parse YAML config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation failed.
    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Parse a duration string using humantime (`10s`, `1m30s`, `500ms`).
///
/// Used for command-line overrides; YAML durations go through
/// `humantime-serde`.
///
/// # Examples
///
/// ```
/// use ereb_collector::config::parse_duration;
///
/// assert_eq!(parse_duration("10s").unwrap().as_secs(), 10);
/// assert_eq!(parse_duration("1m30s").unwrap().as_secs(), 90);
/// ```
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("duration string is empty".to_string());
    }
    humantime::parse_duration(s).map_err(|e| e.to_string())
}

/// Expand `${VAR}` and `${VAR:-default}` references in each configured
/// server URL from the environment.
///
/// Unset variables without a default expand to the empty string.
/// A reference left unresolved is logged by variable name against the
/// redacted result; expanded credentials never reach the log.
pub fn expand_servers(servers: &[String]) -> Vec<String> {
    servers
        .iter()
        .map(|server| {
            let (expanded, unresolved) = expand_with(server, |name| std::env::var(name).ok());
            for variable in &unresolved {
                tracing::warn!(
                    variable = %variable,
                    server = %redact_userinfo(&expanded),
                    "Server references an unset environment variable"
                );
            }
            expanded
        })
        .collect()
}

/// Expand references through `lookup`, returning the result and the names of
/// unset variables that had no default.
fn expand_with<F>(input: &str, lookup: F) -> (String, Vec<String>)
where
    F: Fn(&str) -> Option<String>,
{
    static ENV_VAR_REGEX: OnceLock<Regex> = OnceLock::new();

    let regex = ENV_VAR_REGEX.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var pattern is valid")
    });

    let mut unresolved = Vec::new();
    let expanded = regex
        .replace_all(input, |caps: &Captures| {
            if let Some(value) = lookup(&caps[1]) {
                return value;
            }
            match caps.get(2) {
                Some(default) => default.as_str().to_string(),
                None => {
                    unresolved.push(caps[1].to_string());
                    String::new()
                }
            }
        })
        .into_owned();
    (expanded, unresolved)
}
