//! HTTP plumbing shared by collectors.
//!
//! - [`Fetcher`]: timed GET + JSON decode with URL-embedded basic auth

mod fetcher;

pub(crate) use fetcher::{authority_host, redact_userinfo};
pub use fetcher::{
    DEFAULT_HEADER_TIMEOUT, DEFAULT_REQUEST_TIMEOUT, FetchError, Fetcher, FetcherConfig,
};
