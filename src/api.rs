//! Synchronous client for the **OpenAQ API (v2)**.
//!
//! Every call is a single blocking GET with query parameters and its own timeout.
//! A non-2xx status, a network failure (timeouts included) or a body that is not
//! JSON is returned as a [`TransportError`]. Nothing is retried.
//!
//! Typical usage:
//! ```no_run
//! # use openaq_fetch::{Client, Endpoint, QueryFilter, Remote};
//! # use std::time::Duration;
//! let client = Client::new("https://u50g7n0cbj.execute-api.us-east-1.amazonaws.com/v2")?;
//! let body = client.get_json(
//!     Endpoint::Countries,
//!     &QueryFilter::new().with("limit", 200u32),
//!     Duration::from_secs(20),
//! )?;
//! # Ok::<(), anyhow::Error>(())
//! ```
use crate::error::{FetchError, TransportError};
use crate::models::{Endpoint, QueryFilter};
use reqwest::blocking::Client as HttpClient;
use reqwest::redirect::Policy;
use serde_json::Value;
use std::time::Duration;

/// Something that answers GET requests against the API with JSON bodies.
///
/// The pipeline only talks to this trait, so tests can swap the network out.
pub trait Remote {
    fn get_json(
        &self,
        endpoint: Endpoint,
        query: &QueryFilter,
        timeout: Duration,
    ) -> Result<Value, TransportError>;
}

impl<R: Remote + ?Sized> Remote for &R {
    fn get_json(
        &self,
        endpoint: Endpoint,
        query: &QueryFilter,
        timeout: Duration,
    ) -> Result<Value, TransportError> {
        (**self).get_json(endpoint, query, timeout)
    }
}

#[derive(Debug, Clone)]
pub struct Client {
    pub base_url: String,
    http: HttpClient,
}

impl Client {
    /// Build a client rooted at `base_url` (e.g. `https://host/v2`).
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(FetchError::InvalidConfiguration(
                "API base URL is empty".into(),
            ));
        }
        let http = HttpClient::builder()
            .connect_timeout(Duration::from_secs(10)) // connect timeout
            .redirect(Policy::limited(5)) // cap redirects
            .user_agent(concat!("openaq-fetch/", env!("CARGO_PKG_VERSION"))) // set user agent
            .build()
            .map_err(|e| FetchError::InvalidConfiguration(format!("HTTP client: {e}")))?;
        Ok(Self { base_url, http })
    }

    fn url_for(&self, endpoint: Endpoint) -> String {
        format!("{}/{}", self.base_url, endpoint.path())
    }
}

impl Remote for Client {
    fn get_json(
        &self,
        endpoint: Endpoint,
        query: &QueryFilter,
        timeout: Duration,
    ) -> Result<Value, TransportError> {
        let url = self.url_for(endpoint);
        log::debug!("GET {} {:?}", url, query.to_pairs());

        let resp = self
            .http
            .get(&url)
            .query(&query.to_pairs())
            .timeout(timeout)
            .send()
            .map_err(|source| TransportError::Network {
                url: url.clone(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url,
                status: status.as_u16(),
            });
        }

        resp.json::<Value>()
            .map_err(|source| TransportError::Decode { url, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let c = Client::new("http://localhost:9/v2/").unwrap();
        assert_eq!(c.url_for(Endpoint::Averages), "http://localhost:9/v2/averages");
    }

    #[test]
    fn empty_base_url_is_rejected() {
        assert!(matches!(
            Client::new("  ".trim()),
            Err(FetchError::InvalidConfiguration(_))
        ));
    }
}
