//! Transport trait definition.
//!
//! A [`Transport`] performs one GET against the upstream and hands back the
//! raw status and body. It does not interpret the status; classification is
//! done by the fetcher so that every transport behaves the same.

use std::future::Future;
use std::pin::Pin;

use reqwest::Client;
use tracing::trace;

use crate::config::UpstreamConfig;
use crate::error::{UpstreamError, UpstreamResult};

/// A boxed future for async trait methods.
///
/// Boxed futures keep the trait object-safe, so the client can hold an
/// `Arc<dyn Transport>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One upstream GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
}

impl UpstreamRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Returns the first value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status and body of an upstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
        }
    }
}

/// Performs upstream GET requests.
///
/// Implementations return `Err` only for transport-level failures; any HTTP
/// status, including errors, is an `Ok` response.
pub trait Transport: Send + Sync {
    /// Returns the name of this transport (e.g., "http", "replay").
    fn name(&self) -> &str;

    /// Sends the request and collects the response.
    fn get(&self, request: UpstreamRequest) -> BoxFuture<'_, UpstreamResult<RawResponse>>;
}

/// Transport backed by a reqwest client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a new HTTP transport with the configured timeout.
    pub fn new(config: &UpstreamConfig) -> UpstreamResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                UpstreamError::configuration("failed to create HTTP client").with_source(e)
            })?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    fn get(&self, request: UpstreamRequest) -> BoxFuture<'_, UpstreamResult<RawResponse>> {
        Box::pin(async move {
            let mut builder = self.client.get(&request.url);
            for (name, value) in &request.headers {
                builder = builder.header(*name, value.as_str());
            }

            let response = builder.send().await.map_err(|e| {
                UpstreamError::network("failed to do request")
                    .with_source(e)
                    .with_url(&request.url)
            })?;

            let status = response.status().as_u16();
            trace!(status, url = %request.url, "Received response");
            if status != 200 {
                return Ok(RawResponse::status(status));
            }

            let body = response.text().await.map_err(|e| {
                UpstreamError::network("failed to read response body")
                    .with_source(e)
                    .with_url(&request.url)
            })?;

            Ok(RawResponse { status, body })
        })
    }
}
