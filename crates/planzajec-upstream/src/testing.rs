//! Scripted transport shared by the client and aggregator tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::config::UpstreamConfig;
use crate::error::UpstreamResult;
use crate::transport::{BoxFuture, RawResponse, Transport, UpstreamRequest};

pub(crate) const BASE_URL: &str = "https://planzajec.test/index.php";

pub(crate) fn test_config() -> UpstreamConfig {
    UpstreamConfig::new(BASE_URL)
        .unwrap()
        .with_user_agent("planzajec-test")
}

/// Answers by exact URL; unknown URLs get a 404.
pub(crate) struct ScriptedTransport {
    responses: HashMap<String, RawResponse>,
    delays: HashMap<String, Duration>,
    delay: Duration,
    requests: Mutex<Vec<UpstreamRequest>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self {
            responses: HashMap::new(),
            delays: HashMap::new(),
            delay: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn respond(mut self, url: impl Into<String>, response: RawResponse) -> Self {
        self.responses.insert(url.into(), response);
        self
    }

    /// Overrides the delay for one URL.
    pub(crate) fn respond_after(
        mut self,
        url: impl Into<String>,
        delay: Duration,
        response: RawResponse,
    ) -> Self {
        let url = url.into();
        self.delays.insert(url.clone(), delay);
        self.responses.insert(url, response);
        self
    }

    pub(crate) fn requests(&self) -> Vec<UpstreamRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Transport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    fn get(&self, request: UpstreamRequest) -> BoxFuture<'_, UpstreamResult<RawResponse>> {
        Box::pin(async move {
            self.requests.lock().unwrap().push(request.clone());

            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            let _guard = InFlight(&self.in_flight);
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);

            let delay = self.delays.get(&request.url).copied().unwrap_or(self.delay);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            Ok(self
                .responses
                .get(&request.url)
                .cloned()
                .unwrap_or_else(|| RawResponse::status(404)))
        })
    }
}
