//! Rate-limited client for the upstream schedule service.
//!
//! This module provides [`UekClient`], which handles:
//! - Bounding concurrent upstream requests through one shared gate
//! - Attaching the caller's authorization and forwarded-for chain
//! - Classifying upstream statuses
//! - Honoring caller cancellation while queued and while in flight

use std::sync::Arc;

use planzajec_core::{Grouping, Schedule, ScheduleCalendar, ScheduleHeader, SchedulePeriod, ScheduleType};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::builder::build_schedule;
use crate::config::UpstreamConfig;
use crate::error::{UpstreamError, UpstreamResult};
use crate::query;
use crate::replay::ReplayTransport;
use crate::transport::{HttpTransport, Transport, UpstreamRequest};
use crate::xml::{ScheduleDocument, parse_document};

/// Per-call values forwarded to the upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallParams {
    /// Value of the `Authorization: Basic` header (already base64-encoded).
    pub basic_auth: Option<String>,
    /// `X-Forwarded-For` chain of the end user.
    pub forwarded_for: Option<String>,
}

impl CallParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_basic_auth(mut self, value: impl Into<String>) -> Self {
        self.basic_auth = Some(value.into());
        self
    }

    pub fn with_forwarded_for(mut self, value: impl Into<String>) -> Self {
        self.forwarded_for = Some(value.into());
        self
    }
}

struct Inner {
    transport: Arc<dyn Transport>,
    gate: Arc<Semaphore>,
    base_url: String,
    user_agent: String,
    calendar: ScheduleCalendar,
}

/// Client for the upstream schedule service.
///
/// Clones share the concurrency gate, so the bound holds across every
/// caller in the process.
#[derive(Clone)]
pub struct UekClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for UekClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UekClient")
            .field("transport", &self.inner.transport.name())
            .field("base_url", &self.inner.base_url)
            .field("available_slots", &self.available_slots())
            .finish()
    }
}

impl UekClient {
    /// Creates a client using HTTP, or recorded responses when replay is
    /// configured.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the concurrency bound is zero, the
    /// timezone is unknown or the HTTP client cannot be built.
    pub fn new(config: UpstreamConfig) -> UpstreamResult<Self> {
        let transport: Arc<dyn Transport> = match &config.replay {
            Some(replay) => {
                let mut transport = ReplayTransport::new(replay);
                if replay.passthrough {
                    transport = transport.with_passthrough(Arc::new(HttpTransport::new(&config)?));
                }
                Arc::new(transport)
            }
            None => Arc::new(HttpTransport::new(&config)?),
        };
        Self::with_transport(config, transport)
    }

    /// Creates a client on top of an existing transport.
    pub fn with_transport(
        config: UpstreamConfig,
        transport: Arc<dyn Transport>,
    ) -> UpstreamResult<Self> {
        let calendar = config.validate()?;
        debug!(
            transport = transport.name(),
            max_concurrent_requests = config.max_concurrent_requests,
            timezone = calendar.name(),
            "Creating upstream client"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                transport,
                gate: Arc::new(Semaphore::new(config.max_concurrent_requests)),
                base_url: config.base_url.to_string(),
                user_agent: config.user_agent,
                calendar,
            }),
        })
    }

    /// Returns the calendar upstream timestamps are read in.
    pub fn calendar(&self) -> &ScheduleCalendar {
        &self.inner.calendar
    }

    /// Returns how many upstream requests could start right now.
    pub fn available_slots(&self) -> usize {
        self.inner.gate.available_permits()
    }

    /// Lists all groupings.
    pub async fn fetch_groupings(
        &self,
        params: &CallParams,
        cancel: &CancellationToken,
    ) -> UpstreamResult<Vec<Grouping>> {
        let document = self
            .call(params, query::groupings_url(&self.inner.base_url), cancel)
            .await?;
        Ok(document.extract_groupings())
    }

    /// Lists the entities of one type inside a grouping.
    pub async fn fetch_headers(
        &self,
        params: &CallParams,
        schedule_type: ScheduleType,
        grouping_name: &str,
        cancel: &CancellationToken,
    ) -> UpstreamResult<Vec<ScheduleHeader>> {
        let url = query::headers_url(&self.inner.base_url, schedule_type, grouping_name);
        let document = self.call(params, url, cancel).await?;
        Ok(document.extract_headers(schedule_type))
    }

    /// Fetches one entity's schedule for a 0-based period index.
    pub async fn fetch_schedule(
        &self,
        params: &CallParams,
        schedule_type: ScheduleType,
        id: i64,
        period_index: usize,
        cancel: &CancellationToken,
    ) -> UpstreamResult<(Schedule, Vec<SchedulePeriod>)> {
        let url = query::schedule_url(&self.inner.base_url, schedule_type, id, period_index)?;
        let document = self.call(params, url.clone(), cancel).await?;

        build_schedule(&document, schedule_type, id, &self.inner.calendar).map_err(|e| {
            UpstreamError::validation(format!("invalid schedule for {} {}", schedule_type.display_name(), id))
                .with_source(e)
                .with_url(url)
        })
    }

    fn request(&self, params: &CallParams, url: String) -> UpstreamRequest {
        let mut request = UpstreamRequest::new(url);
        if let Some(ref value) = params.basic_auth {
            request = request.with_header("Authorization", format!("Basic {}", value));
        }
        if let Some(ref value) = params.forwarded_for {
            request = request.with_header("X-Forwarded-For", value.as_str());
        }
        if !self.inner.user_agent.is_empty() {
            request = request.with_header("User-Agent", self.inner.user_agent.as_str());
        }
        request.with_header("Content-Type", "application/xml")
    }

    async fn acquire_slot(&self, cancel: &CancellationToken) -> UpstreamResult<OwnedSemaphorePermit> {
        trace!(available = self.available_slots(), "Waiting for upstream slot");
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(UpstreamError::cancelled()),
            permit = self.inner.gate.clone().acquire_owned() => permit.map_err(|e| {
                UpstreamError::configuration("upstream request gate is closed").with_source(e)
            }),
        }
    }

    /// Performs one upstream call and decodes the document.
    ///
    /// The slot is held until the call returns, whatever the outcome.
    async fn call(
        &self,
        params: &CallParams,
        url: String,
        cancel: &CancellationToken,
    ) -> UpstreamResult<ScheduleDocument> {
        let request = self.request(params, url.clone());

        let _permit = self
            .acquire_slot(cancel)
            .await
            .map_err(|e| e.with_url(&url))?;

        debug!(
            url = %url,
            forwarded_for = params.forwarded_for.as_deref().unwrap_or_default(),
            "Calling upstream"
        );

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(UpstreamError::cancelled().with_url(&url)),
            response = self.inner.transport.get(request) => response?,
        };

        match response.status {
            200 => {}
            401 => return Err(UpstreamError::unauthorized().with_url(&url)),
            status => {
                warn!(status, url = %url, "Unexpected upstream status");
                return Err(UpstreamError::unexpected_status(status).with_url(&url));
            }
        }

        parse_document(&response.body).map_err(|e| {
            UpstreamError::invalid_response("failed to decode xml response")
                .with_source(e)
                .with_url(&url)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UpstreamErrorCode;
    use crate::testing::{BASE_URL, ScriptedTransport, test_config};
    use crate::transport::RawResponse;
    use std::time::Duration;

    const GROUPINGS: &str = r#"<plan-zajec><grupowanie typ="G" grupa="Kolegium Ekonomii"/></plan-zajec>"#;

    fn client(transport: Arc<ScriptedTransport>, max: usize) -> UekClient {
        UekClient::with_transport(test_config().with_max_concurrent_requests(max), transport)
            .unwrap()
    }

    fn groupings_url() -> String {
        query::groupings_url(BASE_URL)
    }

    #[test]
    fn zero_concurrency_fails_construction() {
        let err = UekClient::with_transport(
            test_config().with_max_concurrent_requests(0),
            Arc::new(ScriptedTransport::new()),
        )
        .unwrap_err();
        assert_eq!(err.code(), UpstreamErrorCode::ConfigurationError);
    }

    #[tokio::test]
    async fn sends_forwarded_headers() {
        let transport = Arc::new(ScriptedTransport::new().respond(groupings_url(), RawResponse::ok(GROUPINGS)));
        let client = client(transport.clone(), 1);
        let params = CallParams::new()
            .with_basic_auth("dXNlcjpwYXNz")
            .with_forwarded_for("10.0.0.1, 10.0.0.2");

        let groupings = client
            .fetch_groupings(&params, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(groupings.len(), 1);

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.url, "https://planzajec.test/index.php?xml");
        assert_eq!(request.header("Authorization"), Some("Basic dXNlcjpwYXNz"));
        assert_eq!(request.header("X-Forwarded-For"), Some("10.0.0.1, 10.0.0.2"));
        assert_eq!(request.header("User-Agent"), Some("planzajec-test"));
        assert_eq!(request.header("Content-Type"), Some("application/xml"));
    }

    #[tokio::test]
    async fn omits_absent_auth_headers() {
        let transport = Arc::new(ScriptedTransport::new().respond(groupings_url(), RawResponse::ok(GROUPINGS)));
        let client = client(transport.clone(), 1);

        client
            .fetch_groupings(&CallParams::new(), &CancellationToken::new())
            .await
            .unwrap();

        let request = &transport.requests()[0];
        assert_eq!(request.header("Authorization"), None);
        assert_eq!(request.header("X-Forwarded-For"), None);
    }

    #[tokio::test]
    async fn status_401_is_unauthorized() {
        let transport = Arc::new(ScriptedTransport::new().respond(groupings_url(), RawResponse::status(401)));
        let client = client(transport, 1);

        let err = client
            .fetch_groupings(&CallParams::new(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
        assert!(!err.should_log());
    }

    #[tokio::test]
    async fn other_statuses_are_failures_with_context() {
        let transport = Arc::new(ScriptedTransport::new().respond(groupings_url(), RawResponse::status(503)));
        let client = client(transport, 1);

        let err = client
            .fetch_groupings(&CallParams::new(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.code(), UpstreamErrorCode::UnexpectedStatus);
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.url(), Some(groupings_url().as_str()));
        assert!(err.should_log());
    }

    #[tokio::test]
    async fn undecodable_body_is_invalid_response() {
        let transport = Arc::new(
            ScriptedTransport::new().respond(groupings_url(), RawResponse::ok("<html>maintenance</html>")),
        );
        let client = client(transport, 1);

        let err = client
            .fetch_groupings(&CallParams::new(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.code(), UpstreamErrorCode::InvalidResponse);
    }

    #[tokio::test]
    async fn fetch_headers_filters_by_type() {
        let url = query::headers_url(BASE_URL, ScheduleType::Group, "Kolegium Ekonomii");
        let body = r#"<plan-zajec>
            <zasob typ="G" id="101" nazwa="KrDZEk1011"/>
            <zasob typ="N" id="55" nazwa="dr Nowak"/>
        </plan-zajec>"#;
        let transport = Arc::new(ScriptedTransport::new().respond(url, RawResponse::ok(body)));
        let client = client(transport, 1);

        let headers = client
            .fetch_headers(
                &CallParams::new(),
                ScheduleType::Group,
                "Kolegium Ekonomii",
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(headers, vec![ScheduleHeader::new(101, "KrDZEk1011")]);
    }

    #[tokio::test]
    async fn mismatched_schedule_is_validation_failure() {
        let url = query::schedule_url(BASE_URL, ScheduleType::Group, 101, 0).unwrap();
        let body = r#"<plan-zajec typ="G" id="999" nazwa="KrDZEk1011"/>"#;
        let transport = Arc::new(ScriptedTransport::new().respond(url.clone(), RawResponse::ok(body)));
        let client = client(transport, 1);

        let err = client
            .fetch_schedule(&CallParams::new(), ScheduleType::Group, 101, 0, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.code(), UpstreamErrorCode::ValidationFailed);
        assert_eq!(err.url(), Some(url.as_str()));
        assert!(err.to_string().contains("999"));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrency_is_bounded_by_gate() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .with_delay(Duration::from_millis(50))
                .respond(groupings_url(), RawResponse::ok(GROUPINGS)),
        );
        let client = client(transport.clone(), 2);

        let mut handles = Vec::new();
        for _ in 0..5 {
            let client = client.clone();
            handles.push(tokio::spawn(async move {
                client
                    .fetch_groupings(&CallParams::new(), &CancellationToken::new())
                    .await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }

        assert_eq!(transport.requests().len(), 5);
        assert_eq!(transport.max_in_flight(), 2);
        assert_eq!(client.available_slots(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_while_waiting_for_slot() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .with_delay(Duration::from_secs(10))
                .respond(groupings_url(), RawResponse::ok(GROUPINGS)),
        );
        let client = client(transport.clone(), 1);

        let holder = {
            let client = client.clone();
            tokio::spawn(async move {
                client
                    .fetch_groupings(&CallParams::new(), &CancellationToken::new())
                    .await
            })
        };
        while client.available_slots() != 0 {
            tokio::task::yield_now().await;
        }

        let token = CancellationToken::new();
        let waiter = {
            let client = client.clone();
            let token = token.clone();
            tokio::spawn(async move { client.fetch_groupings(&CallParams::new(), &token).await })
        };
        tokio::task::yield_now().await;
        token.cancel();

        let err = waiter.await.unwrap().unwrap_err();
        assert!(err.is_cancelled());
        assert!(!err.should_log());

        assert!(holder.await.unwrap().is_ok());
        assert_eq!(transport.requests().len(), 1);
        assert_eq!(client.available_slots(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_in_flight_releases_slot() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .with_delay(Duration::from_secs(10))
                .respond(groupings_url(), RawResponse::ok(GROUPINGS)),
        );
        let client = client(transport.clone(), 1);
        let token = CancellationToken::new();

        let call = {
            let client = client.clone();
            let token = token.clone();
            tokio::spawn(async move { client.fetch_groupings(&CallParams::new(), &token).await })
        };
        while transport.requests().is_empty() {
            tokio::task::yield_now().await;
        }
        assert_eq!(client.available_slots(), 0);

        token.cancel();
        let err = call.await.unwrap().unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(client.available_slots(), 1);
        assert_eq!(transport.in_flight(), 0);
    }
}
